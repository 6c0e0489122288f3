// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dynamic tree: insertion, removal, update and structural checks.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::vec;
use core::fmt::Debug;

use crate::arena::{Arena, NodeId};
use crate::balance::{Balancer, Rotations};
use crate::config::BvhConfig;
use crate::error::{BvhError, Result};
use crate::node::Node;
use crate::select::{GreedyDescent, SiblingSelector};
use crate::split::linear_split;
use crate::types::{Aabb, Scalar};

/// What [`DynamicBvh::update`] had to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The new box still fit inside the object's leaf box; only the stored box changed.
    InPlace,
    /// The object was removed and inserted again.
    Reinserted,
}

/// Shape summary of a tree, see [`DynamicBvh::stats`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BvhStats {
    /// Number of stored objects.
    pub objects: usize,
    /// Allocated nodes, leaves included.
    pub nodes: usize,
    /// Allocated leaves.
    pub leaves: usize,
    /// Height of the root; `0` for an empty tree or a single leaf.
    pub height: u32,
    /// Sum of the measures of all internal nodes (the SAH cost of the tree).
    pub internal_measure: f64,
}

/// Dynamic bounding volume hierarchy over `K`-dimensional boxes.
///
/// Objects are identified by caller-chosen ids `O` and carry one box each.
/// Internal nodes always have two children; leaves hold up to
/// [`BvhConfig::leaf_size`] ids. Heights of siblings never differ by more than
/// one after a public call returns.
///
/// The sibling selector `S` and balancer `B` are compile-time policies.
///
/// ```rust
/// use understory_dbvh::{Aabb, DynamicBvh};
///
/// let mut bvh: DynamicBvh<f64, u32> = DynamicBvh::new(2, 1, 1.0).unwrap();
/// bvh.insert(100, Aabb::new([0.0, 0.0], [1.0, 1.0])).unwrap();
/// bvh.insert(101, Aabb::new([10.0, 10.0], [11.0, 11.0])).unwrap();
///
/// let hits = bvh.broad_phase(&Aabb::new([10.0, 10.0], [11.0, 11.0])).unwrap();
/// assert_eq!(hits, [101]);
/// assert_eq!(bvh.height(), 1);
/// ```
pub struct DynamicBvh<T, O, S = GreedyDescent, B = Rotations> {
    pub(crate) config: BvhConfig,
    leaf_scale: f64,
    pub(crate) arena: Arena<T, O>,
    pub(crate) root: Option<NodeId>,
    pub(crate) objects: BTreeMap<O, Aabb<T>>,
    leaf_of: BTreeMap<O, NodeId>,
    selector: S,
    balancer: B,
}

/// Greedy-descent tree over `f32` coordinates.
pub type DynamicBvhF32<O> = DynamicBvh<f32, O>;

/// Greedy-descent tree over `f64` coordinates.
pub type DynamicBvhF64<O> = DynamicBvh<f64, O>;

impl<T: Scalar, O: Copy + Ord + Debug> DynamicBvh<T, O> {
    /// Create an empty tree with the default policies.
    ///
    /// `dim` is the spatial dimension, `leaf_size` the maximum number of
    /// objects per leaf and `tolerance` the leaf box expansion factor (`>= 1`).
    pub fn new(dim: usize, leaf_size: usize, tolerance: f64) -> Result<Self> {
        Self::with_config(
            BvhConfig::new(dim)
                .with_leaf_size(leaf_size)
                .with_tolerance(tolerance),
        )
    }

    /// Create an empty tree from a configuration with the default policies.
    pub fn with_config(config: BvhConfig) -> Result<Self> {
        Self::with_policies(config, GreedyDescent, Rotations)
    }
}

impl<T, O, S, B> DynamicBvh<T, O, S, B>
where
    T: Scalar,
    O: Copy + Ord + Debug,
    S: SiblingSelector<T, O>,
    B: Balancer<T, O>,
{
    /// Create an empty tree with explicit sibling selector and balancer.
    pub fn with_policies(config: BvhConfig, selector: S, balancer: B) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            dim = config.dim,
            leaf_size = config.leaf_size,
            tolerance = config.tolerance,
            "new dynamic bvh"
        );
        Ok(Self {
            config,
            leaf_scale: config.leaf_scale(),
            arena: Arena::new(config.dim),
            root: None,
            objects: BTreeMap::new(),
            leaf_of: BTreeMap::new(),
            selector,
            balancer,
        })
    }

    /// Insert object `id` with box `aabb`.
    ///
    /// Fails with [`BvhError::DuplicateId`] if `id` is present,
    /// [`BvhError::DimensionMismatch`] or [`BvhError::InvalidAabb`] for a bad box.
    pub fn insert(&mut self, id: O, aabb: Aabb<T>) -> Result<()> {
        self.check_aabb(&aabb)?;
        if self.objects.contains_key(&id) {
            return Err(BvhError::DuplicateId);
        }

        let Some(root) = self.root else {
            let leaf = self.arena.insert(None, None, None);
            self.arena[leaf].leaves.push(id);
            self.objects.insert(id, aabb);
            self.leaf_of.insert(id, leaf);
            self.arena.refit(leaf, &self.objects, self.leaf_scale);
            self.root = Some(leaf);
            self.check_after_mutation();
            return Ok(());
        };

        let leaf = self.selector.select(&mut self.arena, root, &aabb);
        debug_assert!(self.arena[leaf].is_leaf(), "selector must return a leaf");
        self.objects.insert(id, aabb);
        self.place(leaf, id);
        self.check_after_mutation();
        Ok(())
    }

    /// Remove object `id` and return its stored box.
    ///
    /// Fails with [`BvhError::MissingId`] if `id` is absent.
    pub fn remove(&mut self, id: O) -> Result<Aabb<T>> {
        let leaf = *self.leaf_of.get(&id).ok_or(BvhError::MissingId)?;
        self.leaf_of.remove(&id);
        let aabb = self.objects.remove(&id).ok_or(BvhError::MissingId)?;
        self.detach(leaf, id);
        self.check_after_mutation();
        Ok(aabb)
    }

    /// Move object `id` to box `aabb`.
    ///
    /// If the object's leaf box still covers `aabb` only the stored box changes;
    /// otherwise the object is removed and inserted again.
    pub fn update(&mut self, id: O, aabb: Aabb<T>) -> Result<UpdateOutcome> {
        self.check_aabb(&aabb)?;
        let leaf = *self.leaf_of.get(&id).ok_or(BvhError::MissingId)?;
        if self.arena[leaf].aabb.contains(&aabb) {
            if let Some(stored) = self.objects.get_mut(&id) {
                stored.copy_from(&aabb);
            }
            return Ok(UpdateOutcome::InPlace);
        }
        self.leaf_of.remove(&id);
        self.objects.remove(&id);
        self.detach(leaf, id);
        self.insert(id, aabb)?;
        Ok(UpdateOutcome::Reinserted)
    }

    /// Remove every object. Arena slots are released, capacity is kept for maps.
    pub fn clear(&mut self) {
        tracing::debug!(objects = self.objects.len(), "clear");
        self.arena.clear();
        self.objects.clear();
        self.leaf_of.clear();
        self.root = None;
    }

    /// Reserve arena room for `n` more objects.
    pub fn reserve(&mut self, n: usize) {
        // A binary tree over n single-object leaves has 2n - 1 nodes.
        self.arena.reserve(2 * n);
    }

    /// Put `id` (already in the object map) into leaf `s`, splitting `s` if it
    /// overflows, then refit and rebalance up to the root.
    fn place(&mut self, s: NodeId, id: O) {
        self.arena[s].leaves.push(id);
        self.leaf_of.insert(id, s);
        if self.arena[s].leaves.len() <= self.config.leaf_size {
            self.arena.refit(s, &self.objects, self.leaf_scale);
            let parent = self.arena[s].parent;
            self.refit_upward(parent, s);
            return;
        }

        let t = self.arena.expand(s);
        linear_split(&mut self.arena, s, t, &self.objects, self.config.leaf_size);
        for o in &self.arena[t].leaves {
            self.leaf_of.insert(*o, t);
        }
        self.arena.refit(s, &self.objects, self.leaf_scale);
        self.arena.refit(t, &self.objects, self.leaf_scale);
        let parent = self.arena[s].parent;
        self.refit_upward(parent, s);
    }

    /// Take `id` (already gone from both maps) out of `leaf`. An emptied leaf is
    /// freed and its sibling takes the parent's place.
    fn detach(&mut self, leaf: NodeId, id: O) {
        let leaves = &mut self.arena[leaf].leaves;
        if let Some(pos) = leaves.iter().position(|o| *o == id) {
            leaves.swap_remove(pos);
        }
        if !leaves.is_empty() {
            self.arena.refit(leaf, &self.objects, self.leaf_scale);
            let parent = self.arena[leaf].parent;
            self.refit_upward(parent, leaf);
            return;
        }

        let Some(parent) = self.arena[leaf].parent else {
            self.arena.free(leaf);
            self.root = None;
            return;
        };
        let Some(sibling) = self.arena.sibling(leaf) else {
            debug_assert!(false, "internal node {parent:?} with one child");
            return;
        };
        let grandparent = self.arena[parent].parent;
        self.arena.free(leaf);
        self.arena.free(parent);
        tracing::trace!(
            leaf = leaf.index(),
            sibling = sibling.index(),
            "promote sibling"
        );
        match grandparent {
            Some(q) => {
                self.arena.replace_child(q, parent, sibling);
                self.arena[sibling].parent = Some(q);
                self.refit_upward(Some(q), sibling);
            }
            None => {
                self.arena[sibling].parent = None;
                self.root = Some(sibling);
            }
        }
    }

    /// Refit and rebalance every node from `start` to the root; the last node
    /// reached becomes the root. `from` is the root if `start` is `None`.
    fn refit_upward(&mut self, start: Option<NodeId>, from: NodeId) {
        let mut top = from;
        let mut cursor = start;
        while let Some(n) = cursor {
            self.arena.refit_internal(n);
            let n = self.balancer.balance(&mut self.arena, n);
            top = n;
            cursor = self.arena[n].parent;
        }
        self.root = Some(top);
    }

    fn check_after_mutation(&self) {
        if cfg!(debug_assertions)
            && self.config.check_invariants
            && let Err(err) = self.validate()
        {
            panic!("{err}");
        }
    }
}

impl<T, O, S, B> DynamicBvh<T, O, S, B>
where
    T: Scalar,
    O: Copy + Ord + Debug,
{
    /// The configuration the tree was created with.
    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.config.dim
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether object `id` is stored.
    pub fn contains(&self, id: O) -> bool {
        self.objects.contains_key(&id)
    }

    /// The stored (tight) box of object `id`.
    pub fn get(&self, id: O) -> Option<&Aabb<T>> {
        self.objects.get(&id)
    }

    /// Stored objects and their boxes in id order.
    pub fn iter(&self) -> impl Iterator<Item = (O, &Aabb<T>)> + '_ {
        self.objects.iter().map(|(o, b)| (*o, b))
    }

    /// Root handle, `None` when empty.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Node behind a handle, if allocated.
    pub fn node(&self, id: NodeId) -> Option<&Node<T, O>> {
        self.arena.get(id)
    }

    /// The node arena.
    pub fn arena(&self) -> &Arena<T, O> {
        &self.arena
    }

    /// Leaf currently holding object `id`.
    pub fn leaf_of(&self, id: O) -> Option<NodeId> {
        self.leaf_of.get(&id).copied()
    }

    /// Height of the root; `0` when empty.
    pub fn height(&self) -> u32 {
        self.root.map_or(0, |r| self.arena[r].height)
    }

    /// Shape summary.
    pub fn stats(&self) -> BvhStats {
        let mut leaves = 0;
        let mut internal_measure = 0.0;
        for (_, node) in self.arena.iter() {
            if node.is_leaf() {
                leaves += 1;
            } else {
                internal_measure += node.aabb.measure();
            }
        }
        BvhStats {
            objects: self.objects.len(),
            nodes: self.arena.live(),
            leaves,
            height: self.height(),
            internal_measure,
        }
    }

    pub(crate) fn check_dim(&self, dim: usize) -> Result<()> {
        if dim == self.config.dim {
            Ok(())
        } else {
            Err(BvhError::DimensionMismatch {
                expected: self.config.dim,
                actual: dim,
            })
        }
    }

    fn check_aabb(&self, aabb: &Aabb<T>) -> Result<()> {
        self.check_dim(aabb.dim())?;
        if aabb.is_valid() {
            Ok(())
        } else {
            Err(BvhError::InvalidAabb)
        }
    }

    /// Check every structural invariant of the tree.
    ///
    /// Verifies parent/child links, two-or-zero children, exact internal boxes,
    /// leaf boxes covering their objects, heights, the AVL balance, leaf
    /// capacity, that every object sits in exactly one leaf, and that no arena
    /// node is leaked.
    pub fn validate(&self) -> Result<()> {
        let result = self.validate_inner();
        if let Err(err) = &result {
            tracing::debug!(%err, "validation failed");
        }
        result
    }

    fn validate_inner(&self) -> Result<()> {
        let fail = |msg: alloc::string::String| Err(BvhError::InvariantViolation(msg));
        if self.objects.len() != self.leaf_of.len() {
            return fail(format!(
                "object map has {} entries, leaf map {}",
                self.objects.len(),
                self.leaf_of.len()
            ));
        }
        let Some(root) = self.root else {
            if !self.objects.is_empty() || self.arena.live() != 0 {
                return fail(format!(
                    "empty root with {} objects and {} nodes",
                    self.objects.len(),
                    self.arena.live()
                ));
            }
            return Ok(());
        };
        if self.arena.try_get(root)?.parent.is_some() {
            return fail(format!("root {root:?} has a parent"));
        }

        let mut reached_nodes = 0_usize;
        let mut reached_objects = 0_usize;
        let mut open = vec![root];
        while let Some(id) = open.pop() {
            let node = self.arena.try_get(id)?;
            reached_nodes += 1;
            match (node.left, node.right) {
                (None, None) => {
                    if !node.is_leaf() {
                        return fail(format!("{id:?} has no children but is not a leaf"));
                    }
                    if node.height != 0 {
                        return fail(format!("leaf {id:?} has height {}", node.height));
                    }
                    if node.leaves.is_empty() || node.leaves.len() > self.config.leaf_size {
                        return fail(format!("leaf {id:?} holds {} objects", node.leaves.len()));
                    }
                    for o in &node.leaves {
                        if self.leaf_of.get(o) != Some(&id) {
                            return fail(format!("{o:?} in {id:?} is mapped elsewhere"));
                        }
                        let Some(b) = self.objects.get(o) else {
                            return fail(format!("{o:?} in {id:?} has no box"));
                        };
                        if !node.aabb.contains(b) {
                            return fail(format!("leaf {id:?} does not cover {o:?}"));
                        }
                    }
                    reached_objects += node.leaves.len();
                }
                (Some(l), Some(r)) => {
                    if node.is_leaf() || !node.leaves.is_empty() {
                        return fail(format!("internal {id:?} is marked as a leaf"));
                    }
                    let (left, right) = (self.arena.try_get(l)?, self.arena.try_get(r)?);
                    if left.parent != Some(id) || right.parent != Some(id) {
                        return fail(format!("children of {id:?} do not point back"));
                    }
                    if node.aabb != left.aabb.union(&right.aabb) {
                        return fail(format!("{id:?} box is not the union of its children"));
                    }
                    if node.height != 1 + left.height.max(right.height) {
                        return fail(format!("{id:?} has stale height {}", node.height));
                    }
                    if left.height.abs_diff(right.height) > 1 {
                        return fail(format!(
                            "{id:?} unbalanced: {} vs {}",
                            left.height, right.height
                        ));
                    }
                    open.push(l);
                    open.push(r);
                }
                _ => return fail(format!("{id:?} has exactly one child")),
            }
        }

        if reached_objects != self.objects.len() {
            return fail(format!(
                "{} objects reachable, {} stored",
                reached_objects,
                self.objects.len()
            ));
        }
        if reached_nodes != self.arena.live() {
            return fail(format!(
                "{} nodes reachable, {} allocated",
                reached_nodes,
                self.arena.live()
            ));
        }
        Ok(())
    }
}

impl<T, O, S, B> Debug for DynamicBvh<T, O, S, B>
where
    T: Scalar,
    O: Copy + Ord + Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicBvh")
            .field("dim", &self.config.dim)
            .field("leaf_size", &self.config.leaf_size)
            .field("tolerance", &self.config.tolerance)
            .field("objects", &self.objects.len())
            .field("nodes", &self.arena.live())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}
