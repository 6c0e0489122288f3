// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node arena: stable small-integer handles, free-list reuse, and the
//! structural primitives (expansion, swap, refit) the tree is built from.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::{Index, IndexMut};

use crate::error::{BvhError, Result};
use crate::node::{Node, NodeFlags};
use crate::types::{Aabb, Scalar};

/// Handle of a node in an [`Arena`].
///
/// Handles are plain slot indices. A handle stays valid while its node is
/// allocated; after the node is freed the slot may be handed out again, so a
/// handle kept across mutations of the tree must be re-checked with
/// [`Arena::get`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Node handles are 32-bit; arenas beyond u32::MAX slots are not supported."
    )]
    pub(crate) const fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    /// Slot index of this handle.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pool of fixed-layout nodes.
///
/// Slots are never shrunk: a freed slot keeps its box buffer and leaf vector
/// capacity, and the next allocation reuses it before the pool grows.
pub struct Arena<T, O> {
    dim: usize,
    nodes: Vec<Node<T, O>>,
    free_list: Vec<NodeId>,
    live: usize,
}

impl<T: Scalar, O: Copy + Ord> Arena<T, O> {
    /// Empty arena for boxes of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self::with_capacity(dim, 0)
    }

    /// Empty arena with room for `n` nodes before growing.
    pub fn with_capacity(dim: usize, n: usize) -> Self {
        Self {
            dim,
            nodes: Vec::with_capacity(n),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Dimension of every node box.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of allocated nodes.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Number of slots, allocated or free.
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// Slots available before the pool reallocates.
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Reserve room for at least `n` more nodes.
    pub fn reserve(&mut self, n: usize) {
        self.nodes.reserve(n.saturating_sub(self.free_list.len()));
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.live = 0;
    }

    /// Allocate a node with the given links.
    ///
    /// The node is a leaf when it has no children. Its box and height are left
    /// stale; the caller refits it before the tree is observed again.
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        left: Option<NodeId>,
        right: Option<NodeId>,
    ) -> NodeId {
        debug_assert_eq!(
            left.is_none(),
            right.is_none(),
            "a node has zero or two children"
        );
        let flags = if left.is_none() {
            NodeFlags::ALLOCATED | NodeFlags::LEAF
        } else {
            NodeFlags::ALLOCATED
        };
        self.live += 1;
        if let Some(id) = self.free_list.pop() {
            let node = &mut self.nodes[id.index()];
            node.parent = parent;
            node.left = left;
            node.right = right;
            node.height = 0;
            node.flags = flags;
            return id;
        }
        if self.nodes.len() == self.nodes.capacity() {
            tracing::trace!(slots = self.nodes.len(), "arena grows");
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes
            .push(Node::new(self.dim, parent, left, right, flags));
        id
    }

    /// Release a node. Its handle becomes stale and may be reused.
    pub fn free(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.index()) else {
            debug_assert!(false, "freeing out-of-range handle {id:?}");
            return;
        };
        if !node.is_allocated() {
            debug_assert!(false, "double free of {id:?}");
            return;
        }
        node.flags = NodeFlags::empty();
        node.leaves.clear();
        node.parent = None;
        node.left = None;
        node.right = None;
        node.height = 0;
        self.free_list.push(id);
        self.live -= 1;
    }

    /// The node behind `id`, if it is allocated.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<T, O>> {
        self.nodes.get(id.index()).filter(|n| n.is_allocated())
    }

    /// Mutable access to the node behind `id`, if it is allocated.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<T, O>> {
        self.nodes.get_mut(id.index()).filter(|n| n.is_allocated())
    }

    /// Like [`Arena::get`] but reports a stale handle as an error.
    pub fn try_get(&self, id: NodeId) -> Result<&Node<T, O>> {
        self.get(id).ok_or(BvhError::StaleHandle(id))
    }

    /// Iterate over allocated nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<T, O>)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_allocated())
            .map(|(i, n)| (NodeId::new(i), n))
    }

    /// The other child of `id`'s parent.
    pub fn sibling(&self, id: NodeId) -> Option<NodeId> {
        let (l, r) = self[self[id].parent?].children()?;
        Some(if l == id { r } else { l })
    }

    /// Point `parent`'s branch that holds `old` at `new`. Does not touch `new.parent`.
    pub(crate) fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        let p = &mut self[parent];
        if p.left == Some(old) {
            p.left = Some(new);
        } else {
            debug_assert_eq!(p.right, Some(old), "{old:?} is not a child of {parent:?}");
            p.right = Some(new);
        }
    }

    /// Give `s` a new empty leaf sibling under a fresh parent and return the leaf.
    ///
    /// ```text
    ///    q            q
    ///    |            |
    ///    s    =>      p
    ///                / \
    ///               s   m
    /// ```
    ///
    /// `s` keeps its children and objects. The boxes and heights of `p` and `m`
    /// are stale until the caller refits them.
    pub fn expand(&mut self, s: NodeId) -> NodeId {
        let q = self[s].parent;
        let m = self.insert(None, None, None);
        let p = self.insert(q, Some(s), Some(m));
        self[s].parent = Some(p);
        self[m].parent = Some(p);
        if let Some(q) = q {
            self.replace_child(q, s, p);
        }
        tracing::trace!(node = s.index(), parent = p.index(), leaf = m.index(), "expand");
        m
    }

    /// Exchange the positions of `x` and `y` under their parents.
    ///
    /// Neither node may be an ancestor of the other and both must have parents.
    /// Boxes and heights are not refit.
    pub fn swap(&mut self, x: NodeId, y: NodeId) {
        let (Some(p), Some(q)) = (self[x].parent, self[y].parent) else {
            debug_assert!(false, "swap of a parentless node");
            return;
        };
        if p == q {
            let node = &mut self[p];
            core::mem::swap(&mut node.left, &mut node.right);
            return;
        }
        self.replace_child(p, x, y);
        self.replace_child(q, y, x);
        self[x].parent = Some(q);
        self[y].parent = Some(p);
    }

    /// Recompute the height of `n` from its children.
    #[inline]
    pub fn set_height(&mut self, n: NodeId) {
        let height = match self[n].children() {
            Some((l, r)) => 1 + self[l].height.max(self[r].height),
            None => 0,
        };
        self[n].height = height;
    }

    /// Recompute the box of `n`.
    ///
    /// Internal nodes take the union of their children. Leaves take the union
    /// of their objects' boxes scaled about the center by `leaf_scale`.
    pub fn set_aabb(&mut self, n: NodeId, objects: &BTreeMap<O, Aabb<T>>, leaf_scale: f64) {
        if self[n].is_leaf() {
            self.set_leaf_aabb(n, objects, leaf_scale);
        } else {
            self.set_internal_aabb(n);
        }
    }

    /// Box and height of `n` in one step.
    #[inline]
    pub fn refit(&mut self, n: NodeId, objects: &BTreeMap<O, Aabb<T>>, leaf_scale: f64) {
        self.set_aabb(n, objects, leaf_scale);
        self.set_height(n);
    }

    /// Box and height of an internal node; no object map needed.
    #[inline]
    pub(crate) fn refit_internal(&mut self, n: NodeId) {
        self.set_internal_aabb(n);
        self.set_height(n);
    }

    fn set_internal_aabb(&mut self, n: NodeId) {
        let Some((l, r)) = self[n].children() else {
            return;
        };
        let mut aabb = self.take_aabb(n);
        aabb.copy_from(&self[l].aabb);
        aabb.union_with(&self[r].aabb);
        self[n].aabb = aabb;
    }

    fn set_leaf_aabb(&mut self, n: NodeId, objects: &BTreeMap<O, Aabb<T>>, leaf_scale: f64) {
        let mut aabb = self.take_aabb(n);
        let mut members = self[n].leaves.iter().filter_map(|o| objects.get(o));
        if let Some(first) = members.next() {
            aabb.copy_from(first);
            for b in members {
                aabb.union_with(b);
            }
            if leaf_scale != 1.0 {
                aabb.scale_about_center(leaf_scale);
            }
        }
        self[n].aabb = aabb;
    }

    fn take_aabb(&mut self, n: NodeId) -> Aabb<T> {
        core::mem::replace(&mut self[n].aabb, Aabb::placeholder())
    }
}

impl<T, O> Index<NodeId> for Arena<T, O> {
    type Output = Node<T, O>;

    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        let node = &self.nodes[id.index()];
        debug_assert!(node.is_allocated(), "stale node handle {id:?}");
        node
    }
}

impl<T, O> IndexMut<NodeId> for Arena<T, O> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        let node = &mut self.nodes[id.index()];
        debug_assert!(node.is_allocated(), "stale node handle {id:?}");
        node
    }
}

impl<T, O> Debug for Arena<T, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("dim", &self.dim)
            .field("slots", &self.nodes.len())
            .field("live", &self.live)
            .field("free", &self.free_list.len())
            .finish_non_exhaustive()
    }
}
