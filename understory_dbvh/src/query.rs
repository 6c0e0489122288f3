// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pruned traversal and the query forms built on it.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::arena::NodeId;
use crate::error::{BvhError, Result};
use crate::tree::DynamicBvh;
use crate::types::{Aabb, Ray, Scalar};

/// Initial room of the traversal stack; a balanced tree of a few million
/// leaves never needs more.
const STACK_CAPACITY: usize = 128;

impl<T, O, S, B> DynamicBvh<T, O, S, B>
where
    T: Scalar,
    O: Copy + Ord + Debug,
{
    /// Walk the tree, skipping every subtree whose box satisfies `skip`, and
    /// call `visit` for every object whose stored box does not satisfy `skip`.
    ///
    /// `skip` sees both node boxes and object boxes. Each object is visited at
    /// most once; order is unspecified.
    pub fn visit_pruned<P, V>(&self, mut skip: P, mut visit: V)
    where
        P: FnMut(&Aabb<T>) -> bool,
        V: FnMut(O),
    {
        let Some(root) = self.root else {
            return;
        };
        if skip(&self.arena[root].aabb) {
            return;
        }
        let mut open: Vec<NodeId> = Vec::with_capacity(STACK_CAPACITY);
        open.push(root);
        while let Some(m) = open.pop() {
            let node = &self.arena[m];
            match node.children() {
                None => {
                    for o in &node.leaves {
                        if let Some(b) = self.objects.get(o)
                            && !skip(b)
                        {
                            visit(*o);
                        }
                    }
                }
                Some((l, r)) => {
                    for child in [l, r] {
                        if !skip(&self.arena[child].aabb) {
                            open.push(child);
                        }
                    }
                }
            }
        }
    }

    /// Collect the objects that survive `skip` (`true` means prune).
    pub fn query_pruned<P>(&self, skip: P) -> Vec<O>
    where
        P: FnMut(&Aabb<T>) -> bool,
    {
        let mut out = Vec::new();
        self.visit_pruned(skip, |o| out.push(o));
        out
    }

    /// Objects whose boxes overlap `query`; touching counts as overlap.
    ///
    /// Fails with [`BvhError::DimensionMismatch`](crate::BvhError::DimensionMismatch)
    /// when `query` has the wrong dimension.
    pub fn broad_phase(&self, query: &Aabb<T>) -> Result<Vec<O>> {
        self.check_dim(query.dim())?;
        Ok(self.query_pruned(|b| !b.intersects(query)))
    }

    /// Objects whose boxes are hit by `ray` within `[0, ray.max_t()]`.
    ///
    /// Fails with [`BvhError::InvalidRay`](crate::BvhError::InvalidRay) for a
    /// ray with a NaN component or a NaN or negative `max_t`.
    pub fn raycast(&self, ray: &Ray<T>) -> Result<Vec<O>> {
        self.check_dim(ray.dim())?;
        if !ray.is_valid() {
            return Err(BvhError::InvalidRay);
        }
        Ok(self.query_pruned(|b| !ray.intersects(b)))
    }

    /// Objects whose boxes contain `point`, boundary included.
    pub fn query_point(&self, point: &[T]) -> Result<Vec<O>> {
        self.check_dim(point.len())?;
        Ok(self.query_pruned(|b| !b.contains_point(point)))
    }
}
