// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Brute-force index with linear scans. Small and simple; the reference the
//! tree is checked against.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::{BvhError, Result};
use crate::types::{Aabb, Ray, Scalar};

/// Flat map of objects scanned on every query.
///
/// Shares the tree's argument checks and error contract.
pub struct FlatScan<T, O> {
    dim: usize,
    entries: BTreeMap<O, Aabb<T>>,
}

impl<T: Scalar, O: Copy + Ord + Debug> FlatScan<T, O> {
    /// Create an empty index for boxes of dimension `dim`.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(BvhError::InvalidDimension);
        }
        Ok(Self {
            dim,
            entries: BTreeMap::new(),
        })
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored box of `id`.
    pub fn get(&self, id: O) -> Option<&Aabb<T>> {
        self.entries.get(&id)
    }

    /// Insert `id`; fails on duplicates and bad boxes.
    pub fn insert(&mut self, id: O, aabb: Aabb<T>) -> Result<()> {
        self.check_aabb(&aabb)?;
        if self.entries.contains_key(&id) {
            return Err(BvhError::DuplicateId);
        }
        self.entries.insert(id, aabb);
        Ok(())
    }

    /// Replace the box of `id`.
    pub fn update(&mut self, id: O, aabb: Aabb<T>) -> Result<()> {
        self.check_aabb(&aabb)?;
        let slot = self.entries.get_mut(&id).ok_or(BvhError::MissingId)?;
        *slot = aabb;
        Ok(())
    }

    /// Remove `id` and return its box.
    pub fn remove(&mut self, id: O) -> Result<Aabb<T>> {
        self.entries.remove(&id).ok_or(BvhError::MissingId)
    }

    /// Drop every object.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Objects whose boxes overlap `query`.
    pub fn broad_phase(&self, query: &Aabb<T>) -> Result<Vec<O>> {
        self.check_dim(query.dim())?;
        Ok(self.scan(|b| b.intersects(query)))
    }

    /// Objects whose boxes are hit by `ray`.
    pub fn raycast(&self, ray: &Ray<T>) -> Result<Vec<O>> {
        self.check_dim(ray.dim())?;
        if !ray.is_valid() {
            return Err(BvhError::InvalidRay);
        }
        Ok(self.scan(|b| ray.intersects(b)))
    }

    /// Objects whose boxes contain `point`.
    pub fn query_point(&self, point: &[T]) -> Result<Vec<O>> {
        self.check_dim(point.len())?;
        Ok(self.scan(|b| b.contains_point(point)))
    }

    fn scan(&self, mut keep: impl FnMut(&Aabb<T>) -> bool) -> Vec<O> {
        let mut out = Vec::new();
        for (id, b) in &self.entries {
            if keep(b) {
                out.push(*id);
            }
        }
        out
    }

    fn check_dim(&self, dim: usize) -> Result<()> {
        if dim == self.dim {
            Ok(())
        } else {
            Err(BvhError::DimensionMismatch {
                expected: self.dim,
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
}

impl<T, O> Debug for FlatScan<T, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlatScan")
            .field("dim", &self.dim)
            .field("alive", &self.entries.len())
            .finish_non_exhaustive()
    }
}
