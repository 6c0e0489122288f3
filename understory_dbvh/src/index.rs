// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Common interface over the tree and the flat-scan reference.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::balance::Balancer;
use crate::error::Result;
use crate::flatscan::FlatScan;
use crate::select::SiblingSelector;
use crate::tree::DynamicBvh;
use crate::types::{Aabb, Ray, Scalar};

/// Spatial index abstraction so tests and benches can drive either backend
/// through the same calls.
pub trait SpatialIndex<T: Scalar, O: Copy + Ord + Debug> {
    /// Insert a new object.
    fn insert(&mut self, id: O, aabb: Aabb<T>) -> Result<()>;

    /// Move an existing object.
    fn update(&mut self, id: O, aabb: Aabb<T>) -> Result<()>;

    /// Remove an object and return its box.
    fn remove(&mut self, id: O) -> Result<Aabb<T>>;

    /// Remove every object.
    fn clear(&mut self);

    /// Number of stored objects.
    fn len(&self) -> usize;

    /// Whether nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Objects whose boxes overlap `query`.
    fn broad_phase(&self, query: &Aabb<T>) -> Result<Vec<O>>;

    /// Objects whose boxes are hit by `ray`.
    fn raycast(&self, ray: &Ray<T>) -> Result<Vec<O>>;

    /// Objects whose boxes contain `point`.
    fn query_point(&self, point: &[T]) -> Result<Vec<O>>;
}

impl<T, O, S, B> SpatialIndex<T, O> for DynamicBvh<T, O, S, B>
where
    T: Scalar,
    O: Copy + Ord + Debug,
    S: SiblingSelector<T, O>,
    B: Balancer<T, O>,
{
    fn insert(&mut self, id: O, aabb: Aabb<T>) -> Result<()> {
        Self::insert(self, id, aabb)
    }

    fn update(&mut self, id: O, aabb: Aabb<T>) -> Result<()> {
        Self::update(self, id, aabb).map(|_| ())
    }

    fn remove(&mut self, id: O) -> Result<Aabb<T>> {
        Self::remove(self, id)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn broad_phase(&self, query: &Aabb<T>) -> Result<Vec<O>> {
        Self::broad_phase(self, query)
    }

    fn raycast(&self, ray: &Ray<T>) -> Result<Vec<O>> {
        Self::raycast(self, ray)
    }

    fn query_point(&self, point: &[T]) -> Result<Vec<O>> {
        Self::query_point(self, point)
    }
}

impl<T: Scalar, O: Copy + Ord + Debug> SpatialIndex<T, O> for FlatScan<T, O> {
    fn insert(&mut self, id: O, aabb: Aabb<T>) -> Result<()> {
        Self::insert(self, id, aabb)
    }

    fn update(&mut self, id: O, aabb: Aabb<T>) -> Result<()> {
        Self::update(self, id, aabb)
    }

    fn remove(&mut self, id: O) -> Result<Aabb<T>> {
        Self::remove(self, id)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn broad_phase(&self, query: &Aabb<T>) -> Result<Vec<O>> {
        Self::broad_phase(self, query)
    }

    fn raycast(&self, ray: &Ray<T>) -> Result<Vec<O>> {
        Self::raycast(self, ray)
    }

    fn query_point(&self, point: &[T]) -> Result<Vec<O>> {
        Self::query_point(self, point)
    }
}
