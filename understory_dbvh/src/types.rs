// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.
//!
//! Boxes and rays carry their dimension at runtime so a single tree type serves
//! 2D, 3D and higher-dimensional workloads. The dimension is fixed when a tree is
//! created and checked on every public call.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::error::{BvhError, Result};

/// Numeric scalar abstraction for the coordinates of boxes and rays.
///
/// Cost metrics (surface-area-like measures, SAH comparisons, ray parameters)
/// are computed in `f64` regardless of the coordinate type.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// Add two scalar values.
    fn add(a: Self, b: Self) -> Self;

    /// Subtract two scalar values: a - b.
    fn sub(a: Self, b: Self) -> Self;

    /// Midpoint between a and b.
    fn mid(a: Self, b: Self) -> Self;

    /// Convert a scalar to the `f64` metric type.
    fn widen(v: Self) -> f64;

    /// Convert back from the `f64` metric type (may round).
    fn narrow(v: f64) -> Self;

    /// True if the value is NaN.
    fn is_nan(v: Self) -> bool;
}

impl Scalar for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> f64 {
        f64::from(v)
    }

    #[inline]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Narrowing scaled coordinates back to f32 is the caller's chosen precision."
    )]
    fn narrow(v: f64) -> Self {
        v as Self
    }

    #[inline]
    fn is_nan(v: Self) -> bool {
        v.is_nan()
    }
}

impl Scalar for f64 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> f64 {
        v
    }

    #[inline]
    fn narrow(v: f64) -> Self {
        v
    }

    #[inline]
    fn is_nan(v: Self) -> bool {
        v.is_nan()
    }
}

/// Axis-aligned bounding box in `K` dimensions.
///
/// Stored as a single buffer `[min_0, .., min_{K-1}, max_0, .., max_{K-1}]`.
/// Boxes are closed: two boxes that only touch on a face intersect.
#[derive(Clone, Debug, PartialEq)]
pub struct Aabb<T> {
    bounds: Vec<T>,
}

impl<T: Scalar> Aabb<T> {
    /// Create a new AABB from min/max corners of a compile-time dimension.
    pub fn new<const K: usize>(min: [T; K], max: [T; K]) -> Self {
        let mut bounds = Vec::with_capacity(2 * K);
        bounds.extend_from_slice(&min);
        bounds.extend_from_slice(&max);
        Self { bounds }
    }

    /// Create an AABB from min/max corner slices.
    ///
    /// Fails with [`BvhError::DimensionMismatch`] if the slices differ in length
    /// and with [`BvhError::InvalidDimension`] if they are empty.
    pub fn from_slices(min: &[T], max: &[T]) -> Result<Self> {
        if min.is_empty() {
            return Err(BvhError::InvalidDimension);
        }
        if min.len() != max.len() {
            return Err(BvhError::DimensionMismatch {
                expected: min.len(),
                actual: max.len(),
            });
        }
        let mut bounds = Vec::with_capacity(2 * min.len());
        bounds.extend_from_slice(min);
        bounds.extend_from_slice(max);
        Ok(Self { bounds })
    }

    /// Degenerate box covering a single point.
    pub fn from_point(p: &[T]) -> Self {
        let mut bounds = Vec::with_capacity(2 * p.len());
        bounds.extend_from_slice(p);
        bounds.extend_from_slice(p);
        Self { bounds }
    }

    /// All-zero box of the given dimension; placeholder storage for fresh arena slots.
    pub(crate) fn zeroed(dim: usize) -> Self {
        Self {
            bounds: alloc::vec![T::zero(); 2 * dim],
        }
    }

    /// Zero-dimensional stand-in used while a node's box is being rebuilt in place.
    pub(crate) const fn placeholder() -> Self {
        Self { bounds: Vec::new() }
    }

    /// Number of axes.
    #[inline]
    pub fn dim(&self) -> usize {
        self.bounds.len() / 2
    }

    /// Minimum corner.
    #[inline]
    pub fn min(&self) -> &[T] {
        &self.bounds[..self.dim()]
    }

    /// Maximum corner.
    #[inline]
    pub fn max(&self) -> &[T] {
        &self.bounds[self.dim()..]
    }

    #[inline]
    fn lo(&self, axis: usize) -> T {
        self.bounds[axis]
    }

    #[inline]
    fn hi(&self, axis: usize) -> T {
        self.bounds[self.dim() + axis]
    }

    /// Extent along `axis`, clamped at zero.
    #[inline]
    pub fn extent(&self, axis: usize) -> f64 {
        (T::widen(self.hi(axis)) - T::widen(self.lo(axis))).max(0.0)
    }

    /// Center of the box.
    pub fn center(&self) -> Vec<T> {
        (0..self.dim())
            .map(|i| T::mid(self.lo(i), self.hi(i)))
            .collect()
    }

    /// Return true if every axis has `min <= max` and no coordinate is NaN.
    pub fn is_valid(&self) -> bool {
        (0..self.dim()).all(|i| le(self.lo(i), self.hi(i)))
            && !self.bounds.iter().any(|v| T::is_nan(*v))
    }

    /// Whether the two boxes overlap (closed intervals on every axis).
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        debug_assert_eq!(self.dim(), other.dim(), "AABB dimensions differ");
        (0..self.dim()).all(|i| le(self.lo(i), other.hi(i)) && le(other.lo(i), self.hi(i)))
    }

    /// Whether `other` lies entirely inside this box.
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        debug_assert_eq!(self.dim(), other.dim(), "AABB dimensions differ");
        (0..self.dim()).all(|i| le(self.lo(i), other.lo(i)) && le(other.hi(i), self.hi(i)))
    }

    /// Whether this box contains the point.
    pub fn contains_point(&self, p: &[T]) -> bool {
        p.len() == self.dim()
            && p
                .iter()
                .enumerate()
                .all(|(i, v)| le(self.lo(i), *v) && le(*v, self.hi(i)))
    }

    /// The smallest box covering both.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    /// Grow this box in place to cover `other`.
    #[inline]
    pub fn union_with(&mut self, other: &Self) {
        debug_assert_eq!(self.dim(), other.dim(), "AABB dimensions differ");
        let k = self.dim();
        for i in 0..k {
            self.bounds[i] = min_t(self.bounds[i], other.bounds[i]);
            self.bounds[k + i] = max_t(self.bounds[k + i], other.bounds[k + i]);
        }
    }

    /// Overwrite this box with `other`, reusing the existing buffer.
    #[inline]
    pub(crate) fn copy_from(&mut self, other: &Self) {
        self.bounds.clear();
        self.bounds.extend_from_slice(&other.bounds);
    }

    /// Scale every axis about the center by `factor`.
    pub fn scale_about_center(&mut self, factor: f64) {
        let k = self.dim();
        for i in 0..k {
            let lo = T::widen(self.bounds[i]);
            let hi = T::widen(self.bounds[k + i]);
            let c = 0.5 * (lo + hi);
            let half = 0.5 * (hi - lo) * factor;
            // Rounding must never shrink the box.
            self.bounds[i] = min_t(self.bounds[i], T::narrow(c - half));
            self.bounds[k + i] = max_t(self.bounds[k + i], T::narrow(c + half));
        }
    }

    /// Surface-area-like measure used by the insertion and rotation heuristics.
    ///
    /// Length in 1D, perimeter in 2D, surface area in 3D and the K-volume above that.
    #[inline]
    pub fn measure(&self) -> f64 {
        measure_by(self.dim(), |i| self.extent(i))
    }

    /// Measure of `self ∪ other` without materializing the union.
    #[inline]
    pub fn measure_of_union(&self, other: &Self) -> f64 {
        debug_assert_eq!(self.dim(), other.dim(), "AABB dimensions differ");
        measure_by(self.dim(), |i| {
            let lo = T::widen(min_t(self.lo(i), other.lo(i)));
            let hi = T::widen(max_t(self.hi(i), other.hi(i)));
            (hi - lo).max(0.0)
        })
    }
}

fn measure_by(dim: usize, extent: impl Fn(usize) -> f64) -> f64 {
    match dim {
        1 => extent(0),
        2 => 2.0 * (extent(0) + extent(1)),
        3 => {
            let (x, y, z) = (extent(0), extent(1), extent(2));
            2.0 * (x * y + y * z + z * x)
        }
        _ => (0..dim).map(extent).product(),
    }
}

/// A ray (or segment) in `K` dimensions.
///
/// Points on the ray are `origin + t * direction` for `t` in `[0, max_t]`.
/// `max_t` is infinite unless set with [`Ray::with_max_t`].
#[derive(Clone, Debug, PartialEq)]
pub struct Ray<T> {
    origin: Vec<T>,
    direction: Vec<T>,
    max_t: f64,
}

impl<T: Scalar> Ray<T> {
    /// Create a ray from an origin and a direction of compile-time dimension.
    pub fn new<const K: usize>(origin: [T; K], direction: [T; K]) -> Self {
        Self {
            origin: origin.to_vec(),
            direction: direction.to_vec(),
            max_t: f64::INFINITY,
        }
    }

    /// Create a ray from origin and direction slices.
    pub fn from_slices(origin: &[T], direction: &[T]) -> Result<Self> {
        if origin.is_empty() {
            return Err(BvhError::InvalidDimension);
        }
        if origin.len() != direction.len() {
            return Err(BvhError::DimensionMismatch {
                expected: origin.len(),
                actual: direction.len(),
            });
        }
        Ok(Self {
            origin: origin.to_vec(),
            direction: direction.to_vec(),
            max_t: f64::INFINITY,
        })
    }

    /// Limit the ray to `t <= max_t`, turning it into a segment.
    pub fn with_max_t(mut self, max_t: f64) -> Self {
        self.max_t = max_t;
        self
    }

    /// Number of axes.
    pub fn dim(&self) -> usize {
        self.origin.len()
    }

    /// Ray origin.
    pub fn origin(&self) -> &[T] {
        &self.origin
    }

    /// Ray direction (not necessarily normalized).
    pub fn direction(&self) -> &[T] {
        &self.direction
    }

    /// Upper bound of the ray parameter.
    pub fn max_t(&self) -> f64 {
        self.max_t
    }

    /// Whether origin and direction are free of NaN and `max_t` is a
    /// non-negative number (infinity allowed).
    pub fn is_valid(&self) -> bool {
        !self.origin.iter().chain(&self.direction).any(|v| T::is_nan(*v))
            && self.max_t >= 0.0
    }

    /// Slab test: whether the ray hits the closed box for some `t` in `[0, max_t]`.
    pub fn intersects(&self, aabb: &Aabb<T>) -> bool {
        debug_assert_eq!(self.dim(), aabb.dim(), "ray and AABB dimensions differ");
        let mut t_enter = 0.0_f64;
        let mut t_exit = self.max_t;
        for i in 0..self.dim() {
            let o = T::widen(self.origin[i]);
            let d = T::widen(self.direction[i]);
            let lo = T::widen(aabb.lo(i));
            let hi = T::widen(aabb.hi(i));
            if d == 0.0 {
                if o < lo || o > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut ta = (lo - o) * inv;
            let mut tb = (hi - o) * inv;
            if ta > tb {
                core::mem::swap(&mut ta, &mut tb);
            }
            t_enter = t_enter.max(ta);
            t_exit = t_exit.min(tb);
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::new([0.0, 0.0], [1.0, 1.0]);
        let b = Aabb::new([1.0, 0.0], [2.0, 1.0]);
        let c = Aabb::new([1.5, 0.0], [2.0, 1.0]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn union_and_contains() {
        let a = Aabb::new([0.0, 0.0], [1.0, 1.0]);
        let b = Aabb::new([10.0, 10.0], [11.0, 11.0]);
        let u = a.union(&b);
        assert_eq!(u, Aabb::new([0.0, 0.0], [11.0, 11.0]));
        assert!(u.contains(&a));
        assert!(u.contains(&b));
        assert!(!a.contains(&u));
        assert_eq!(u.measure(), a.measure_of_union(&b));
    }

    #[test]
    fn measure_by_dimension() {
        assert_eq!(Aabb::new([1.0], [4.0]).measure(), 3.0);
        assert_eq!(Aabb::new([0.0, 0.0], [2.0, 3.0]).measure(), 10.0);
        assert_eq!(Aabb::new([0.0, 0.0, 0.0], [1.0, 2.0, 3.0]).measure(), 22.0);
        assert_eq!(
            Aabb::new([0.0, 0.0, 0.0, 0.0], [1.0, 2.0, 3.0, 4.0]).measure(),
            24.0
        );
    }

    #[test]
    fn scale_about_center_keeps_center() {
        let mut a = Aabb::new([0.0, 2.0], [2.0, 6.0]);
        a.scale_about_center(2.0);
        assert_eq!(a, Aabb::new([-1.0, 0.0], [3.0, 8.0]));
    }

    #[test]
    fn validity_rejects_inverted_and_nan() {
        assert!(Aabb::new([0.0_f32], [1.0]).is_valid());
        assert!(!Aabb::new([2.0_f32], [1.0]).is_valid());
        assert!(!Aabb::new([f64::NAN, 0.0], [1.0, 1.0]).is_valid());
    }

    #[test]
    fn from_slices_checks_lengths() {
        assert!(matches!(
            Aabb::<f64>::from_slices(&[0.0, 0.0], &[1.0]),
            Err(BvhError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            Aabb::<f64>::from_slices(&[], &[]),
            Err(BvhError::InvalidDimension)
        ));
    }

    #[test]
    fn ray_slab_hits_and_misses() {
        let b = Aabb::new([2.0, 2.0], [4.0, 4.0]);
        assert!(Ray::new([0.0, 3.0], [1.0, 0.0]).intersects(&b));
        assert!(!Ray::new([0.0, 5.0], [1.0, 0.0]).intersects(&b));
        // Pointing away.
        assert!(!Ray::new([0.0, 3.0], [-1.0, 0.0]).intersects(&b));
        // Diagonal.
        assert!(Ray::new([0.0, 0.0], [1.0, 1.0]).intersects(&b));
        // Origin inside.
        assert!(Ray::new([3.0, 3.0], [0.0, -1.0]).intersects(&b));
    }

    #[test]
    fn segment_stops_at_max_t() {
        let b = Aabb::new([2.0, 2.0], [4.0, 4.0]);
        let short = Ray::new([0.0, 3.0], [1.0, 0.0]).with_max_t(1.5);
        let long = Ray::new([0.0, 3.0], [1.0, 0.0]).with_max_t(2.0);
        assert!(!short.intersects(&b));
        assert!(long.intersects(&b));
    }
}
