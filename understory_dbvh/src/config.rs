// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction-time configuration of a [`DynamicBvh`](crate::DynamicBvh).

use crate::error::{BvhError, Result};

/// Parameters captured when a tree is created. They never change afterwards.
///
/// ```rust
/// use understory_dbvh::BvhConfig;
///
/// let cfg = BvhConfig::new(3).with_leaf_size(4).with_tolerance(1.5);
/// assert!(cfg.validate().is_ok());
/// assert!(BvhConfig::new(0).validate().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BvhConfig {
    /// Spatial dimension `K` of every box, point and ray.
    pub dim: usize,
    /// Maximum number of objects stored in one leaf.
    pub leaf_size: usize,
    /// Growth of a leaf box's K-dimensional measure; `1.0` keeps leaves tight.
    ///
    /// Larger values let small motions be absorbed by [`DynamicBvh::update`](crate::DynamicBvh::update)
    /// without touching the tree, at the price of looser queries.
    pub tolerance: f64,
    /// Run [`DynamicBvh::validate`](crate::DynamicBvh::validate) after every
    /// successful mutation in debug builds and panic on failure.
    pub check_invariants: bool,
}

impl BvhConfig {
    /// Defaults for dimension `dim`: single-object leaves, no expansion.
    pub const fn new(dim: usize) -> Self {
        Self {
            dim,
            leaf_size: 1,
            tolerance: 1.0,
            check_invariants: false,
        }
    }

    /// Set the maximum number of objects per leaf.
    pub const fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Set the leaf expansion factor.
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable or disable post-operation invariant checks (debug builds only).
    pub const fn with_invariant_checks(mut self, on: bool) -> Self {
        self.check_invariants = on;
        self
    }

    /// Check the parameters.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(BvhError::InvalidDimension);
        }
        if self.leaf_size == 0 {
            return Err(BvhError::InvalidLeafSize(self.leaf_size));
        }
        if !self.tolerance.is_finite() || self.tolerance < 1.0 {
            return Err(BvhError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }

    /// Per-axis scale applied to leaf boxes: `tolerance^(1/dim)`, so the
    /// K-dimensional measure grows by exactly `tolerance`.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Dimensions are tiny; the conversion is exact in practice."
    )]
    pub fn leaf_scale(&self) -> f64 {
        if self.tolerance == 1.0 || self.dim == 0 {
            return 1.0;
        }
        libm::pow(self.tolerance, 1.0 / self.dim as f64)
    }
}
