// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by the tree, the arena and the reference index.

use alloc::string::String;

use crate::arena::NodeId;

/// Result alias defaulting to [`BvhError`].
pub type Result<T, E = BvhError> = core::result::Result<T, E>;

/// Errors surfaced by [`DynamicBvh`](crate::DynamicBvh) and friends.
///
/// Argument errors are reported before any state changes, so a failed call
/// leaves the tree exactly as it was.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum BvhError {
    /// `insert` was called with an id that is already present.
    #[error("object id is already present")]
    DuplicateId,

    /// `remove` or `update` was called with an id that is not present.
    #[error("object id is not present")]
    MissingId,

    /// A box, point or ray does not have the tree's dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured on the tree.
        expected: usize,
        /// Dimension of the argument.
        actual: usize,
    },

    /// A box has `min > max` on some axis or a NaN coordinate.
    #[error("invalid AABB: min exceeds max or a coordinate is NaN")]
    InvalidAabb,

    /// A ray has a NaN origin or direction component, or a NaN or negative `max_t`.
    #[error("invalid ray: a component is NaN or max_t is negative")]
    InvalidRay,

    /// The configured dimension is zero.
    #[error("dimension must be at least 1")]
    InvalidDimension,

    /// The configured leaf size is zero.
    #[error("leaf size must be at least 1, got {0}")]
    InvalidLeafSize(usize),

    /// The configured tolerance is below 1.0 or not finite.
    #[error("tolerance must be a finite value >= 1.0, got {0}")]
    InvalidTolerance(f64),

    /// A node handle does not refer to an allocated arena slot.
    #[error("stale node handle {0:?}")]
    StaleHandle(NodeId),

    /// A structural invariant does not hold.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
