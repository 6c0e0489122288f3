// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dbvh --heading-base-level=0

//! Understory DBVH: a dynamic bounding volume hierarchy over k-dimensional AABBs.
//!
//! The tree is the hot path of a broad phase: objects are registered with a stable
//! id and a box, moved every frame, and queried with a box or a ray.
//!
//! - Incremental [`insert`](DynamicBvh::insert), [`remove`](DynamicBvh::remove) and
//!   [`update`](DynamicBvh::update); no rebuilds.
//! - Leaves hold up to `leaf_size` objects and may be fattened by a `tolerance`
//!   factor so small motions are absorbed without touching the tree.
//! - Every mutation refits the path to the root and applies at most one rotation
//!   per ancestor, keeping sibling heights within one of each other.
//! - Queries: [`broad_phase`](DynamicBvh::broad_phase), [`raycast`](DynamicBvh::raycast),
//!   [`query_point`](DynamicBvh::query_point), and the arbitrary
//!   [`query_pruned`](DynamicBvh::query_pruned).
//!
//! The dimension is a runtime parameter checked on every call, and the coordinate
//! type is generic over `f32` and `f64`. Surface-area metrics are computed in `f64`.
//!
//! # Example
//!
//! ```rust
//! use understory_dbvh::{Aabb, DynamicBvh, Ray, UpdateOutcome};
//!
//! // A 2D tree with up to two objects per leaf and 20% leaf slack.
//! let mut bvh: DynamicBvh<f64, u32> = DynamicBvh::new(2, 2, 1.2).unwrap();
//! bvh.insert(1, Aabb::new([0.0, 0.0], [10.0, 10.0])).unwrap();
//! bvh.insert(2, Aabb::new([5.0, 5.0], [15.0, 15.0])).unwrap();
//! bvh.insert(3, Aabb::new([40.0, 0.0], [45.0, 5.0])).unwrap();
//!
//! let mut hits = bvh.broad_phase(&Aabb::new([8.0, 8.0], [9.0, 9.0])).unwrap();
//! hits.sort_unstable();
//! assert_eq!(hits, [1, 2]);
//!
//! // A small nudge stays inside the fattened leaf.
//! let moved = bvh.update(3, Aabb::new([40.1, 0.0], [45.1, 5.0])).unwrap();
//! assert_eq!(moved, UpdateOutcome::InPlace);
//!
//! let ray = Ray::new([0.0, 2.0], [1.0, 0.0]);
//! let mut hits = bvh.raycast(&ray).unwrap();
//! hits.sort_unstable();
//! assert_eq!(hits, [1, 3]);
//! ```
//!
//! ## Policies
//!
//! The sibling selector and the balancer are type parameters:
//!
//! - [`GreedyDescent`] (default): walks down by the cheapest child; fast.
//! - [`BranchAndBound`]: best-first search with a lower bound; finds the cheapest
//!   insertion site at a higher per-insert cost.
//! - [`Rotations`] (default): AVL correction plus surface-area rotations.
//! - [`AvlOnly`]: AVL correction only.
//!
//! ```rust
//! use understory_dbvh::{AvlOnly, BranchAndBound, BvhConfig, DynamicBvh};
//!
//! let cfg = BvhConfig::new(3).with_leaf_size(4);
//! let bvh: DynamicBvh<f32, u64, BranchAndBound, AvlOnly> =
//!     DynamicBvh::with_policies(cfg, BranchAndBound::default(), AvlOnly).unwrap();
//! assert!(bvh.is_empty());
//! ```
//!
//! ## Features
//!
//! - `kurbo`: conversions between `kurbo::Rect`/`kurbo::Line` and [`Aabb`]/[`Ray`].
//!
//! ### Float semantics
//!
//! Boxes with a NaN coordinate or `min > max` on some axis are rejected with
//! [`BvhError::InvalidAabb`]. Rays with a NaN component are rejected by
//! [`raycast`](DynamicBvh::raycast) with [`BvhError::InvalidRay`]. Boxes are
//! closed: touching counts as overlap.

#![no_std]

extern crate alloc;

pub mod arena;
pub mod balance;
pub mod config;
pub mod error;
pub mod flatscan;
pub mod index;
pub mod node;
pub mod query;
pub mod select;
pub mod tree;
pub mod types;

mod split;

#[cfg(feature = "kurbo")]
mod kurbo_compat;

pub use arena::{Arena, NodeId};
pub use balance::{AvlOnly, Balancer, Rotations};
pub use config::BvhConfig;
pub use error::{BvhError, Result};
pub use flatscan::FlatScan;
pub use index::SpatialIndex;
pub use node::{Node, NodeFlags};
pub use select::{BranchAndBound, GreedyDescent, SiblingSelector};
pub use tree::{BvhStats, DynamicBvh, DynamicBvhF32, DynamicBvhF64, UpdateOutcome};
pub use types::{Aabb, Ray, Scalar};
