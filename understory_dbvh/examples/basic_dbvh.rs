// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Understory DBVH: insert, query, update, and remove.

use understory_dbvh::{Aabb, DynamicBvh};

fn main() {
    let mut bvh: DynamicBvh<f64, u32> = DynamicBvh::new(2, 1, 1.5).unwrap();
    bvh.insert(1, Aabb::new([0.0, 0.0], [10.0, 10.0])).unwrap();
    bvh.insert(2, Aabb::new([5.0, 5.0], [15.0, 15.0])).unwrap();

    // Nudge box 1; the fattened leaf absorbs it.
    let outcome = bvh.update(1, Aabb::new([1.0, 0.0], [11.0, 10.0])).unwrap();
    println!("update: {outcome:?}");

    // Query a point
    let hits = bvh.query_point(&[6.0, 6.0]).unwrap();
    println!("hits at (6,6): {hits:?}");

    bvh.remove(2).unwrap();
    println!("stats: {:?}", bvh.stats());
}
