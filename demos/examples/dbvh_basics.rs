// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DBVH basics.
//!
//! Insert a few boxes, query them, move one, remove one, and print the tree shape.
//!
//! Run:
//! - `cargo run -p understory_dbvh_demos --example dbvh_basics`
//! - `RUST_LOG=understory_dbvh=trace cargo run -p understory_dbvh_demos --example dbvh_basics`

use tracing_subscriber::EnvFilter;
use understory_dbvh::{Aabb, DynamicBvh, NodeId, Ray};

fn print_subtree(bvh: &DynamicBvh<f64, u32>, id: NodeId, depth: usize) {
    let Some(node) = bvh.node(id) else {
        return;
    };
    let aabb = node.aabb();
    let pad = "  ".repeat(depth);
    match node.children() {
        None => println!(
            "{pad}leaf #{} h={} {:?}..{:?} {:?}",
            id.index(),
            node.height(),
            aabb.min(),
            aabb.max(),
            node.leaves()
        ),
        Some((l, r)) => {
            println!(
                "{pad}node #{} h={} {:?}..{:?}",
                id.index(),
                node.height(),
                aabb.min(),
                aabb.max()
            );
            print_subtree(bvh, l, depth + 1);
            print_subtree(bvh, r, depth + 1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2D, one object per leaf, tight leaves.
    let mut bvh: DynamicBvh<f64, u32> = DynamicBvh::new(2, 1, 1.0).unwrap();
    let boxes = [
        (0, Aabb::new([0.0, 0.0], [1.0, 1.0])),
        (1, Aabb::new([10.0, 10.0], [11.0, 11.0])),
        (2, Aabb::new([9.0, 9.0], [11.0, 11.0])),
        (3, Aabb::new([30.0, 30.0], [40.0, 40.0])),
        (4, Aabb::new([100.0, 100.0], [101.0, 101.0])),
        (5, Aabb::new([0.0, 0.0], [100.0, 100.0])),
    ];
    for (id, aabb) in boxes {
        bvh.insert(id, aabb).unwrap();
    }
    if let Some(root) = bvh.root() {
        print_subtree(&bvh, root, 0);
    }

    let hits = bvh
        .broad_phase(&Aabb::new([10.0, 10.0], [90.0, 90.0]))
        .unwrap();
    println!("overlapping [10,10]..[90,90]: {hits:?}");

    let ray = Ray::new([0.0, 35.0], [1.0, 0.0]);
    println!("ray along y=35: {:?}", bvh.raycast(&ray).unwrap());

    let outcome = bvh
        .update(3, Aabb::new([60.0, 60.0], [70.0, 70.0]))
        .unwrap();
    println!("moved 3: {outcome:?}");

    bvh.remove(5).unwrap();
    println!(
        "after removing 5, [50,50]..[60,60] hits {:?}",
        bvh.broad_phase(&Aabb::new([50.0, 50.0], [60.0, 60.0])).unwrap()
    );
    println!("{:?}", bvh.stats());
}
