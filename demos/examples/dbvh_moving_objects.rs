// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Moving objects.
//!
//! A toy broad phase: a few hundred kurbo rectangles drift every frame and the
//! tree reports overlapping pairs. Fatter leaves absorb more motion in place.
//!
//! Run:
//! - `cargo run -p understory_dbvh_demos --example dbvh_moving_objects`

use kurbo::{Rect, Vec2};
use tracing_subscriber::EnvFilter;
use understory_dbvh::{Aabb, BvhConfig, DynamicBvh, UpdateOutcome};

struct Body {
    rect: Rect,
    velocity: Vec2,
}

fn bodies(count: u32) -> Vec<Body> {
    // Deterministic scatter so runs are comparable.
    (0..count)
        .map(|i| {
            let f = f64::from(i);
            let x = (f * 37.0) % 800.0;
            let y = (f * 91.0) % 600.0;
            Body {
                rect: Rect::new(x, y, x + 12.0, y + 12.0),
                velocity: Vec2::new((f * 0.7).sin(), (f * 1.3).cos()),
            }
        })
        .collect()
}

fn simulate(tolerance: f64, frames: usize) {
    let cfg = BvhConfig::new(2).with_leaf_size(2).with_tolerance(tolerance);
    let mut bvh: DynamicBvh<f64, u32> = DynamicBvh::with_config(cfg).unwrap();
    let mut world = bodies(400);
    for (id, body) in (0_u32..).zip(&world) {
        bvh.insert(id, Aabb::from(body.rect)).unwrap();
    }

    let mut in_place = 0_usize;
    let mut reinserted = 0_usize;
    let mut pairs = 0_usize;
    for _ in 0..frames {
        for (id, body) in (0_u32..).zip(&mut world) {
            body.rect = body.rect + body.velocity;
            match bvh.update(id, Aabb::from(body.rect)).unwrap() {
                UpdateOutcome::InPlace => in_place += 1,
                UpdateOutcome::Reinserted => reinserted += 1,
            }
        }
        for (id, body) in (0_u32..).zip(&world) {
            pairs += bvh
                .broad_phase(&Aabb::from(body.rect))
                .unwrap()
                .into_iter()
                .filter(|other| *other > id)
                .count();
        }
    }
    let stats = bvh.stats();
    tracing::info!(tolerance, in_place, reinserted, pairs, height = stats.height, "simulated");
    println!(
        "tolerance {tolerance:>4}: {in_place:>6} in place, {reinserted:>6} reinserted, \
         {pairs} candidate pairs, height {}, SAH {:.0}",
        stats.height, stats.internal_measure
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    for tolerance in [1.0, 1.5, 2.0, 4.0] {
        simulate(tolerance, 60);
    }
}
