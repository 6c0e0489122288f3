// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ray picking.
//!
//! Cast kurbo line segments and unbounded rays through a grid of rectangles and
//! pick the nearest hit.
//!
//! Run:
//! - `cargo run -p understory_dbvh_demos --example dbvh_ray_picking`

use kurbo::{Line, Point, Rect, Vec2};
use understory_dbvh::{Aabb, DynamicBvh, Ray};

fn main() {
    let mut bvh: DynamicBvh<f64, u32> = DynamicBvh::new(2, 4, 1.0).unwrap();
    let mut rects = Vec::new();
    for row in 0..8_u32 {
        for col in 0..8_u32 {
            let (x, y) = (f64::from(col) * 50.0, f64::from(row) * 50.0);
            let rect = Rect::new(x + 10.0, y + 10.0, x + 40.0, y + 40.0);
            bvh.insert(row * 8 + col, Aabb::from(rect)).unwrap();
            rects.push(rect);
        }
    }

    let segment = Line::new((0.0, 25.0), (120.0, 25.0));
    let hits = bvh.raycast(&Ray::from(segment)).unwrap();
    println!("segment {segment:?} hits {hits:?}");

    let origin = Point::new(-20.0, -20.0);
    let ray = Ray::from_point_dir(origin, Vec2::new(1.0, 1.0));
    let hits = bvh.raycast(&ray).unwrap();
    // Nearest by distance from the ray origin to the rectangle center.
    let nearest = hits.iter().copied().min_by(|a, b| {
        let da = rects[*a as usize].center().distance(origin);
        let db = rects[*b as usize].center().distance(origin);
        da.total_cmp(&db)
    });
    println!("diagonal ray hits {hits:?}, nearest {nearest:?}");

    let under_cursor = bvh.query_point(&[125.0, 75.0]).unwrap();
    println!("under the cursor at (125, 75): {under_cursor:?}");
}
