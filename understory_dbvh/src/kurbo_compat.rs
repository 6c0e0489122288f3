// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions to and from [`kurbo`] 2D geometry.

use kurbo::{Line, Point, Rect, Vec2};

use crate::error::BvhError;
use crate::types::{Aabb, Ray};

impl From<Rect> for Aabb<f64> {
    /// Rectangles with swapped corners are normalized first.
    fn from(rect: Rect) -> Self {
        let r = rect.abs();
        Self::new([r.x0, r.y0], [r.x1, r.y1])
    }
}

impl TryFrom<&Aabb<f64>> for Rect {
    type Error = BvhError;

    fn try_from(aabb: &Aabb<f64>) -> Result<Self, Self::Error> {
        match (aabb.min(), aabb.max()) {
            ([x0, y0], [x1, y1]) => Ok(Self::new(*x0, *y0, *x1, *y1)),
            _ => Err(BvhError::DimensionMismatch {
                expected: 2,
                actual: aabb.dim(),
            }),
        }
    }
}

impl From<Line> for Ray<f64> {
    /// A segment ray: `t = 0` at `p0`, `t = 1` at `p1`.
    fn from(line: Line) -> Self {
        let d = line.p1 - line.p0;
        Self::new([line.p0.x, line.p0.y], [d.x, d.y]).with_max_t(1.0)
    }
}

impl Ray<f64> {
    /// Unbounded 2D ray from a point along a direction.
    pub fn from_point_dir(origin: Point, direction: Vec2) -> Self {
        Self::new([origin.x, origin.y], [direction.x, direction.y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_round_trips_and_normalizes() {
        let a = Aabb::from(Rect::new(4.0, 3.0, 1.0, 0.0));
        assert_eq!(a, Aabb::new([1.0, 0.0], [4.0, 3.0]));
        assert_eq!(Rect::try_from(&a), Ok(Rect::new(1.0, 0.0, 4.0, 3.0)));
        let cube = Aabb::new([0.0; 3], [1.0; 3]);
        assert!(Rect::try_from(&cube).is_err());
    }

    #[test]
    fn line_is_a_segment() {
        let seg = Ray::from(Line::new((0.0, 0.5), (2.0, 0.5)));
        assert!(seg.intersects(&Aabb::new([1.5, 0.0], [3.0, 1.0])));
        assert!(!seg.intersects(&Aabb::new([2.5, 0.0], [3.0, 1.0])));

        let ray = Ray::from_point_dir(Point::new(0.0, 0.5), Vec2::new(1.0, 0.0));
        assert!(ray.intersects(&Aabb::new([2.5, 0.0], [3.0, 1.0])));
    }
}
