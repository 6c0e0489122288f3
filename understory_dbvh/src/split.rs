// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overflowing leaf split (linear, after Guttman's R-tree split).
//!
//! Seeds are chosen along the axis with the largest normalized separation:
//! the member whose box ends first and the member whose box starts last.
//! The remaining members go to whichever side grows least.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::arena::{Arena, NodeId};
use crate::types::{Aabb, Scalar};

/// Move members of the overfull leaf `s` into the empty leaf `t`.
///
/// Both leaves end non-empty and no larger than `leaf_size`. Boxes are not
/// refit here.
pub(crate) fn linear_split<T: Scalar, O: Copy + Ord>(
    arena: &mut Arena<T, O>,
    s: NodeId,
    t: NodeId,
    objects: &BTreeMap<O, Aabb<T>>,
    leaf_size: usize,
) {
    debug_assert!(arena[t].leaves.is_empty(), "split target must be empty");
    let mut members = core::mem::take(&mut arena[s].leaves);
    debug_assert!(members.len() >= 2, "split needs at least two members");

    let boxes: Vec<&Aabb<T>> = members.iter().filter_map(|o| objects.get(o)).collect();
    if leaf_size == 1 || members.len() == 2 || boxes.len() != members.len() {
        // Any one member will do; move the newest.
        if let Some(moved) = members.pop() {
            arena[t].leaves.push(moved);
        }
        arena[s].leaves = members;
        return;
    }

    let (axis, kl, kr) = pick_seeds(&boxes);
    tracing::trace!(leaf = s.index(), sibling = t.index(), ?axis, "split leaf");

    let mut left_box = boxes[kl].clone();
    let mut right_box = boxes[kr].clone();
    let mut left = Vec::with_capacity(leaf_size);
    let mut right = core::mem::take(&mut arena[t].leaves);
    left.push(members[kl]);
    right.push(members[kr]);
    for (i, (o, b)) in members.iter().zip(&boxes).enumerate() {
        if i == kl || i == kr {
            continue;
        }
        let grow_left = left_box.measure_of_union(b) - left_box.measure();
        let grow_right = right_box.measure_of_union(b) - right_box.measure();
        if grow_left <= grow_right {
            left_box.union_with(b);
            left.push(*o);
        } else {
            right_box.union_with(b);
            right.push(*o);
        }
    }
    debug_assert!(left.len() <= leaf_size && right.len() <= leaf_size);
    arena[s].leaves = left;
    arena[t].leaves = right;
}

/// Pick two distinct seed members. Returns the axis used (if any) and the
/// indices of the left and right seeds.
fn pick_seeds<T: Scalar>(boxes: &[&Aabb<T>]) -> (Option<usize>, usize, usize) {
    let n = boxes.len();
    let mut best: Option<(f64, usize, usize, usize)> = None;
    for axis in 0..boxes[0].dim() {
        let hi = |i: usize| T::widen(boxes[i].max()[axis]);
        let lo = |i: usize| T::widen(boxes[i].min()[axis]);

        let mut kl = 0;
        for i in 1..n {
            if hi(i) < hi(kl) {
                kl = i;
            }
        }
        let mut kr = if kl == 0 { 1 } else { 0 };
        for i in 0..n {
            if i != kl && lo(i) > lo(kr) {
                kr = i;
            }
        }

        let mut min_lo = lo(0);
        let mut max_hi = hi(0);
        for i in 1..n {
            min_lo = min_lo.min(lo(i));
            max_hi = max_hi.max(hi(i));
        }
        let extent = max_hi - min_lo;
        if extent <= 0.0 {
            continue;
        }
        let separation = (lo(kr) - hi(kl)) / extent;
        if best.is_none_or(|(b, ..)| separation > b) {
            best = Some((separation, axis, kl, kr));
        }
    }
    match best {
        Some((_, axis, kl, kr)) => (Some(axis), kl, kr),
        None => (None, 0, n - 1),
    }
}
