// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Local rebalancing applied at every ancestor during a refit walk.
//!
//! Two phases run on an internal node `N` whose children are already refit:
//!
//! 1. AVL correction. If the children's heights differ by two, the shallow
//!    child trades places with the deeper grandchild on the other side.
//! 2. Area rotation. Of the six child/grandchild swaps
//!    `B↔F, B↔G, C↔D, C↔E, D↔F, D↔G` in
//!
//! ```text
//!        N
//!       / \
//!      B   C
//!     / \ / \
//!    D  E F  G
//! ```
//!
//!    the one that lowers `measure(left) + measure(right)` the most is applied,
//!    provided it keeps every touched node AVL-balanced and leaves `N`'s height
//!    unchanged. Ties go to the earlier candidate in that order.

use crate::arena::{Arena, NodeId};
use crate::types::Scalar;

/// Strategy applied to each ancestor of a structural change.
///
/// Implementations must leave `n` AVL-balanced with a correct box and height,
/// and must not move `n` itself: the refit walk continues from `n`'s parent.
pub trait Balancer<T: Scalar, O: Copy + Ord> {
    /// Rebalance the subtree at `n` and return `n`.
    fn balance(&mut self, arena: &mut Arena<T, O>, n: NodeId) -> NodeId;
}

/// AVL correction followed by the area-reducing rotation. The default.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rotations;

/// AVL correction only. Cheaper updates, looser boxes.
#[derive(Clone, Copy, Debug, Default)]
pub struct AvlOnly;

impl<T: Scalar, O: Copy + Ord> Balancer<T, O> for Rotations {
    fn balance(&mut self, arena: &mut Arena<T, O>, n: NodeId) -> NodeId {
        if !arena[n].is_leaf() {
            avl_correct(arena, n);
            rotate_for_area(arena, n);
        }
        n
    }
}

impl<T: Scalar, O: Copy + Ord> Balancer<T, O> for AvlOnly {
    fn balance(&mut self, arena: &mut Arena<T, O>, n: NodeId) -> NodeId {
        if !arena[n].is_leaf() {
            avl_correct(arena, n);
        }
        n
    }
}

/// Phase A. Returns true if a swap was made.
pub(crate) fn avl_correct<T: Scalar, O: Copy + Ord>(arena: &mut Arena<T, O>, n: NodeId) -> bool {
    let Some((left, right)) = arena[n].children() else {
        return false;
    };
    let (hl, hr) = (arena[left].height, arena[right].height);
    if hl.abs_diff(hr) <= 1 {
        return false;
    }
    debug_assert_eq!(hl.abs_diff(hr), 2, "children of {n:?} drifted by more than one step");
    let (shallow, deep) = if hl < hr { (left, right) } else { (right, left) };
    let Some((b, c)) = arena[deep].children() else {
        return false;
    };
    let tall = if arena[b].height > arena[c].height { b } else { c };

    arena.swap(shallow, tall);
    arena.refit_internal(deep);
    arena.refit_internal(n);
    tracing::trace!(node = n.index(), shallow = shallow.index(), tall = tall.index(), "avl swap");
    true
}

#[derive(Clone, Copy, Debug)]
struct Swap {
    x: NodeId,
    y: NodeId,
    inner: [Option<NodeId>; 2],
    cost: f64,
    label: &'static str,
}

/// Phase B. Returns true if a rotation was applied.
pub(crate) fn rotate_for_area<T: Scalar, O: Copy + Ord>(
    arena: &mut Arena<T, O>,
    n: NodeId,
) -> bool {
    let Some((b, c)) = arena[n].children() else {
        return false;
    };
    let below_b = arena[b].children();
    let below_c = arena[c].children();
    if below_b.is_none() && below_c.is_none() {
        return false;
    }

    let height = arena[n].height;
    let current = arena[b].aabb.measure() + arena[c].aabb.measure();
    let mut best_cost = current;
    let mut best: Option<Swap> = None;
    let mut consider = |candidate: Option<Swap>| {
        if let Some(swap) = candidate
            && swap.cost < best_cost
        {
            best_cost = swap.cost;
            best = Some(swap);
        }
    };

    if let Some((f, g)) = below_c {
        consider(child_with_grandchild(arena, height, b, c, f, g, "B<->F"));
        consider(child_with_grandchild(arena, height, b, c, g, f, "B<->G"));
    }
    if let Some((d, e)) = below_b {
        consider(child_with_grandchild(arena, height, c, b, d, e, "C<->D"));
        consider(child_with_grandchild(arena, height, c, b, e, d, "C<->E"));
    }
    if let (Some((d, e)), Some((f, g))) = (below_b, below_c) {
        consider(grandchildren(arena, height, (b, d, e), (c, f, g), "D<->F"));
        consider(grandchildren(arena, height, (b, d, e), (c, g, f), "D<->G"));
    }

    let Some(swap) = best else {
        return false;
    };
    arena.swap(swap.x, swap.y);
    for inner in swap.inner.into_iter().flatten() {
        arena.refit_internal(inner);
    }
    arena.refit_internal(n);
    tracing::trace!(
        node = n.index(),
        rotation = swap.label,
        before = current,
        after = swap.cost,
        "area rotation"
    );
    true
}

/// Child `x` of `N` trades places with grandchild `y`, whose parent is `z`
/// (the other child of `N`) and whose sibling is `w`. Result: `N(y, z(x, w))`.
fn child_with_grandchild<T: Scalar, O: Copy + Ord>(
    arena: &Arena<T, O>,
    height: u32,
    x: NodeId,
    z: NodeId,
    y: NodeId,
    w: NodeId,
    label: &'static str,
) -> Option<Swap> {
    let (hx, hy, hw) = (arena[x].height, arena[y].height, arena[w].height);
    if hx.abs_diff(hw) > 1 {
        return None;
    }
    let hz = 1 + hx.max(hw);
    if hy.abs_diff(hz) > 1 || 1 + hy.max(hz) != height {
        return None;
    }
    let cost = arena[y].aabb.measure() + arena[x].aabb.measure_of_union(&arena[w].aabb);
    Some(Swap {
        x,
        y,
        inner: [Some(z), None],
        cost,
        label,
    })
}

/// Grandchild `d` (under `b`, sibling `e`) trades places with grandchild `f`
/// (under `c`, sibling `g`). Result: `N(b(f, e), c(d, g))`.
fn grandchildren<T: Scalar, O: Copy + Ord>(
    arena: &Arena<T, O>,
    height: u32,
    (b, d, e): (NodeId, NodeId, NodeId),
    (c, f, g): (NodeId, NodeId, NodeId),
    label: &'static str,
) -> Option<Swap> {
    let (hd, he, hf, hg) = (
        arena[d].height,
        arena[e].height,
        arena[f].height,
        arena[g].height,
    );
    if hf.abs_diff(he) > 1 || hd.abs_diff(hg) > 1 {
        return None;
    }
    let hb = 1 + hf.max(he);
    let hc = 1 + hd.max(hg);
    if hb.abs_diff(hc) > 1 || 1 + hb.max(hc) != height {
        return None;
    }
    let cost = arena[f].aabb.measure_of_union(&arena[e].aabb)
        + arena[d].aabb.measure_of_union(&arena[g].aabb);
    Some(Swap {
        x: d,
        y: f,
        inner: [Some(b), Some(c)],
        cost,
        label,
    })
}
