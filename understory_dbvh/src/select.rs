// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sibling selection: where a new object enters the hierarchy.
//!
//! A selector walks from the root and returns a leaf. If the best site is an
//! internal node, the selector gives it a fresh empty leaf sibling with
//! [`Arena::expand`] and returns that leaf. Selectors never touch object sets
//! or boxes of existing nodes; the tree refits after placement.
//!
//! Only nodes of height 0 or 1 may receive a new sibling. Pairing a deep
//! subtree with an empty leaf would unbalance the new parent by more than one
//! level, which the single AVL swap of the balancer cannot repair.

use alloc::collections::BinaryHeap;
use core::cmp::Ordering;

use crate::arena::{Arena, NodeId};
use crate::node::Node;
use crate::types::{Aabb, Scalar};

/// Tallest node that may become the sibling of a new leaf.
pub(crate) const MAX_SITE_HEIGHT: u32 = 1;

/// Strategy choosing the leaf that receives a new object.
pub trait SiblingSelector<T: Scalar, O: Copy + Ord> {
    /// Return a leaf for an object with box `aabb`, expanding an internal site if needed.
    fn select(&mut self, arena: &mut Arena<T, O>, root: NodeId, aabb: &Aabb<T>) -> NodeId;
}

fn settle<T: Scalar, O: Copy + Ord>(arena: &mut Arena<T, O>, site: NodeId) -> NodeId {
    if arena[site].is_leaf() {
        site
    } else {
        arena.expand(site)
    }
}

/// Greedy top-down descent in the style of Box2D's dynamic tree.
///
/// At each internal node the cost of making the new object this node's sibling
/// is compared with the cost of descending into either child; the walk stops
/// when staying is cheapest or a leaf is reached.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyDescent;

impl GreedyDescent {
    fn descend_cost<T: Scalar, O>(child: &Node<T, O>, aabb: &Aabb<T>) -> f64 {
        let combined = child.aabb.measure_of_union(aabb);
        if child.is_leaf() {
            combined
        } else {
            combined - child.aabb.measure()
        }
    }
}

impl<T: Scalar, O: Copy + Ord> SiblingSelector<T, O> for GreedyDescent {
    fn select(&mut self, arena: &mut Arena<T, O>, root: NodeId, aabb: &Aabb<T>) -> NodeId {
        let mut index = root;
        loop {
            let node = &arena[index];
            let Some((left, right)) = node.children() else {
                break;
            };
            let area = node.aabb.measure();
            let combined = node.aabb.measure_of_union(aabb);

            // Cost of a new parent for this node and the new leaf.
            let direct = if node.height <= MAX_SITE_HEIGHT {
                2.0 * combined
            } else {
                f64::INFINITY
            };
            // Minimum cost of pushing the leaf further down: every ancestor grows.
            let inherited = 2.0 * (combined - area);

            let cost_left = Self::descend_cost(&arena[left], aabb) + inherited;
            let cost_right = Self::descend_cost(&arena[right], aabb) + inherited;

            if direct < cost_left && direct < cost_right {
                break;
            }
            index = if cost_left <= cost_right { left } else { right };
        }
        settle(arena, index)
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    induced: f64,
    node: NodeId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so `BinaryHeap` pops the smallest induced cost first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .induced
            .total_cmp(&self.induced)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Branch-and-bound search for the globally cheapest site (Bittner et al.).
///
/// Nodes are explored in order of *induced* cost, the growth their ancestors
/// would suffer, and subtrees whose lower bound cannot beat the best site found
/// so far are pruned. The priority queue is kept between calls.
#[derive(Clone, Debug)]
pub struct BranchAndBound {
    queue: BinaryHeap<Candidate>,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::with_capacity(32),
        }
    }
}

impl<T: Scalar, O: Copy + Ord> SiblingSelector<T, O> for BranchAndBound {
    fn select(&mut self, arena: &mut Arena<T, O>, root: NodeId, aabb: &Aabb<T>) -> NodeId {
        let new_area = aabb.measure();
        let mut best: Option<NodeId> = None;
        let mut best_cost = f64::INFINITY;

        self.queue.clear();
        self.queue.push(Candidate {
            induced: 0.0,
            node: root,
        });
        while let Some(Candidate { induced, node }) = self.queue.pop() {
            if induced + new_area >= best_cost {
                // Everything left in the queue is at least this expensive.
                break;
            }
            let n = &arena[node];
            let cost = n.aabb.measure_of_union(aabb) + induced;
            if n.height <= MAX_SITE_HEIGHT && cost < best_cost {
                best = Some(node);
                best_cost = cost;
            }
            if let Some((left, right)) = n.children() {
                let child_induced = cost - n.aabb.measure();
                if child_induced + new_area < best_cost {
                    self.queue.push(Candidate {
                        induced: child_induced,
                        node: left,
                    });
                    self.queue.push(Candidate {
                        induced: child_induced,
                        node: right,
                    });
                }
            }
        }
        self.queue.clear();

        match best {
            Some(site) => settle(arena, site),
            None => GreedyDescent.select(arena, root, aabb),
        }
    }
}
