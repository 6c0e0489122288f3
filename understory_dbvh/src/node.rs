// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The record stored in each arena slot.

use alloc::vec::Vec;

use crate::arena::NodeId;
use crate::types::{Aabb, Scalar};

bitflags::bitflags! {
    /// State bits of an arena slot.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The slot holds a live node.
        const ALLOCATED = 0b0000_0001;
        /// The node has no children and stores objects.
        const LEAF      = 0b0000_0010;
    }
}

/// A node of the hierarchy.
///
/// Internal nodes always have two children and a box equal to the union of the
/// children's boxes. Leaves have no children, hold up to `leaf_size` object ids,
/// and a box covering those objects, possibly inflated by the tree's tolerance.
///
/// Nodes are only reachable through [`Arena`](crate::Arena) handles; their links
/// and geometry are changed by the arena and the tree, never by callers.
#[derive(Clone, Debug)]
pub struct Node<T, O> {
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) aabb: Aabb<T>,
    pub(crate) height: u32,
    pub(crate) leaves: Vec<O>,
    pub(crate) flags: NodeFlags,
}

impl<T: Scalar, O> Node<T, O> {
    pub(crate) fn new(
        dim: usize,
        parent: Option<NodeId>,
        left: Option<NodeId>,
        right: Option<NodeId>,
        flags: NodeFlags,
    ) -> Self {
        Self {
            parent,
            left,
            right,
            aabb: Aabb::zeroed(dim),
            height: 0,
            leaves: Vec::new(),
            flags,
        }
    }
}

impl<T, O> Node<T, O> {
    /// Parent handle, `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Left child, `None` for leaves.
    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right child, `None` for leaves.
    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Both children of an internal node.
    #[inline]
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        Some((self.left?, self.right?))
    }

    /// Bounding box of the subtree.
    #[inline]
    pub fn aabb(&self) -> &Aabb<T> {
        &self.aabb
    }

    /// `0` for leaves, otherwise one more than the taller child.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Object ids stored in a leaf; empty for internal nodes.
    #[inline]
    pub fn leaves(&self) -> &[O] {
        &self.leaves
    }

    /// Whether this is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.flags.contains(NodeFlags::LEAF)
    }

    /// Whether the slot is live.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.flags.contains(NodeFlags::ALLOCATED)
    }

    /// Raw state bits.
    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }
}
