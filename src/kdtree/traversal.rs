//! Utilities to traverse the KDTree structure.

use std::marker::PhantomData;

use crate::kdtree::{KDNode, KDTreeIndex};
use crate::r#type::Coordinate;

/// A borrowed view onto one node of a KDTree.
#[derive(Debug)]
pub struct Node<'a, N: Coordinate, T, I: KDTreeIndex<N, T>> {
    /// The tree that this node is a reference onto
    tree: &'a I,

    /// Index into the tree's node arena
    index: usize,

    phantom: PhantomData<(N, T)>,
}

impl<N: Coordinate, T, I: KDTreeIndex<N, T>> Clone for Node<'_, N, T, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: Coordinate, T, I: KDTreeIndex<N, T>> Copy for Node<'_, N, T, I> {}

impl<'a, N: Coordinate, T, I: KDTreeIndex<N, T>> Node<'a, N, T, I> {
    pub(crate) fn from_root(tree: &'a I) -> Self {
        Self {
            tree,
            index: 0,
            phantom: PhantomData,
        }
    }

    #[inline]
    fn node(&self) -> &'a KDNode<N> {
        &self.tree.nodes()[self.index]
    }

    #[inline]
    fn child(&self, index: usize) -> Self {
        Self {
            tree: self.tree,
            index,
            phantom: PhantomData,
        }
    }

    /// The axis this node splits its patterns over, or `None` for a leaf.
    pub fn axis(&self) -> Option<usize> {
        self.node().split.map(|split| split.axis)
    }

    /// The split threshold on [`axis`][Self::axis], or `None` for a leaf.
    ///
    /// Patterns in the left child are not larger than the threshold on that axis, patterns in
    /// the right child are not smaller.
    pub fn threshold(&self) -> Option<N> {
        self.node().split.map(|split| split.threshold)
    }

    /// The child node holding the lower half, or `None` for a leaf.
    pub fn left_child(&self) -> Option<Self> {
        self.node().split.map(|split| self.child(split.left))
    }

    /// The child node holding the upper half, or `None` for a leaf.
    pub fn right_child(&self) -> Option<Self> {
        self.node().split.map(|split| self.child(split.right))
    }

    /// Returns `true` if this is a leaf bucket without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.node().split.is_none()
    }

    /// Returns `true` if this is an intermediate node with children.
    #[inline]
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }

    /// The number of patterns below this node.
    pub fn len(&self) -> usize {
        let node = self.node();
        node.end - node.start
    }

    /// Returns `true` if no pattern lies below this node. Only the root of an empty tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insertion ids of all patterns below this node.
    pub fn ids(&self) -> &'a [u32] {
        let node = self.node();
        &self.tree.ids()[node.start..node.end]
    }

    /// Interleaved coordinates of all patterns below this node, in the same order as
    /// [`ids`][Self::ids].
    pub fn coords(&self) -> &'a [N] {
        let node = self.node();
        let dims = self.tree.dims();
        &self.tree.coords()[dims * node.start..dims * node.end]
    }

    /// Insertion ids of the patterns stored in this leaf, or `None` for an intermediate node.
    pub fn bucket(&self) -> Option<&'a [u32]> {
        if self.is_leaf() {
            Some(self.ids())
        } else {
            None
        }
    }
}
