use std::sync::atomic::{AtomicUsize, Ordering};

use crate::kdtree::r#trait::KDTreeIndex;
use crate::r#type::Coordinate;

/// Metadata describing the shape of a [`KDTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KDTreeMetadata {
    pub(crate) dims: usize,
    pub(crate) bucket_size: usize,
    pub(crate) num_items: usize,
}

impl KDTreeMetadata {
    /// The dimensionality of every pattern in the tree
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The maximum number of patterns in a leaf bucket
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// The number of patterns in the tree
    pub fn num_items(&self) -> usize {
        self.num_items
    }
}

/// How an internal node divides its patterns between its two children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split<N: Coordinate> {
    pub(crate) axis: usize,
    pub(crate) threshold: N,
    pub(crate) left: usize,
    pub(crate) right: usize,
}

/// A node of the tree arena.
///
/// Every node covers the contiguous range `start..end` of the kd-sorted buffers. Leaves have no
/// split and scan their range directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KDNode<N: Coordinate> {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) split: Option<Split<N>>,
}

impl<N: Coordinate> KDNode<N> {
    pub(crate) fn bucket(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            split: None,
        }
    }
}

/// An immutable k-d tree over a fixed set of patterns.
///
/// Usually this will be created via [`KDTreeBuilder`][crate::kdtree::KDTreeBuilder]. Queries are
/// provided by the [`KDTreeIndex`] trait.
#[derive(Debug)]
pub struct KDTree<N: Coordinate, T> {
    /// interleaved coordinates in kd-sorted order
    pub(crate) coords: Vec<N>,
    /// insertion id of the pattern at each kd-sorted position
    pub(crate) ids: Vec<u32>,
    /// kd-sorted position of each insertion id
    pub(crate) positions: Vec<u32>,
    /// payloads in insertion order
    pub(crate) values: Vec<T>,
    /// node arena, the root is at index 0
    pub(crate) nodes: Vec<KDNode<N>>,
    pub(crate) metadata: KDTreeMetadata,
    pub(crate) tested_patterns: AtomicUsize,
}

impl<N: Coordinate, T> KDTree<N, T> {
    /// Consume the tree, returning the payloads in insertion order.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

impl<N: Coordinate, T: Clone> Clone for KDTree<N, T> {
    fn clone(&self) -> Self {
        Self {
            coords: self.coords.clone(),
            ids: self.ids.clone(),
            positions: self.positions.clone(),
            values: self.values.clone(),
            nodes: self.nodes.clone(),
            metadata: self.metadata,
            tested_patterns: AtomicUsize::new(self.tested_patterns.load(Ordering::Relaxed)),
        }
    }
}

impl<N: Coordinate, T> KDTreeIndex<N, T> for KDTree<N, T> {
    fn coords(&self) -> &[N] {
        &self.coords
    }

    fn ids(&self) -> &[u32] {
        &self.ids
    }

    fn positions(&self) -> &[u32] {
        &self.positions
    }

    fn values(&self) -> &[T] {
        &self.values
    }

    fn nodes(&self) -> &[KDNode<N>] {
        &self.nodes
    }

    fn metadata(&self) -> &KDTreeMetadata {
        &self.metadata
    }

    fn tested_patterns_counter(&self) -> &AtomicUsize {
        &self.tested_patterns
    }
}
