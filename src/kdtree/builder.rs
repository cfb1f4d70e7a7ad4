use std::cmp;
use std::sync::atomic::AtomicUsize;

#[cfg(feature = "tracing")]
use tracing::{event, Level};

use crate::error::{KnnIndexError, Result};
use crate::kdtree::index::{KDNode, KDTreeMetadata, Split};
use crate::kdtree::KDTree;
use crate::r#type::Coordinate;

/// Leaf capacity used when none is configured.
pub const DEFAULT_BUCKET_SIZE: usize = 10;

/// A builder to create a [`KDTree`].
///
/// Patterns are accumulated with [`add_pattern`][Self::add_pattern] and the tree is built either
/// by consuming the builder with [`finish`][Self::finish], or from a snapshot with
/// [`build_tree`][Self::build_tree], which leaves the builder usable for further patterns.
///
/// ```
/// use knn_index::kdtree::{KDTreeBuilder, KDTreeIndex};
///
/// let mut builder = KDTreeBuilder::<f64, &str>::new(2).unwrap();
/// builder.add_pattern(&[0., 0.], "A").unwrap();
/// builder.add_pattern(&[10., 10.], "B").unwrap();
/// builder.add_pattern(&[1., 1.], "C").unwrap();
/// let tree = builder.finish();
///
/// let nearest = tree.k_nearest_neighbours(&[0., 0.], 2).unwrap();
/// let values: Vec<_> = nearest.iter().map(|n| *n.value).collect();
/// assert_eq!(values, vec!["A", "C"]);
/// ```
#[derive(Debug, Clone)]
pub struct KDTreeBuilder<N: Coordinate, T> {
    /// interleaved coordinates in insertion order
    coords: Vec<N>,
    values: Vec<T>,

    dims: usize,
    bucket_size: usize,
}

impl<N: Coordinate, T> KDTreeBuilder<N, T> {
    /// Create a new builder for patterns with `dims` coordinates and the default bucket size.
    pub fn new(dims: usize) -> Result<Self> {
        Self::with_capacity(dims, 0)
    }

    /// Create a new builder with room for `num_items` patterns before reallocating.
    pub fn with_capacity(dims: usize, num_items: usize) -> Result<Self> {
        if dims == 0 {
            return Err(KnnIndexError::InvalidDimensions(dims));
        }

        Ok(Self {
            coords: Vec::with_capacity(num_items * dims),
            values: Vec::with_capacity(num_items),
            dims,
            bucket_size: DEFAULT_BUCKET_SIZE,
        })
    }

    /// Set the maximum number of patterns stored in a leaf bucket.
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Result<Self> {
        if bucket_size == 0 {
            return Err(KnnIndexError::InvalidBucketSize(bucket_size));
        }
        self.bucket_size = bucket_size;
        Ok(self)
    }

    /// The dimensionality every pattern must have.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The configured leaf bucket size.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// The number of patterns added so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no pattern has been added yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add a pattern to the index, returning its insertion id.
    pub fn add_pattern(&mut self, coords: &[N], value: T) -> Result<u32> {
        check_vector(coords, self.dims)?;

        let id = self.values.len();
        if id >= u32::MAX as usize {
            return Err(KnnIndexError::TooManyPoints(u32::MAX as usize));
        }

        self.coords.extend_from_slice(coords);
        self.values.push(value);

        Ok(id as u32)
    }

    /// Build a tree over all patterns added so far without consuming the builder.
    pub fn build_tree(&self) -> KDTree<N, T>
    where
        T: Clone,
    {
        build(
            self.coords.clone(),
            self.values.clone(),
            self.dims,
            self.bucket_size,
        )
    }

    /// Consume this builder, performing the k-d sort and generating a KDTree ready for queries.
    pub fn finish(self) -> KDTree<N, T> {
        build(self.coords, self.values, self.dims, self.bucket_size)
    }
}

/// Validate the length and finiteness of a pattern or query vector.
pub(crate) fn check_vector<N: Coordinate>(coords: &[N], dims: usize) -> Result<()> {
    if coords.len() != dims {
        return Err(KnnIndexError::DimensionMismatch {
            expected: dims,
            actual: coords.len(),
        });
    }
    if let Some(axis) = coords.iter().position(|c| !c.is_finite()) {
        return Err(KnnIndexError::NonFiniteCoordinate { axis });
    }
    Ok(())
}

fn build<N: Coordinate, T>(
    mut coords: Vec<N>,
    values: Vec<T>,
    dims: usize,
    bucket_size: usize,
) -> KDTree<N, T> {
    let num_items = values.len();
    debug_assert_eq!(coords.len(), num_items * dims);

    let mut ids: Vec<u32> = (0..num_items as u32).collect();
    let mut nodes = Vec::new();

    if num_items == 0 {
        nodes.push(KDNode::bucket(0, 0));
    } else {
        // kd-sort both arrays for efficient search
        sort(
            &mut nodes,
            &mut ids,
            &mut coords,
            dims,
            bucket_size,
            0,
            num_items - 1,
        );
    }

    let mut positions = vec![0u32; num_items];
    for (pos, &id) in ids.iter().enumerate() {
        positions[id as usize] = pos as u32;
    }

    #[cfg(feature = "tracing")]
    event!(
        Level::DEBUG,
        num_items,
        dims,
        bucket_size,
        num_nodes = nodes.len(),
        coord_type = N::TYPE_NAME,
        "Built k-d tree"
    );

    KDTree {
        coords,
        ids,
        positions,
        values,
        nodes,
        metadata: KDTreeMetadata {
            dims,
            bucket_size,
            num_items,
        },
        tested_patterns: AtomicUsize::new(0),
    }
}

/// Recursively kd-sort the inclusive range `left..=right`, appending its nodes to `nodes`.
///
/// Returns the index of the node covering the range.
fn sort<N: Coordinate>(
    nodes: &mut Vec<KDNode<N>>,
    ids: &mut [u32],
    coords: &mut [N],
    dims: usize,
    bucket_size: usize,
    left: usize,
    right: usize,
) -> usize {
    let node_index = nodes.len();
    nodes.push(KDNode::bucket(left, right + 1));

    if right - left < bucket_size {
        return node_index;
    }

    let axis = widest_axis(coords, dims, left, right);

    // first index of the upper half; both halves are non-empty
    let m = (left + right + 1) >> 1;

    // sort ids and coords around the middle index so that the lower half lies below the
    // threshold and the upper half above it on the chosen axis
    select(ids, coords, dims, m, left, right, axis);
    let threshold = coords[dims * m + axis];

    let left_child = sort(nodes, ids, coords, dims, bucket_size, left, m - 1);
    let right_child = sort(nodes, ids, coords, dims, bucket_size, m, right);

    nodes[node_index].split = Some(Split {
        axis,
        threshold,
        left: left_child,
        right: right_child,
    });

    node_index
}

/// The axis with the largest spread (max - min) among the items in `left..=right`.
fn widest_axis<N: Coordinate>(coords: &[N], dims: usize, left: usize, right: usize) -> usize {
    let mut best_axis = 0;
    let mut best_spread = N::neg_infinity();

    for axis in 0..dims {
        let mut min = N::infinity();
        let mut max = N::neg_infinity();
        for i in left..=right {
            let c = coords[dims * i + axis];
            min = min.min(c);
            max = max.max(c);
        }
        let spread = max - min;
        if spread > best_spread {
            best_spread = spread;
            best_axis = axis;
        }
    }

    best_axis
}

/// Custom Floyd-Rivest selection algorithm: sort ids and coords so that [left..k-1] items are
/// not larger than the k-th item on `axis` and [k+1..right] items are not smaller.
#[inline]
fn select<N: Coordinate>(
    ids: &mut [u32],
    coords: &mut [N],
    dims: usize,
    k: usize,
    mut left: usize,
    mut right: usize,
    axis: usize,
) {
    while right > left {
        if right - left > 600 {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = f64::ln(n);
            let s = 0.5 * f64::exp((2.0 * z) / 3.0);
            let sd = 0.5
                * f64::sqrt((z * s * (n - s)) / n)
                * (if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 });
            let new_left = cmp::max(left, f64::floor(k as f64 - (m * s) / n + sd) as usize);
            let new_right = cmp::min(
                right,
                f64::floor(k as f64 + ((n - m) * s) / n + sd) as usize,
            );
            select(ids, coords, dims, k, new_left, new_right, axis);
        }

        let t = coords[dims * k + axis];
        let mut i = left;
        let mut j = right;

        swap_item(ids, coords, dims, left, k);
        if coords[dims * right + axis] > t {
            swap_item(ids, coords, dims, left, right);
        }

        while i < j {
            swap_item(ids, coords, dims, i, j);
            i += 1;
            j -= 1;
            while coords[dims * i + axis] < t {
                i += 1;
            }
            while coords[dims * j + axis] > t {
                j -= 1;
            }
        }

        if coords[dims * left + axis] == t {
            swap_item(ids, coords, dims, left, j);
        } else {
            j += 1;
            swap_item(ids, coords, dims, j, right);
        }

        if j <= k {
            left = j + 1;
        }
        if k <= j {
            right = j - 1;
        }
    }
}

#[inline]
fn swap_item<N: Coordinate>(ids: &mut [u32], coords: &mut [N], dims: usize, i: usize, j: usize) {
    if i == j {
        return;
    }
    ids.swap(i, j);
    for d in 0..dims {
        coords.swap(dims * i + d, dims * j + d);
    }
}
