use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tinyvec::TinyVec;

use crate::error::{KnnIndexError, Result};
use crate::kdtree::builder::check_vector;
use crate::kdtree::neighbour::Candidate;
use crate::kdtree::{KDNode, KDTreeMetadata, NearestNeighbour, Node, QueryStats};
use crate::r#type::{sq_dist, Coordinate};

/// A trait for searching and accessing data out of a KDTree.
pub trait KDTreeIndex<N: Coordinate, T>: Sized {
    /// The underlying interleaved coordinate buffer of this tree, in kd-sorted order
    fn coords(&self) -> &[N];

    /// The insertion id of the pattern at each kd-sorted position
    fn ids(&self) -> &[u32];

    /// The kd-sorted position of each insertion id
    fn positions(&self) -> &[u32];

    /// The payloads of this tree, in insertion order
    fn values(&self) -> &[T];

    /// The node arena of this tree. The root is at index 0.
    fn nodes(&self) -> &[KDNode<N>];

    /// Access the metadata describing this KDTree
    fn metadata(&self) -> &KDTreeMetadata;

    /// Counter recording how many patterns the most recent query tested
    fn tested_patterns_counter(&self) -> &AtomicUsize;

    /// The number of patterns in this KDTree
    fn size(&self) -> usize {
        self.metadata().num_items()
    }

    /// Returns `true` if the tree holds no patterns.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The dimensionality of this KDTree
    fn dims(&self) -> usize {
        self.metadata().dims()
    }

    /// The leaf bucket size of this KDTree
    fn bucket_size(&self) -> usize {
        self.metadata().bucket_size()
    }

    /// The number of patterns whose distance was computed by the most recent query.
    ///
    /// When several threads query the same tree this reports whichever query finished last.
    fn tested_patterns(&self) -> usize {
        self.tested_patterns_counter().load(Ordering::Relaxed)
    }

    /// Coordinates and payload of the pattern with the given insertion id.
    fn get(&self, id: u32) -> Option<(&[N], &T)> {
        let dims = self.dims();
        let pos = *self.positions().get(id as usize)? as usize;
        let value = self.values().get(id as usize)?;
        Some((&self.coords()[dims * pos..dims * (pos + 1)], value))
    }

    /// Search the `k` patterns closest to `query`.
    ///
    /// Results are sorted by ascending Euclidean distance. Requesting more neighbours than the
    /// tree holds is an error.
    fn k_nearest_neighbours(
        &self,
        query: &[N],
        k: usize,
    ) -> Result<Vec<NearestNeighbour<'_, N, T>>> {
        self.k_nearest_neighbours_with_stats(query, k)
            .map(|(result, _)| result)
    }

    /// Search the `k` patterns closest to `query`, also reporting how many patterns were tested.
    fn k_nearest_neighbours_with_stats(
        &self,
        query: &[N],
        k: usize,
    ) -> Result<(Vec<NearestNeighbour<'_, N, T>>, QueryStats)> {
        let dims = self.dims();
        check_vector(query, dims)?;

        let available = self.size();
        if k > available {
            return Err(KnnIndexError::TooManyNeighbours {
                requested: k,
                available,
            });
        }
        if k == 0 {
            self.tested_patterns_counter().store(0, Ordering::Relaxed);
            return Ok((vec![], QueryStats::default()));
        }

        let coords = self.coords();
        let nodes = self.nodes();

        // bounded max-heap, the current k-th best candidate is on top
        let mut heap: BinaryHeap<Candidate<N>> = BinaryHeap::with_capacity(k);
        let mut tested_patterns = 0;

        // Use TinyVec to avoid heap allocations
        // Entries are a node index and a lower bound on the squared distance to its patterns
        let mut stack: TinyVec<[(usize, N); 32]> = TinyVec::new();
        stack.push((0, N::zero()));

        while let Some((node_index, bound)) = stack.pop() {
            if heap.len() == k && heap.peek().is_some_and(|worst| bound >= worst.dist) {
                continue;
            }

            let node = &nodes[node_index];
            match node.split {
                None => {
                    for pos in node.start..node.end {
                        let dist = sq_dist(&coords[dims * pos..dims * (pos + 1)], query);
                        tested_patterns += 1;

                        if heap.len() < k {
                            heap.push(Candidate { pos, dist });
                        } else if let Some(mut worst) = heap.peek_mut() {
                            if dist < worst.dist {
                                *worst = Candidate { pos, dist };
                            }
                        }
                    }
                }
                Some(split) => {
                    let diff = query[split.axis] - split.threshold;
                    let (near, far) = if diff < N::zero() {
                        (split.left, split.right)
                    } else {
                        (split.right, split.left)
                    };

                    // Note: the far side is pushed first so the near side is popped first
                    stack.push((far, bound.max(diff * diff)));
                    stack.push((near, bound));
                }
            }
        }

        self.tested_patterns_counter()
            .store(tested_patterns, Ordering::Relaxed);

        let ids = self.ids();
        let values = self.values();
        let result = heap
            .into_sorted_vec()
            .into_iter()
            .map(|candidate| {
                let id = ids[candidate.pos];
                NearestNeighbour {
                    distance: candidate.dist.sqrt(),
                    id,
                    value: &values[id as usize],
                }
            })
            .collect();

        Ok((result, QueryStats { tested_patterns }))
    }

    /// Answer a batch of k-nearest-neighbour queries in parallel.
    #[cfg(feature = "rayon")]
    fn par_k_nearest_neighbours<Q>(
        &self,
        queries: &[Q],
        k: usize,
    ) -> Result<Vec<Vec<NearestNeighbour<'_, N, T>>>>
    where
        Self: Sync,
        T: Sync,
        Q: AsRef<[N]> + Sync,
    {
        queries
            .par_iter()
            .map(|query| self.k_nearest_neighbours(query.as_ref(), k))
            .collect()
    }

    /// Search the index for patterns within a given radius of `query`.
    ///
    /// Results are sorted by ascending distance. A negative radius finds nothing.
    fn within(&self, query: &[N], radius: N) -> Result<Vec<NearestNeighbour<'_, N, T>>> {
        let dims = self.dims();
        check_vector(query, dims)?;
        if radius < N::zero() || self.is_empty() {
            return Ok(vec![]);
        }

        let coords = self.coords();
        let nodes = self.nodes();
        let r2 = radius * radius;

        let mut found: Vec<Candidate<N>> = vec![];
        let mut tested_patterns = 0;

        let mut stack: TinyVec<[(usize, N); 32]> = TinyVec::new();
        stack.push((0, N::zero()));

        while let Some((node_index, bound)) = stack.pop() {
            if bound > r2 {
                continue;
            }

            let node = &nodes[node_index];
            match node.split {
                None => {
                    for pos in node.start..node.end {
                        let dist = sq_dist(&coords[dims * pos..dims * (pos + 1)], query);
                        tested_patterns += 1;
                        if dist <= r2 {
                            found.push(Candidate { pos, dist });
                        }
                    }
                }
                Some(split) => {
                    let diff = query[split.axis] - split.threshold;
                    let plane = bound.max(diff * diff);
                    if diff < N::zero() {
                        stack.push((split.left, bound));
                        stack.push((split.right, plane));
                    } else {
                        stack.push((split.left, plane));
                        stack.push((split.right, bound));
                    }
                }
            }
        }

        self.tested_patterns_counter()
            .store(tested_patterns, Ordering::Relaxed);

        found.sort_unstable();

        let ids = self.ids();
        let values = self.values();
        Ok(found
            .into_iter()
            .map(|candidate| {
                let id = ids[candidate.pos];
                NearestNeighbour {
                    distance: candidate.dist.sqrt(),
                    id,
                    value: &values[id as usize],
                }
            })
            .collect())
    }

    /// Search the index for patterns inside an axis-aligned box, bounds inclusive.
    ///
    /// Returns insertion ids of found patterns, in no particular order.
    fn range(&self, min: &[N], max: &[N]) -> Result<Vec<u32>> {
        let dims = self.dims();
        check_vector(min, dims)?;
        check_vector(max, dims)?;

        let coords = self.coords();
        let ids = self.ids();
        let nodes = self.nodes();

        let mut result: Vec<u32> = vec![];

        let mut stack: TinyVec<[usize; 32]> = TinyVec::new();
        stack.push(0);

        // recursively search for items in range in the kd-sorted arrays
        while let Some(node_index) = stack.pop() {
            let node = &nodes[node_index];
            match node.split {
                None => {
                    for pos in node.start..node.end {
                        let point = &coords[dims * pos..dims * (pos + 1)];
                        let inside = point
                            .iter()
                            .zip(min.iter().zip(max))
                            .all(|(c, (lo, hi))| c >= lo && c <= hi);
                        if inside {
                            result.push(ids[pos]);
                        }
                    }
                }
                Some(split) => {
                    // queue search in halves that intersect the query
                    if min[split.axis] <= split.threshold {
                        stack.push(split.left);
                    }
                    if max[split.axis] >= split.threshold {
                        stack.push(split.right);
                    }
                }
            }
        }

        Ok(result)
    }

    /// Access the root node of the KDTree for manual traversal.
    fn root(&self) -> Node<'_, N, T, Self> {
        Node::from_root(self)
    }
}
