//! Query result records.

use std::cmp::Ordering;

use crate::r#type::Coordinate;

/// A pattern found by a nearest neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestNeighbour<'a, N: Coordinate, T> {
    /// Euclidean distance from the query point
    pub distance: N,
    /// insertion id of the pattern
    pub id: u32,
    /// payload stored with the pattern
    pub value: &'a T,
}

impl<'a, N: Coordinate, T> From<NearestNeighbour<'a, N, T>> for (N, &'a T) {
    fn from(elem: NearestNeighbour<'a, N, T>) -> Self {
        (elem.distance, elem.value)
    }
}

/// Diagnostics about a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// number of patterns whose distance to the query was computed
    pub tested_patterns: usize,
}

/// A wrapper around a kd-sorted position and its squared distance for use in the bounded
/// max-heap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate<N: Coordinate> {
    pub(crate) pos: usize,
    pub(crate) dist: N,
}

impl<N: Coordinate> Eq for Candidate<N> {}

impl<N: Coordinate> Ord for Candidate<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Coordinates are validated as finite, so distances are never NaN
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
    }
}

impl<N: Coordinate> PartialOrd for Candidate<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    #[test]
    fn heap_keeps_farthest_on_top() {
        let mut heap = BinaryHeap::new();
        heap.push(Candidate { pos: 0, dist: 2.0 });
        heap.push(Candidate { pos: 1, dist: 5.0 });
        heap.push(Candidate { pos: 2, dist: 1.0 });

        assert_eq!(heap.peek().map(|c| c.pos), Some(1));

        let sorted: Vec<_> = heap.into_sorted_vec().iter().map(|c| c.pos).collect();
        assert_eq!(sorted, vec![2, 0, 1]);
    }

    #[test]
    fn neighbour_into_tuple() {
        let value = "x";
        let nn = NearestNeighbour {
            distance: 1.5f64,
            id: 3,
            value: &value,
        };
        let (distance, v): (f64, &&str) = nn.into();
        assert_eq!(distance, 1.5);
        assert_eq!(*v, "x");
    }
}
