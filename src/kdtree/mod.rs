//! An implementation of an immutable, bucketed K-D Tree for k-nearest-neighbour search.

#![warn(missing_docs)]

mod builder;
mod index;
mod neighbour;
mod r#trait;
mod traversal;

pub use builder::{KDTreeBuilder, DEFAULT_BUCKET_SIZE};
pub use index::{KDNode, KDTree, KDTreeMetadata, Split};
pub use neighbour::{NearestNeighbour, QueryStats};
pub use r#trait::KDTreeIndex;
pub use traversal::Node;
