//! k-nearest-neighbour classification on top of the [`KDTree`][crate::kdtree::KDTree].
//!
//! Training rows are indexed with their class as payload. A query row is assigned the class that
//! receives the most votes among its `k` nearest training rows.

mod classifier;
mod settings;

pub use classifier::{KnnClassifier, KnnClassifierBuilder, Prediction};
pub use settings::{KnnSettings, DEFAULT_K};
