use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KnnIndexError {
    /// A tree needs at least one dimension.
    #[error("Invalid dimensionality {0}, expected at least 1.")]
    InvalidDimensions(usize),

    /// Leaf buckets need room for at least one point.
    #[error("Invalid bucket size {0}, expected at least 1.")]
    InvalidBucketSize(usize),

    /// The number of neighbours in classifier settings must be positive.
    #[error("Invalid number of neighbours {0}, expected at least 1.")]
    InvalidK(usize),

    /// A pattern or query vector does not match the tree's dimensionality.
    #[error("Got a vector with {actual} dimensions when expected {expected}.")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A coordinate was NaN or infinite.
    #[error("Coordinate on axis {axis} is not finite.")]
    NonFiniteCoordinate { axis: usize },

    /// More neighbours were requested than the tree holds.
    #[error("Requested {requested} nearest neighbours but the tree only holds {available} patterns.")]
    TooManyNeighbours { requested: usize, available: usize },

    /// Insertion ids are stored as `u32`.
    #[error("Cannot index more than {0} patterns.")]
    TooManyPoints(usize),
}

pub type Result<T> = std::result::Result<T, KnnIndexError>;
