#![doc = include_str!("../README.md")]

mod error;
pub mod kdtree;
pub mod knn;
mod r#type;

pub use error::{KnnIndexError, Result};
pub use r#type::Coordinate;

#[cfg(test)]
pub(crate) mod test;
