use std::collections::BTreeMap;

#[cfg(feature = "tracing")]
use tracing::{event, Level};

use crate::error::{KnnIndexError, Result};
use crate::kdtree::{KDTree, KDTreeBuilder, KDTreeIndex, NearestNeighbour};
use crate::knn::KnnSettings;
use crate::r#type::Coordinate;

/// The outcome of classifying one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction<C> {
    /// The winning class
    pub class: C,
    /// Share of the vote per training class, in ascending class order. Empty unless
    /// [`KnnSettings::output_class_probabilities`] is set.
    pub probabilities: Vec<(C, f64)>,
}

/// A builder to create a [`KnnClassifier`] from labelled training rows.
///
/// ```
/// use knn_index::knn::{KnnClassifierBuilder, KnnSettings};
///
/// let mut builder = KnnClassifierBuilder::new(1, KnnSettings::new(1).unwrap()).unwrap();
/// builder.add_row(&[Some(0.)], "low").unwrap();
/// builder.add_row(&[Some(10.)], "high").unwrap();
/// let classifier = builder.finish();
///
/// let prediction = classifier.classify(&[Some(8.)]).unwrap().unwrap();
/// assert_eq!(prediction.class, "high");
/// ```
#[derive(Debug, Clone)]
pub struct KnnClassifierBuilder<N: Coordinate, C> {
    builder: KDTreeBuilder<N, C>,
    settings: KnnSettings,
    /// training rows per class, used to break ties
    class_counts: BTreeMap<C, usize>,
    skipped_rows: usize,
}

impl<N: Coordinate, C: Ord + Clone> KnnClassifierBuilder<N, C> {
    /// Create a builder for rows with `dims` features.
    pub fn new(dims: usize, settings: KnnSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            builder: KDTreeBuilder::new(dims)?,
            settings,
            class_counts: BTreeMap::new(),
            skipped_rows: 0,
        })
    }

    /// Set the bucket size of the underlying tree.
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Result<Self> {
        self.builder = self.builder.with_bucket_size(bucket_size)?;
        Ok(self)
    }

    /// Add a training row.
    ///
    /// Rows with a missing feature are skipped and `Ok(false)` is returned.
    pub fn add_row(&mut self, features: &[Option<N>], class: C) -> Result<bool> {
        check_len(features, self.builder.dims())?;

        let Some(features) = complete_features(features) else {
            self.skipped_rows += 1;
            return Ok(false);
        };

        self.builder.add_pattern(&features, class.clone())?;
        *self.class_counts.entry(class).or_insert(0) += 1;
        Ok(true)
    }

    /// The number of training rows skipped because of missing features.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Consume this builder, indexing the training rows.
    pub fn finish(self) -> KnnClassifier<N, C> {
        let tree = self.builder.finish();

        #[cfg(feature = "tracing")]
        {
            if self.skipped_rows > 0 {
                event!(
                    Level::WARN,
                    skipped_rows = self.skipped_rows,
                    "Training data contains missing values, the affected rows are ignored."
                );
            }
            if tree.size() < self.settings.k {
                event!(
                    Level::WARN,
                    patterns = tree.size(),
                    k = self.settings.k,
                    "Fewer training patterns than requested neighbours, every row votes."
                );
            }
        }

        KnnClassifier {
            tree,
            settings: self.settings,
            class_counts: self.class_counts,
        }
    }
}

/// A k-nearest-neighbour classifier over an immutable [`KDTree`].
#[derive(Debug, Clone)]
pub struct KnnClassifier<N: Coordinate, C> {
    tree: KDTree<N, C>,
    settings: KnnSettings,
    class_counts: BTreeMap<C, usize>,
}

impl<N: Coordinate, C: Ord + Clone> KnnClassifier<N, C> {
    /// The tree holding the training rows, with their class as payload.
    pub fn tree(&self) -> &KDTree<N, C> {
        &self.tree
    }

    /// The settings this classifier was built with.
    pub fn settings(&self) -> &KnnSettings {
        &self.settings
    }

    /// Number of training rows per class.
    pub fn class_distribution(&self) -> &BTreeMap<C, usize> {
        &self.class_counts
    }

    /// Classify one row.
    ///
    /// Returns `Ok(None)` if a feature is missing or there is no training data.
    pub fn classify(&self, features: &[Option<N>]) -> Result<Option<Prediction<C>>> {
        check_len(features, self.tree.dims())?;

        let Some(query) = complete_features(features) else {
            return Ok(None);
        };

        let k = self.settings.k.min(self.tree.size());
        if k == 0 {
            return Ok(None);
        }

        let neighbours = self.tree.k_nearest_neighbours(&query, k)?;
        let weights = self.vote(&neighbours);

        // first class reaching the highest weight
        let mut winner = 0;
        for (i, (_, weight)) in weights.iter().enumerate() {
            if *weight > weights[winner].1 {
                winner = i;
            }
        }

        // among equally weighted classes prefer the more frequent training class
        let winner_weight = weights[winner].1;
        for (i, (class, weight)) in weights.iter().enumerate() {
            if *weight == winner_weight
                && self.class_count(weights[winner].0) < self.class_count(class)
            {
                winner = i;
            }
        }

        let probabilities = if self.settings.output_class_probabilities {
            let total: f64 = weights.iter().map(|(_, weight)| weight).sum();
            self.class_counts
                .keys()
                .map(|class| {
                    let weight = weights
                        .iter()
                        .find(|(c, _)| *c == class)
                        .map_or(0.0, |(_, weight)| *weight);
                    (class.clone(), weight / total)
                })
                .collect()
        } else {
            vec![]
        };

        Ok(Some(Prediction {
            class: weights[winner].0.clone(),
            probabilities,
        }))
    }

    /// Accumulate vote weights per class, in order of first appearance among the neighbours.
    fn vote<'a>(&self, neighbours: &[NearestNeighbour<'a, N, C>]) -> Vec<(&'a C, f64)> {
        // exact matches outvote everything else when weighting by distance
        let exact = self.settings.weight_by_distance
            && neighbours.iter().any(|n| n.distance == N::zero());

        let mut weights: Vec<(&'a C, f64)> = Vec::with_capacity(neighbours.len());
        for n in neighbours {
            let weight = if !self.settings.weight_by_distance {
                1.0
            } else if exact {
                if n.distance != N::zero() {
                    continue;
                }
                1.0
            } else {
                1.0 / n.distance.as_f64()
            };

            match weights.iter_mut().find(|(class, _)| *class == n.value) {
                Some((_, total)) => *total += weight,
                None => weights.push((n.value, weight)),
            }
        }
        weights
    }

    fn class_count(&self, class: &C) -> usize {
        self.class_counts.get(class).copied().unwrap_or(0)
    }
}

fn check_len<N>(features: &[Option<N>], dims: usize) -> Result<()> {
    if features.len() != dims {
        return Err(KnnIndexError::DimensionMismatch {
            expected: dims,
            actual: features.len(),
        });
    }
    Ok(())
}

/// The feature values, or `None` if any is missing.
fn complete_features<N: Coordinate>(features: &[Option<N>]) -> Option<Vec<N>> {
    features.iter().copied().collect()
}
