use crate::error::{KnnIndexError, Result};

/// Number of neighbours used when none is configured.
pub const DEFAULT_K: usize = 3;

/// Settings of a [`KnnClassifier`][crate::knn::KnnClassifier].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KnnSettings {
    /// Number of nearest neighbours that vote on a class.
    pub k: usize,
    /// Weight each vote by the inverse distance of the neighbour instead of counting it once.
    pub weight_by_distance: bool,
    /// Report the share of the vote each class received.
    pub output_class_probabilities: bool,
}

impl Default for KnnSettings {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            weight_by_distance: false,
            output_class_probabilities: false,
        }
    }
}

impl KnnSettings {
    /// Settings voting among `k` neighbours, other options at their defaults.
    pub fn new(k: usize) -> Result<Self> {
        let settings = Self {
            k,
            ..Default::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Enable or disable inverse distance weighting.
    pub fn with_weight_by_distance(mut self, weight_by_distance: bool) -> Self {
        self.weight_by_distance = weight_by_distance;
        self
    }

    /// Enable or disable class probabilities in predictions.
    pub fn with_class_probabilities(mut self, output_class_probabilities: bool) -> Self {
        self.output_class_probabilities = output_class_probabilities;
        self
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(KnnIndexError::InvalidK(self.k));
        }
        Ok(())
    }
}
