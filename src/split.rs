use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::parse::Label;
use crate::scale::FeatureMatrix;

pub const TEST_FRACTION: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Share of rows held out for testing, in (0, 1).
    pub test_fraction: f64,
    pub shuffle: bool,
    /// Fixed seed for a reproducible shuffle; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: TEST_FRACTION,
            shuffle: true,
            seed: None,
        }
    }
}

/// Rows of one side of a split, with their positions in the source matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Subset {
    pub features: Array2<f64>,
    pub labels: Vec<Label>,
    pub indices: Vec<usize>,
}

impl Subset {
    fn select(features: &FeatureMatrix, labels: &[Label], indices: &[usize]) -> Self {
        Self {
            features: features.values().select(Axis(0), indices),
            labels: indices.iter().map(|&i| labels[i].clone()).collect(),
            indices: indices.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Subset,
    pub test: Subset,
}

pub fn is_valid_test_fraction(test_fraction: f64) -> bool {
    test_fraction > 0.0 && test_fraction < 1.0
}

/// Test side gets `ceil(test_fraction * n)` rows, train side the rest.
pub fn test_size(samples: usize, test_fraction: f64) -> usize {
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    let size = (samples as f64 * test_fraction).ceil() as usize;

    size.min(samples)
}

pub fn train_test_split(
    features: &FeatureMatrix,
    labels: &[Label],
    config: &SplitConfig,
) -> Result<Split> {
    if !is_valid_test_fraction(config.test_fraction) {
        return Err(PipelineError::InvalidConfig(format!(
            "test fraction must be in (0, 1), got {}",
            config.test_fraction
        )));
    }

    let samples = features.nrows();
    if labels.len() != samples {
        return Err(PipelineError::ShapeMismatch {
            expected: samples,
            actual: labels.len(),
        });
    }

    let test_count = test_size(samples, config.test_fraction);
    let train_count = samples - test_count;
    if train_count == 0 || test_count == 0 {
        return Err(PipelineError::EmptySplit {
            train: train_count,
            test: test_count,
        });
    }

    let mut indices: Vec<usize> = (0..samples).collect();

    let (train_indices, test_indices) = if config.shuffle {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        indices.shuffle(&mut rng);

        let (test, train) = indices.split_at(test_count);
        (train, test)
    } else {
        indices.split_at(train_count)
    };

    info!(
        train = train_indices.len(),
        test = test_indices.len(),
        shuffled = config.shuffle,
        "split dataset"
    );

    Ok(Split {
        train: Subset::select(features, labels, train_indices),
        test: Subset::select(features, labels, test_indices),
    })
}
