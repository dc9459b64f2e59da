//! Load, clean, scale, split, fit and score in one call.

use std::path::PathBuf;
use tracing::info;

use crate::classifier::evaluate;
use crate::error::{PipelineError, Result};
use crate::knn::{KNearestNeighbors, NEIGHBORS};
use crate::logistic_regression::{LogisticRegression, LogisticRegressionConfig};
use crate::parse::Dataset;
use crate::report::Report;
use crate::scale::{scale, FEATURE_DIVISOR};
use crate::split::{is_valid_test_fraction, train_test_split, SplitConfig};

pub const DEFAULT_DATA_PATH: &str = "data/all-[vision7]-new.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    /// Every feature is divided by this before fitting.
    pub feature_divisor: f64,
    pub split: SplitConfig,
    pub logistic: LogisticRegressionConfig,
    pub neighbors: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            feature_divisor: FEATURE_DIVISOR,
            split: SplitConfig::default(),
            logistic: LogisticRegressionConfig::default(),
            neighbors: NEIGHBORS,
        }
    }
}

impl Config {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_feature_divisor(mut self, divisor: f64) -> Self {
        self.feature_divisor = divisor;
        self
    }

    #[must_use]
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.split.test_fraction = test_fraction;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.split.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.split.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    #[must_use]
    pub fn with_logistic(mut self, logistic: LogisticRegressionConfig) -> Self {
        self.logistic = logistic;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid =
            |message: String| -> Result<()> { Err(PipelineError::InvalidConfig(message)) };

        if !self.feature_divisor.is_finite() || self.feature_divisor == 0.0 {
            return invalid(format!(
                "feature divisor must be finite and non-zero, got {}",
                self.feature_divisor
            ));
        }
        if !is_valid_test_fraction(self.split.test_fraction) {
            return invalid(format!(
                "test fraction must be in (0, 1), got {}",
                self.split.test_fraction
            ));
        }
        if self.neighbors == 0 {
            return invalid("number of neighbors must be at least 1".to_string());
        }
        if !(self.logistic.c.is_finite() && self.logistic.c > 0.0) {
            return invalid(format!(
                "inverse regularisation C must be positive, got {}",
                self.logistic.c
            ));
        }
        if self.logistic.max_iter == 0 {
            return invalid("max_iter must be at least 1".to_string());
        }
        if self.logistic.tol.is_nan() || self.logistic.tol <= 0.0 {
            return invalid(format!("tol must be positive, got {}", self.logistic.tol));
        }

        Ok(())
    }
}

pub fn run(config: &Config) -> Result<Report> {
    config.validate()?;

    let table = Dataset::from_path(&config.data_path)?;
    let cleaned = table.clone().drop_missing();
    let rows_dropped = table.len() - cleaned.len();

    let (features, labels) = scale(&cleaned, config.feature_divisor)?;
    let split = train_test_split(&features, &labels, &config.split)?;

    let mut logistic = LogisticRegression::new(config.logistic);
    let logistic_evaluation = evaluate(&mut logistic, &split)?;

    let mut knn = KNearestNeighbors::new(config.neighbors);
    let knn_evaluation = evaluate(&mut knn, &split)?;

    let (Some(coefficients), Some(intercepts)) = (logistic.coefficients(), logistic.intercepts())
    else {
        return Err(PipelineError::NotFitted);
    };

    info!(
        logistic_test_accuracy = logistic_evaluation.test_accuracy,
        knn_test_accuracy = knn_evaluation.test_accuracy,
        "pipeline finished"
    );

    Ok(Report {
        rows_dropped,
        train_size: split.train.len(),
        test_size: split.test.len(),
        feature_columns: features.columns().to_vec(),
        classes: logistic.classes().to_vec(),
        coefficients: coefficients.clone(),
        intercepts: intercepts.clone(),
        logistic_iterations: logistic.n_iter(),
        logistic: logistic_evaluation,
        neighbors: knn.k(),
        knn: knn_evaluation,
        table,
    })
}
