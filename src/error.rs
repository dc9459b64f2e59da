//! Error type shared by every pipeline stage.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A feature cell is present but not numeric. `row` counts data records from 1.
    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Missing value in column '{column}' at row {row}; drop incomplete rows first")]
    MissingValue { row: usize, column: String },

    #[error("Dataset is empty at stage '{0}'")]
    EmptyDataset(&'static str),

    #[error("Split leaves {train} train and {test} test rows; both must be non-empty")]
    EmptySplit { train: usize, test: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Classification needs at least two distinct labels.
    #[error("Training data contains a single class '{0}'")]
    SingleClass(String),

    #[error("Expected k <= {samples} training samples, got k = {k}")]
    TooFewSamples { k: usize, samples: usize },

    #[error("Model is not fitted")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
