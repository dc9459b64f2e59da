use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::parse::{Dataset, Label};

pub const FEATURE_DIVISOR: f64 = 100.0;

pub type LabelVector = Vec<Label>;

/// Scaled features, one row per dataset row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }
}

/// Divides every feature by `divisor` and pulls the labels out alongside.
///
/// Expects a cleaned dataset: any remaining gap is reported as
/// [`PipelineError::MissingValue`].
pub fn scale(dataset: &Dataset, divisor: f64) -> Result<(FeatureMatrix, LabelVector)> {
    if !divisor.is_finite() || divisor == 0.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "feature divisor must be finite and non-zero, got {divisor}"
        )));
    }

    if dataset.is_empty() {
        return Err(PipelineError::EmptyDataset("scale"));
    }

    let columns = dataset.columns().to_vec();
    let mut values = Array2::zeros((dataset.len(), columns.len()));
    let mut labels = Vec::with_capacity(dataset.len());

    for (i, row) in dataset.rows().iter().enumerate() {
        for (j, cell) in row.features.iter().enumerate() {
            let value = cell.ok_or_else(|| PipelineError::MissingValue {
                row: i + 1,
                column: columns[j].clone(),
            })?;

            values[(i, j)] = value / divisor;
        }

        let label = row.label.clone().ok_or_else(|| PipelineError::MissingValue {
            row: i + 1,
            column: crate::parse::LABEL_COLUMN.to_string(),
        })?;
        labels.push(label);
    }

    debug!(rows = values.nrows(), features = values.ncols(), divisor, "scaled features");

    Ok((FeatureMatrix { columns, values }, labels))
}
