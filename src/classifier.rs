//! The fit/predict/score surface shared by both model families, plus the
//! accuracy metric and label encoding they rely on.

use ndarray::ArrayView2;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::parse::Label;
use crate::split::Split;

pub trait Classifier {
    fn name(&self) -> &'static str;

    fn fit(&mut self, features: ArrayView2<f64>, labels: &[Label]) -> Result<()>;

    fn predict(&self, features: ArrayView2<f64>) -> Result<Vec<Label>>;

    /// Fraction of `labels` reproduced by [`Classifier::predict`].
    fn score(&self, features: ArrayView2<f64>, labels: &[Label]) -> Result<f64> {
        let predictions = self.predict(features)?;
        accuracy(&predictions, labels)
    }
}

pub fn accuracy(predicted: &[Label], truth: &[Label]) -> Result<f64> {
    if predicted.len() != truth.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: truth.len(),
            actual: predicted.len(),
        });
    }

    if truth.is_empty() {
        return Err(PipelineError::EmptyDataset("score"));
    }

    let correct_predictions = predicted
        .iter()
        .zip(truth)
        .filter(|(prediction, label)| prediction == label)
        .count();

    Ok(correct_predictions as f64 / truth.len() as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub test_predictions: Vec<Label>,
}

/// Fits `model` on the train side and scores it on both sides.
pub fn evaluate<C: Classifier + ?Sized>(model: &mut C, split: &Split) -> Result<Evaluation> {
    model.fit(split.train.features.view(), &split.train.labels)?;

    let train_accuracy = model.score(split.train.features.view(), &split.train.labels)?;
    let test_predictions = model.predict(split.test.features.view())?;
    let test_accuracy = accuracy(&test_predictions, &split.test.labels)?;

    info!(
        model = model.name(),
        train_accuracy,
        test_accuracy,
        "evaluated classifier"
    );

    Ok(Evaluation {
        train_accuracy,
        test_accuracy,
        test_predictions,
    })
}

/// Distinct labels in sorted order.
pub fn classes_of(labels: &[Label]) -> Vec<Label> {
    let mut classes = labels.to_vec();
    classes.sort();
    classes.dedup();
    classes
}

/// Position of each label in `classes`, which must be sorted and complete.
pub fn encode(labels: &[Label], classes: &[Label]) -> Vec<usize> {
    labels
        .iter()
        .map(|label| classes.binary_search(label).unwrap_or_default())
        .collect()
}

pub(crate) fn check_samples(features: ArrayView2<f64>, labels: &[Label]) -> Result<()> {
    if features.nrows() != labels.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: features.nrows(),
            actual: labels.len(),
        });
    }

    if labels.is_empty() {
        return Err(PipelineError::EmptyDataset("fit"));
    }

    Ok(())
}

pub(crate) fn check_columns(features: ArrayView2<f64>, expected: usize) -> Result<()> {
    if features.ncols() == expected {
        Ok(())
    } else {
        Err(PipelineError::ShapeMismatch {
            expected,
            actual: features.ncols(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(values: &[&str]) -> Vec<Label> {
        values.iter().copied().map(Label::from).collect()
    }

    #[test]
    fn accuracy_counts_matches() {
        let predicted = labels(&["a", "b", "b", "a"]);
        let truth = labels(&["a", "b", "a", "a"]);

        assert!((accuracy(&predicted, &truth).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn accuracy_rejects_length_mismatch() {
        let error = accuracy(&labels(&["a"]), &labels(&["a", "b"])).unwrap_err();

        assert!(matches!(
            error,
            PipelineError::ShapeMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn accuracy_of_nothing_is_an_error() {
        assert!(accuracy(&[], &[]).is_err());
    }

    #[test]
    fn classes_are_sorted_and_unique() {
        let classes = classes_of(&labels(&["3", "1", "3", "2", "1"]));

        assert_eq!(classes, labels(&["1", "2", "3"]));
        assert_eq!(encode(&labels(&["2", "3", "1"]), &classes), vec![1, 2, 0]);
    }

    #[test]
    fn numerically_equal_labels_share_a_class() {
        let classes = classes_of(&labels(&["1", "1.0", "2", "2.00"]));

        assert_eq!(classes, labels(&["1", "2"]));
        assert_eq!(encode(&labels(&["1.0", "2"]), &classes), vec![0, 1]);
    }
}
