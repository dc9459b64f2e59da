//! k-nearest-neighbours classification with uniform votes.

use ndarray::{Array2, ArrayView1, ArrayView2};
use tracing::debug;

use crate::classifier::{check_columns, check_samples, classes_of, encode, Classifier};
use crate::error::{PipelineError, Result};
use crate::parse::Label;

pub const NEIGHBORS: usize = 2;

#[derive(Debug, Clone)]
pub struct KNearestNeighbors {
    k: usize,
    samples: Option<Array2<f64>>,
    targets: Vec<usize>,
    classes: Vec<Label>,
}

impl KNearestNeighbors {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            samples: None,
            targets: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    /// Share of the `k` neighbours voting for each class, columns ordered as
    /// [`KNearestNeighbors::classes`].
    pub fn predict_proba(&self, features: ArrayView2<f64>) -> Result<Array2<f64>> {
        let samples = self.fitted_samples(features)?;

        let mut probabilities = Array2::zeros((features.nrows(), self.classes.len()));
        for (mut row, point) in probabilities.rows_mut().into_iter().zip(features.rows()) {
            let votes = self.votes(samples, point);
            for (probability, count) in row.iter_mut().zip(votes) {
                *probability = count as f64 / self.k as f64;
            }
        }

        Ok(probabilities)
    }

    fn fitted_samples(&self, features: ArrayView2<f64>) -> Result<&Array2<f64>> {
        let samples = self.samples.as_ref().ok_or(PipelineError::NotFitted)?;
        check_columns(features, samples.ncols())?;
        Ok(samples)
    }

    /// Training indices of the `k` closest samples. Equal distances keep
    /// training order.
    fn nearest(&self, samples: &Array2<f64>, point: ArrayView1<f64>) -> Vec<usize> {
        let mut distances: Vec<(f64, usize)> = samples
            .rows()
            .into_iter()
            .enumerate()
            .map(|(index, sample)| (euclidean_distance(sample, point), index))
            .collect();

        distances.sort_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)));
        distances.truncate(self.k);

        distances.into_iter().map(|(_, index)| index).collect()
    }

    fn votes(&self, samples: &Array2<f64>, point: ArrayView1<f64>) -> Vec<usize> {
        let mut votes = vec![0; self.classes.len()];
        for index in self.nearest(samples, point) {
            votes[self.targets[index]] += 1;
        }
        votes
    }
}

impl Classifier for KNearestNeighbors {
    fn name(&self) -> &'static str {
        "k-nearest neighbors"
    }

    fn fit(&mut self, features: ArrayView2<f64>, labels: &[Label]) -> Result<()> {
        check_samples(features, labels)?;

        if self.k == 0 {
            return Err(PipelineError::InvalidConfig(
                "number of neighbors must be at least 1".to_string(),
            ));
        }

        if self.k > features.nrows() {
            return Err(PipelineError::TooFewSamples {
                k: self.k,
                samples: features.nrows(),
            });
        }

        self.classes = classes_of(labels);
        self.targets = encode(labels, &self.classes);
        self.samples = Some(features.to_owned());

        debug!(
            samples = features.nrows(),
            classes = self.classes.len(),
            k = self.k,
            "stored training samples"
        );

        Ok(())
    }

    /// Majority vote; a tied vote goes to the class that sorts first.
    fn predict(&self, features: ArrayView2<f64>) -> Result<Vec<Label>> {
        let samples = self.fitted_samples(features)?;

        Ok(features
            .rows()
            .into_iter()
            .map(|point| {
                let votes = self.votes(samples, point);
                let winner = votes
                    .iter()
                    .enumerate()
                    .fold((0, 0), |best, (class, &count)| {
                        if count > best.1 {
                            (class, count)
                        } else {
                            best
                        }
                    })
                    .0;
                self.classes[winner].clone()
            })
            .collect())
    }
}

fn euclidean_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(left, right)| {
            let difference = left - right;
            difference * difference
        })
        .sum::<f64>()
        .sqrt()
}
