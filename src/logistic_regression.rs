use nalgebra::DVector;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use tracing::{info, warn};

use crate::classifier::{check_columns, check_samples, classes_of, encode, Classifier};
use crate::error::{PipelineError, Result};
use crate::newton_cg::{NewtonCg, Objective};
use crate::parse::Label;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticRegressionConfig {
    /// Inverse L2 regularisation strength.
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
        }
    }
}

/// Multinomial (softmax) logistic regression with an unpenalised intercept,
/// fitted by Newton-CG.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    config: LogisticRegressionConfig,
    classes: Vec<Label>,
    coefficients: Option<Array2<f64>>,
    intercepts: Option<Array1<f64>>,
    n_iter: usize,
}

impl LogisticRegression {
    pub fn new(config: LogisticRegressionConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            coefficients: None,
            intercepts: None,
            n_iter: 0,
        }
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    /// One row of weights per class, one column per feature.
    pub fn coefficients(&self) -> Option<&Array2<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercepts(&self) -> Option<&Array1<f64>> {
        self.intercepts.as_ref()
    }

    /// Newton iterations used by the last fit.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Class probabilities, columns ordered as [`LogisticRegression::classes`].
    pub fn predict_proba(&self, features: ArrayView2<f64>) -> Result<Array2<f64>> {
        let (Some(coefficients), Some(intercepts)) = (&self.coefficients, &self.intercepts) else {
            return Err(PipelineError::NotFitted);
        };
        check_columns(features, coefficients.ncols())?;

        Ok(softmax_rows(linear_scores(features, coefficients, intercepts)))
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "logistic regression"
    }

    fn fit(&mut self, features: ArrayView2<f64>, labels: &[Label]) -> Result<()> {
        check_samples(features, labels)?;

        let classes = classes_of(labels);
        if classes.len() < 2 {
            return Err(PipelineError::SingleClass(classes[0].to_string()));
        }

        let targets = encode(labels, &classes);
        let loss = SoftmaxLoss {
            features,
            targets: &targets,
            n_classes: classes.len(),
            l2_strength: 1.0 / (self.config.c * features.nrows() as f64),
        };

        let solver = NewtonCg::new(self.config.max_iter, self.config.tol);
        let solution = solver.minimize(&loss, DVector::zeros(loss.n_params()));

        if solution.converged {
            info!(iterations = solution.iterations, "logistic regression converged");
        } else {
            warn!(
                iterations = solution.iterations,
                "newton-cg did not converge; keeping best-effort coefficients"
            );
        }

        let (coefficients, intercepts) = loss.unpack(&solution.params);
        self.classes = classes;
        self.coefficients = Some(coefficients);
        self.intercepts = Some(intercepts);
        self.n_iter = solution.iterations;

        Ok(())
    }

    fn predict(&self, features: ArrayView2<f64>) -> Result<Vec<Label>> {
        let probabilities = self.predict_proba(features)?;

        Ok(probabilities
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row.iter().copied())].clone())
            .collect())
    }
}

/// Index of the first maximum.
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best_index = 0;
    let mut best_value = f64::NEG_INFINITY;

    for (index, value) in values.enumerate() {
        if value > best_value {
            best_index = index;
            best_value = value;
        }
    }

    best_index
}

/// `X W^T + b`, one row per sample and one column per class.
fn linear_scores(
    features: ArrayView2<f64>,
    coefficients: &Array2<f64>,
    intercepts: &Array1<f64>,
) -> Array2<f64> {
    let mut scores = features.dot(&coefficients.t());
    scores += intercepts;
    scores
}

fn softmax_rows(mut scores: Array2<f64>) -> Array2<f64> {
    for mut row in scores.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |current, &value| current.max(value));
        row.mapv_inplace(|value| (value - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    scores
}

/// Mean cross-entropy of the softmax model plus `l2_strength / 2 * ||W||^2`.
///
/// Parameters are packed class by class: the class's feature weights
/// followed by its intercept.
struct SoftmaxLoss<'f, 't> {
    features: ArrayView2<'f, f64>,
    targets: &'t [usize],
    n_classes: usize,
    l2_strength: f64,
}

impl SoftmaxLoss<'_, '_> {
    fn stride(&self) -> usize {
        self.features.ncols() + 1
    }

    fn n_params(&self) -> usize {
        self.n_classes * self.stride()
    }

    fn unpack(&self, params: &DVector<f64>) -> (Array2<f64>, Array1<f64>) {
        let stride = self.stride();
        let n_features = self.features.ncols();

        let weights = Array2::from_shape_fn((self.n_classes, n_features), |(class, feature)| {
            params[class * stride + feature]
        });
        let intercepts =
            Array1::from_shape_fn(self.n_classes, |class| params[class * stride + n_features]);

        (weights, intercepts)
    }

    fn pack(&self, weights: &Array2<f64>, intercepts: &Array1<f64>) -> DVector<f64> {
        let stride = self.stride();
        let n_features = self.features.ncols();

        DVector::from_fn(self.n_params(), |index, _| {
            let (class, position) = (index / stride, index % stride);
            if position == n_features {
                intercepts[class]
            } else {
                weights[(class, position)]
            }
        })
    }

    fn probabilities(&self, weights: &Array2<f64>, intercepts: &Array1<f64>) -> Array2<f64> {
        softmax_rows(linear_scores(self.features, weights, intercepts))
    }

    /// Gradient of the data term for per-class sample residuals `r`, plus the
    /// penalty gradient `l2 * penalised`.
    fn backpropagate(&self, residuals: &Array2<f64>, penalised: &Array2<f64>) -> DVector<f64> {
        let n_samples = self.features.nrows() as f64;

        let weights = residuals.t().dot(&self.features) / n_samples + self.l2_strength * penalised;
        let intercepts = residuals.sum_axis(Axis(0)) / n_samples;

        self.pack(&weights, &intercepts)
    }
}

impl Objective for SoftmaxLoss<'_, '_> {
    fn value(&self, params: &DVector<f64>) -> f64 {
        let (weights, intercepts) = self.unpack(params);
        let scores = linear_scores(self.features, &weights, &intercepts);

        let cross_entropy: f64 = scores
            .rows()
            .into_iter()
            .zip(self.targets)
            .map(|(row, &target)| {
                let max = row.fold(f64::NEG_INFINITY, |current, &value| current.max(value));
                let log_sum_exp = max + row.mapv(|value| (value - max).exp()).sum().ln();
                log_sum_exp - row[target]
            })
            .sum();

        let penalty = 0.5 * self.l2_strength * weights.mapv(|w| w * w).sum();

        cross_entropy / self.features.nrows() as f64 + penalty
    }

    fn gradient(&self, params: &DVector<f64>) -> DVector<f64> {
        let (weights, intercepts) = self.unpack(params);

        let mut residuals = self.probabilities(&weights, &intercepts);
        for (mut row, &target) in residuals.rows_mut().into_iter().zip(self.targets) {
            row[target] -= 1.0;
        }

        self.backpropagate(&residuals, &weights)
    }

    fn hessian_product(&self, params: &DVector<f64>, direction: &DVector<f64>) -> DVector<f64> {
        let (weights, intercepts) = self.unpack(params);
        let (direction_weights, direction_intercepts) = self.unpack(direction);

        let probabilities = self.probabilities(&weights, &intercepts);
        let projected = linear_scores(self.features, &direction_weights, &direction_intercepts);

        // Per sample: (diag(p) - p p^T) r
        let mut curvature = &probabilities * &projected;
        for (mut row, p) in curvature.rows_mut().into_iter().zip(probabilities.rows()) {
            let weighted_sum = row.sum();
            row.zip_mut_with(&p, |value, &probability| {
                *value -= probability * weighted_sum;
            });
        }

        self.backpropagate(&curvature, &direction_weights)
    }
}
