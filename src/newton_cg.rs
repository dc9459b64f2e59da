//! Truncated Newton (Newton-CG) minimisation of smooth convex objectives.

use nalgebra::DVector;
use tracing::{debug, warn};

/// A twice-differentiable objective. The Hessian is only ever needed as a
/// product with a direction.
pub trait Objective {
    fn value(&self, params: &DVector<f64>) -> f64;

    fn gradient(&self, params: &DVector<f64>) -> DVector<f64>;

    fn hessian_product(&self, params: &DVector<f64>, direction: &DVector<f64>) -> DVector<f64>;
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub params: DVector<f64>,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct NewtonCg {
    pub max_iterations: usize,
    /// Stop once every gradient component is at most this in magnitude.
    pub tolerance: f64,
    pub max_inner_iterations: usize,
}

impl NewtonCg {
    const ARMIJO_SLOPE: f64 = 1e-4;
    const MAX_BACKTRACKS: usize = 50;

    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            max_inner_iterations: 200,
        }
    }

    pub fn minimize<O: Objective>(&self, objective: &O, initial: DVector<f64>) -> Solution {
        let mut params = initial;
        let mut value = objective.value(&params);

        for iteration in 0..self.max_iterations {
            let gradient = objective.gradient(&params);

            if gradient.amax() <= self.tolerance {
                return Solution {
                    params,
                    iterations: iteration,
                    converged: true,
                };
            }

            let direction = self.newton_direction(objective, &params, &gradient);

            let Some((step, next_value)) =
                Self::line_search(objective, &params, value, &gradient, &direction)
            else {
                warn!(iteration, value, "line search failed to decrease the objective");
                return Solution {
                    params,
                    iterations: iteration,
                    converged: false,
                };
            };

            params += step * direction;
            value = next_value;

            debug!(iteration, value, step, "newton-cg step");
        }

        let converged = objective.gradient(&params).amax() <= self.tolerance;

        Solution {
            params,
            iterations: self.max_iterations,
            converged,
        }
    }

    /// Approximately solves `H d = -g` by conjugate gradient, truncated once
    /// the residual is small relative to the gradient or curvature turns
    /// non-positive.
    fn newton_direction<O: Objective>(
        &self,
        objective: &O,
        params: &DVector<f64>,
        gradient: &DVector<f64>,
    ) -> DVector<f64> {
        let gradient_norm = gradient.lp_norm(1);
        let termination = gradient_norm.sqrt().min(0.5) * gradient_norm;

        let mut direction = DVector::zeros(gradient.len());
        let mut residual = -gradient;
        let mut conjugate = residual.clone();
        let mut residual_norm = residual.dot(&residual);

        for inner in 0..self.max_inner_iterations {
            if residual.lp_norm(1) <= termination {
                break;
            }

            let curvature_product = objective.hessian_product(params, &conjugate);
            let curvature = conjugate.dot(&curvature_product);

            if curvature <= 0.0 {
                if inner == 0 {
                    direction = -gradient;
                }
                break;
            }

            let alpha = residual_norm / curvature;
            direction.axpy(alpha, &conjugate, 1.0);
            residual.axpy(-alpha, &curvature_product, 1.0);

            let next_residual_norm = residual.dot(&residual);
            conjugate = &residual + (next_residual_norm / residual_norm) * &conjugate;
            residual_norm = next_residual_norm;
        }

        direction
    }

    /// Backtracking search for a step satisfying the Armijo condition.
    fn line_search<O: Objective>(
        objective: &O,
        params: &DVector<f64>,
        value: f64,
        gradient: &DVector<f64>,
        direction: &DVector<f64>,
    ) -> Option<(f64, f64)> {
        let slope = gradient.dot(direction);
        if slope >= 0.0 {
            return None;
        }

        let mut step = 1.0;
        for _ in 0..Self::MAX_BACKTRACKS {
            let candidate = params + step * direction;
            let candidate_value = objective.value(&candidate);

            if candidate_value <= value + Self::ARMIJO_SLOPE * step * slope {
                return Some((step, candidate_value));
            }

            step *= 0.5;
        }

        None
    }
}
