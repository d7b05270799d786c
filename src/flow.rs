//! Flow solvers
//!
//! The default trainable model. Its single layer of parameters is a state
//! vector `x`, trained by explicit Euler steps on one of two objectives.
//!
//! [`FlowObjective::Residual`] descends the scale-invariant squared residual
//!
//! ```text
//! g(x) = ‖A x − ρ(x) x‖² / ‖x‖²,   ρ(x) = xᵀA x / xᵀx
//! ```
//!
//! whose gradient is `(2/‖x‖²)·((A − ρ) r − g x)` with `r = A x − ρ x`. In the
//! eigenbasis `g` is the variance of the spectrum weighted by `x`, so every
//! eigenvector is a minimum. Components whose eigenvalue lies farther from
//! `ρ` than the weighted spread shrink, and `x` settles on an eigenvector
//! near its starting Rayleigh quotient. A small leftover component along a
//! distant, already-found eigenvector decays instead of growing back.
//!
//! [`FlowObjective::Rayleigh`] integrates the neural-network ODE of Yi, Fu
//! and Tang (2004)
//!
//! ```text
//! dx/dt = |x|² A x − (xᵀ A x) x
//! ```
//!
//! which drives `x` toward the eigenvector of the largest eigenvalue present
//! in the start. The continuous flow preserves `|x|`; each explicit Euler
//! step grows `|x|²` by `h²|f|²`, which the scale-invariant loss ignores.
//!
//! Both report the loss `‖A x − ρ x‖ / (‖x‖ · ‖A‖∞)`.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::solver::{Candidate, EigenSolver, SolverFactory, TrainingBudget};
use crate::{EigError, Matrix, Result, Vector};

/// Loss and state snapshots of one training run
///
/// Plain data for external plotting: component trajectories and the
/// loss curve per recorded epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Recorded epoch indices
    pub epochs: Vec<usize>,
    /// Loss at each recorded epoch
    pub loss: Vec<f64>,
    /// State vector at each recorded epoch
    pub trajectory: Vec<Vec<f64>>,
}

impl TrainingHistory {
    fn record(&mut self, epoch: usize, loss: f64, state: &[f64]) {
        if self.epochs.last() == Some(&epoch) {
            return;
        }
        self.epochs.push(epoch);
        self.loss.push(loss);
        self.trajectory.push(state.to_vec());
    }

    /// Number of recorded epochs
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    /// True if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

/// Quantity the Euler steps descend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowObjective {
    /// Squared relative residual; converges to an eigenvector near the start
    #[default]
    Residual,
    /// Yi-Fu-Tang flow; converges to the largest eigenvalue in the start
    Rayleigh,
}

/// Builds [`RayleighFlowSolver`] instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayleighFlowFactory {
    /// Objective of every solver built
    pub objective: FlowObjective,
    /// Euler step, in units of `1 / ‖A‖∞²` (residual) or
    /// `1 / (|x₀|² ‖A‖∞)` (Rayleigh)
    pub time_step: f64,
    /// Record history every this many epochs
    pub history_stride: usize,
}

impl Default for RayleighFlowFactory {
    fn default() -> Self {
        Self {
            objective: FlowObjective::default(),
            time_step: 0.1,
            history_stride: 100,
        }
    }
}

impl RayleighFlowFactory {
    /// Factory with default step and stride
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the objective
    pub fn with_objective(mut self, objective: FlowObjective) -> Self {
        self.objective = objective;
        self
    }

    /// Set the Euler step
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Set the history stride (values below 1 are raised to 1)
    pub fn with_history_stride(mut self, stride: usize) -> Self {
        self.history_stride = stride.max(1);
        self
    }
}

impl SolverFactory for RayleighFlowFactory {
    type Solver = RayleighFlowSolver;

    fn create(&self, matrix: &Matrix<f64>, starting_point: &Vector<f64>) -> Result<Self::Solver> {
        RayleighFlowSolver::new(matrix, starting_point, self.time_step, self.history_stride)
            .map(|solver| solver.with_objective(self.objective))
    }
}

/// Euler-integrated flow on one starting point
#[derive(Debug, Clone)]
pub struct RayleighFlowSolver {
    matrix: Matrix<f64>,
    objective: FlowObjective,
    state: Vec<f64>,
    time_step: f64,
    step_scale: f64,
    bound: f64,
    history_stride: usize,
    history: TrainingHistory,
    steps: usize,
    converged: bool,
}

impl RayleighFlowSolver {
    /// Solver for `matrix` starting from `starting_point`
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the matrix is not square or the starting point has
    ///   zero or non-finite norm
    /// - `SizeMismatch` if the starting point does not match the matrix
    pub fn new(
        matrix: &Matrix<f64>,
        starting_point: &Vector<f64>,
        time_step: f64,
        history_stride: usize,
    ) -> Result<Self> {
        let n = matrix.ensure_square()?;
        if starting_point.len() != n {
            return Err(EigError::SizeMismatch {
                expected: n,
                actual: starting_point.len(),
            });
        }
        let norm_sq = starting_point.dot(starting_point)?;
        if !(norm_sq > 0.0 && norm_sq.is_finite()) {
            return Err(EigError::InvalidInput(format!(
                "starting point must have finite non-zero norm, got |x|² = {}",
                norm_sq
            )));
        }
        if !(time_step > 0.0 && time_step.is_finite()) {
            return Err(EigError::InvalidInput(format!(
                "time step must be finite and > 0, got {}",
                time_step
            )));
        }

        let bound = match matrix.max_abs_row_sum() {
            b if b > 0.0 => b,
            _ => 1.0,
        };

        Ok(Self {
            matrix: matrix.clone(),
            objective: FlowObjective::default(),
            state: starting_point.as_slice().to_vec(),
            time_step,
            step_scale: 1.0 / (norm_sq * bound),
            bound,
            history_stride: history_stride.max(1),
            history: TrainingHistory::default(),
            steps: 0,
            converged: false,
        })
    }

    /// Same solver descending `objective`
    pub fn with_objective(mut self, objective: FlowObjective) -> Self {
        self.objective = objective;
        self
    }

    /// Objective being descended
    pub fn objective(&self) -> FlowObjective {
        self.objective
    }

    fn matvec(&self, x: &[f64]) -> Vec<f64> {
        let n = x.len();
        self.matrix
            .as_slice()
            .chunks_exact(n)
            .map(|row| row.iter().zip(x).map(|(p, q)| p * q).sum())
            .collect()
    }

    /// One Euler step; returns the loss before the step
    fn euler_step(&mut self, lr: f64) -> f64 {
        let ax = self.matvec(&self.state);
        let x = &self.state;
        let norm_sq: f64 = x.iter().map(|v| v * v).sum();
        let rho: f64 = x.iter().zip(&ax).map(|(p, q)| p * q).sum();
        let rayleigh = rho / norm_sq;

        let r: Vec<f64> = ax.iter().zip(x).map(|(p, q)| p - rayleigh * q).collect();
        let residual_sq: f64 = r.iter().map(|v| v * v).sum();
        let loss = residual_sq.sqrt() / (norm_sq.sqrt() * self.bound);

        match self.objective {
            FlowObjective::Residual => {
                let ar = self.matvec(&r);
                let g = residual_sq / norm_sq;
                let h = 2.0 * lr / (self.bound * self.bound);
                for ((xi, ari), ri) in self.state.iter_mut().zip(&ar).zip(&r) {
                    *xi -= h * (ari - rayleigh * ri - g * *xi);
                }
            }
            FlowObjective::Rayleigh => {
                let h = lr * self.step_scale;
                for (xi, axi) in self.state.iter_mut().zip(&ax) {
                    *xi += h * (norm_sq * axi - rho * *xi);
                }
            }
        }
        self.steps += 1;
        loss
    }

    /// Recorded history of the last training run
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// True if the loss dropped below tolerance
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Total Euler steps taken
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Current state vector
    pub fn state(&self) -> &[f64] {
        &self.state
    }
}

impl EigenSolver for RayleighFlowSolver {
    #[instrument(level = "debug", skip_all, fields(n = self.state.len(), epochs = budget.epochs))]
    fn train_model(&mut self, budget: &TrainingBudget) -> Result<()> {
        budget.validate()?;
        let lr = budget.learning_rate.unwrap_or(self.time_step);
        let deadline = budget
            .time_limit()?
            .and_then(|limit| Instant::now().checked_add(limit));

        let mut loss = f64::INFINITY;
        for epoch in 0..budget.epochs {
            loss = 0.0;
            for _ in 0..budget.batches {
                loss += self.euler_step(lr);
            }
            loss /= budget.batches as f64;

            if !loss.is_finite() || self.state.iter().any(|x| !x.is_finite()) {
                return Err(EigError::Solver(format!(
                    "{:?} flow diverged at epoch {} (learning rate {})",
                    self.objective, epoch, lr
                )));
            }

            if epoch % self.history_stride == 0 {
                self.history.record(epoch, loss, &self.state);
            }

            if loss < budget.tolerance {
                self.history.record(epoch, loss, &self.state);
                self.converged = true;
                debug!(epoch, loss, "training converged");
                return Ok(());
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(epoch, loss, "training time limit reached, keeping current estimate");
                return Ok(());
            }
        }

        debug!(loss, "training budget spent before reaching tolerance");
        Ok(())
    }

    fn compute_eig(&self) -> Result<Candidate> {
        let x = Vector::from_slice(&self.state);
        let ax = self.matrix.matvec(&x)?;
        let eigenvalue = x.dot(&ax)? / x.dot(&x)?;
        Ok(Candidate {
            eigenvalue,
            eigenvector: x.normalize()?,
        })
    }
}
