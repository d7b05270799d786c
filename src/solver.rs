//! Seam between the search loop and the trainable model
//!
//! The search never looks inside the model. Each round it asks a
//! [`SolverFactory`] for a fresh [`EigenSolver`] seeded with a starting point,
//! trains it under a [`TrainingBudget`] and reads back one [`Candidate`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EigError, Matrix, Result, Vector};

/// Training limits handed to every solver instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingBudget {
    /// Number of epochs
    pub epochs: usize,
    /// Optimizer steps per epoch
    pub batches: usize,
    /// Early-stopping threshold on the solver's loss
    pub tolerance: f64,
    /// Overrides the solver's own step size when set
    pub learning_rate: Option<f64>,
    /// Soft wall-clock limit for one training run, in seconds
    pub time_limit_secs: Option<f64>,
}

impl Default for TrainingBudget {
    fn default() -> Self {
        Self {
            epochs: 50_000,
            batches: 4,
            tolerance: 1e-3,
            learning_rate: None,
            time_limit_secs: None,
        }
    }
}

impl TrainingBudget {
    /// Settings of the classic batch run: 100 000 epochs × 4 batches with a
    /// loose early-stopping tolerance of 0.1
    pub fn batch_reference() -> Self {
        Self {
            epochs: 100_000,
            tolerance: 0.1,
            ..Self::default()
        }
    }

    /// Set number of epochs
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set optimizer steps per epoch
    pub fn with_batches(mut self, batches: usize) -> Self {
        self.batches = batches;
        self
    }

    /// Set early-stopping tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set learning rate override
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    /// Set per-run time limit
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_secs = Some(limit.as_secs_f64());
        self
    }

    /// Per-run time limit as a [`Duration`]
    ///
    /// # Errors
    ///
    /// [`EigError::Config`] if `time_limit_secs` is not a representable
    /// positive duration.
    pub fn time_limit(&self) -> Result<Option<Duration>> {
        self.time_limit_secs
            .map(|secs| duration_secs("budget.time_limit_secs", secs))
            .transpose()
    }

    /// Validate all fields
    ///
    /// # Errors
    ///
    /// Returns [`EigError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(EigError::config("budget.epochs", "must be > 0"));
        }
        if self.batches == 0 {
            return Err(EigError::config("budget.batches", "must be > 0"));
        }
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(EigError::config(
                "budget.tolerance",
                format!("must be finite and >= 0, got {}", self.tolerance),
            ));
        }
        if let Some(lr) = self.learning_rate {
            if !(lr > 0.0 && lr.is_finite()) {
                return Err(EigError::config(
                    "budget.learning_rate",
                    format!("must be finite and > 0, got {}", lr),
                ));
            }
        }
        self.time_limit()?;
        Ok(())
    }
}

/// Seconds as a [`Duration`], rejecting values `Duration` cannot hold
pub(crate) fn duration_secs(field: &'static str, secs: f64) -> Result<Duration> {
    if !(secs > 0.0 && secs.is_finite()) {
        return Err(EigError::config(
            field,
            format!("must be finite and > 0, got {}", secs),
        ));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| EigError::config(field, format!("{} seconds: {}", secs, e)))
}

/// Best eigenpair estimate of one trained solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Eigenvalue estimate
    pub eigenvalue: f64,
    /// Eigenvector estimate, length n
    pub eigenvector: Vector<f64>,
}

/// A trainable model whose output converges toward an eigenvector
pub trait EigenSolver {
    /// Train under `budget`; blocks until done
    ///
    /// # Errors
    ///
    /// Implementation defined, e.g. divergence.
    fn train_model(&mut self, budget: &TrainingBudget) -> Result<()>;

    /// Current best estimate
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn compute_eig(&self) -> Result<Candidate>;
}

/// Builds a fresh solver for one round
pub trait SolverFactory {
    /// Solver type produced
    type Solver: EigenSolver;

    /// Solver for `matrix` seeded with `starting_point`
    ///
    /// # Errors
    ///
    /// Implementation defined, e.g. a zero starting point.
    fn create(&self, matrix: &Matrix<f64>, starting_point: &Vector<f64>) -> Result<Self::Solver>;
}

/// Create, train and read out one solver
///
/// # Errors
///
/// Propagates solver errors; [`EigError::SizeMismatch`] if the candidate
/// vector does not match the matrix dimension.
pub fn train_candidate<F: SolverFactory + ?Sized>(
    factory: &F,
    matrix: &Matrix<f64>,
    starting_point: &Vector<f64>,
    budget: &TrainingBudget,
) -> Result<Candidate> {
    let mut solver = factory.create(matrix, starting_point)?;
    solver.train_model(budget)?;
    let candidate = solver.compute_eig()?;
    if candidate.eigenvector.len() != matrix.rows() {
        return Err(EigError::SizeMismatch {
            expected: matrix.rows(),
            actual: candidate.eigenvector.len(),
        });
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget() {
        let budget = TrainingBudget::default();
        assert_eq!(budget.epochs, 50_000);
        assert_eq!(budget.batches, 4);
        assert!(budget.learning_rate.is_none());
        assert!(budget.time_limit().unwrap().is_none());
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn test_batch_reference_budget() {
        let budget = TrainingBudget::batch_reference();
        assert_eq!(budget.epochs, 100_000);
        assert_eq!(budget.batches, 4);
        assert_eq!(budget.tolerance, 0.1);
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn test_budget_builder() {
        let budget = TrainingBudget::default()
            .with_epochs(10)
            .with_batches(2)
            .with_tolerance(1e-6)
            .with_learning_rate(0.0175)
            .with_time_limit(Duration::from_millis(1500));
        assert_eq!(budget.epochs, 10);
        assert_eq!(budget.batches, 2);
        assert_eq!(budget.learning_rate, Some(0.0175));
        assert_eq!(budget.time_limit().unwrap(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_budget_validation() {
        assert!(TrainingBudget::default().with_epochs(0).validate().is_err());
        assert!(TrainingBudget::default().with_batches(0).validate().is_err());
        assert!(TrainingBudget::default()
            .with_tolerance(f64::NAN)
            .validate()
            .is_err());
        assert!(TrainingBudget::default()
            .with_learning_rate(-1.0)
            .validate()
            .is_err());

        let mut budget = TrainingBudget::default();
        budget.time_limit_secs = Some(1e30);
        assert!(budget.validate().is_err());
        assert!(budget.time_limit().is_err());
    }

    struct Fixed(Candidate);

    impl EigenSolver for Fixed {
        fn train_model(&mut self, _budget: &TrainingBudget) -> Result<()> {
            Ok(())
        }

        fn compute_eig(&self) -> Result<Candidate> {
            Ok(self.0.clone())
        }
    }

    struct FixedFactory(Candidate);

    impl SolverFactory for FixedFactory {
        type Solver = Fixed;

        fn create(&self, _matrix: &Matrix<f64>, _start: &Vector<f64>) -> Result<Fixed> {
            Ok(Fixed(self.0.clone()))
        }
    }

    #[test]
    fn test_train_candidate_checks_dimension() {
        let factory = FixedFactory(Candidate {
            eigenvalue: 1.0,
            eigenvector: Vector::from_slice(&[1.0, 0.0]),
        });
        let a = Matrix::identity(3);
        let start = Vector::zeros(3);
        let err = train_candidate(&factory, &a, &start, &TrainingBudget::default()).unwrap_err();
        assert!(matches!(
            err,
            EigError::SizeMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }
}
