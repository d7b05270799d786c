//! Eigenpair search loops
//!
//! [`EigenSearch`] is the main controller: it trains a fresh solver per
//! round, validates the candidate, rejects duplicates, deflates new
//! eigenvectors against the accepted set and reseeds from a widening normal
//! distribution until `target_count` distinct eigenpairs are collected.
//!
//! Two simpler policies live in submodules:
//!
//! - [`find_eigenvectors`]: exactly `n` rounds, reseeding with
//!   [`create_orthogonal`](crate::orthogonal::create_orthogonal), no retries
//! - [`many_random_points`]: independent random starts trained up front,
//!   then deduplicated by relative eigenvalue distance
//!
//! # Example
//!
//! ```
//! use eigseek::config::SearchConfig;
//! use eigseek::oracle::SpectralOracle;
//! use eigseek::search::search_until_found;
//! use eigseek::Matrix;
//!
//! let a = Matrix::from_diagonal(&[1.0, 2.0, 3.0, 4.0]);
//! let config = SearchConfig::new().with_target_count(4).with_seed(3);
//!
//! let report = search_until_found(&a, &SpectralOracle::new(), &config).unwrap();
//! let mut values = report.eigenvalues();
//! values.sort_by(|a, b| a.total_cmp(b));
//! assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
//! ```

mod batch;
mod sweep;

pub use batch::many_random_points;
pub use sweep::find_eigenvectors;

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::orthogonal::{deflate, DEGENERATE_RATIO};
use crate::solver::{train_candidate, SolverFactory};
use crate::validate::check_eig;
use crate::{EigError, Matrix, Result, Vector};

/// An accepted eigenvalue and its eigenvector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenPair {
    /// Eigenvalue
    pub value: f64,
    /// Eigenvector (deflated, not renormalized)
    pub vector: Vector<f64>,
}

/// Result of a search run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Accepted pairs in discovery order
    pub pairs: Vec<EigenPair>,
    /// Solver trainings performed
    pub rounds: usize,
    /// Candidates rejected as duplicates
    pub duplicates: usize,
    /// Candidates that failed validation
    pub invalid: usize,
    /// Wall-clock time in seconds
    pub elapsed_secs: f64,
}

impl SearchReport {
    /// Accepted eigenvalues in discovery order
    pub fn eigenvalues(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.value).collect()
    }

    /// Wall-clock time as a [`Duration`]
    ///
    /// Saturates at `Duration::MAX`; negative or NaN values read as zero.
    pub fn elapsed(&self) -> Duration {
        Duration::try_from_secs_f64(self.elapsed_secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// What happened in one round of [`EigenSearch`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundOutcome {
    /// New eigenpair stored at `index` of the accepted set
    Accepted {
        /// Position in the accepted set
        index: usize,
        /// Accepted eigenvalue
        eigenvalue: f64,
    },
    /// Eigenvalue already accepted; restart spread is now `1 + repeat_counter`
    Duplicate {
        /// Rejected eigenvalue
        eigenvalue: f64,
        /// Counter after this round
        repeat_counter: usize,
    },
    /// Candidate failed the eigenpair test
    Invalid {
        /// Rejected eigenvalue
        eigenvalue: f64,
    },
}

/// Search-until-found controller
///
/// Drive it one round at a time with [`step`](Self::step), or to completion
/// with [`run`](Self::run).
#[derive(Debug)]
pub struct EigenSearch<'a, F: SolverFactory, R: Rng> {
    matrix: &'a Matrix<f64>,
    factory: &'a F,
    config: &'a SearchConfig,
    rng: R,
    accepted: Vec<EigenPair>,
    starting_point: Vector<f64>,
    repeat_counter: usize,
    rounds: usize,
    duplicates: usize,
    invalid: usize,
    deadline: Option<Duration>,
    started: Instant,
}

impl<'a, F: SolverFactory, R: Rng> EigenSearch<'a, F, R> {
    /// Controller for `matrix` with the first starting point drawn from `rng`
    ///
    /// # Errors
    ///
    /// - `Config` if the configuration is invalid or asks for more
    ///   eigenpairs than the matrix dimension
    /// - `InvalidInput` if the matrix is not square or is empty
    pub fn new(
        matrix: &'a Matrix<f64>,
        factory: &'a F,
        config: &'a SearchConfig,
        mut rng: R,
    ) -> Result<Self> {
        config.validate()?;
        let n = matrix.ensure_square()?;
        if config.target_count > n {
            return Err(EigError::config(
                "target_count",
                format!(
                    "cannot find {} eigenpairs of a {}x{} matrix",
                    config.target_count, n, n
                ),
            ));
        }

        let starting_point = Vector::standard_normal(n, &mut rng);
        Ok(Self {
            matrix,
            factory,
            config,
            rng,
            accepted: Vec::with_capacity(config.target_count),
            starting_point,
            repeat_counter: 0,
            rounds: 0,
            duplicates: 0,
            invalid: 0,
            deadline: config.deadline()?,
            started: Instant::now(),
        })
    }

    /// Accepted pairs so far
    pub fn accepted(&self) -> &[EigenPair] {
        &self.accepted
    }

    /// Consecutive duplicates since the last acceptance
    pub fn repeat_counter(&self) -> usize {
        self.repeat_counter
    }

    /// Starting point of the next round
    pub fn starting_point(&self) -> &Vector<f64> {
        &self.starting_point
    }

    /// Rounds completed
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// True once `target_count` pairs are accepted
    pub fn is_done(&self) -> bool {
        self.accepted.len() >= self.config.target_count
    }

    /// Train, validate and classify one candidate, then reseed
    ///
    /// # Errors
    ///
    /// - `SearchExhausted` if `max_rounds` or the deadline is already spent
    /// - `InvalidInput` if the search is already done
    /// - solver errors from the factory or training run
    pub fn step(&mut self) -> Result<RoundOutcome> {
        if self.is_done() {
            return Err(EigError::InvalidInput(
                "search already collected its target".to_string(),
            ));
        }
        self.ensure_budget_left()?;

        info!(
            index = self.accepted.len(),
            round = self.rounds,
            "finding eigenvector"
        );
        let candidate = train_candidate(
            self.factory,
            self.matrix,
            &self.starting_point,
            &self.config.budget,
        )?;
        self.rounds += 1;

        let eigenvalue = candidate.eigenvalue;
        let valid = check_eig(
            eigenvalue,
            &candidate.eigenvector,
            self.matrix,
            self.config.residual_tolerance,
            self.config.check_mode,
        )?;

        let outcome = if !valid {
            self.reject_invalid(eigenvalue)
        } else if self.is_duplicate(eigenvalue) {
            self.repeat_counter += 1;
            self.duplicates += 1;
            warn!(eigenvalue, repeat_counter = self.repeat_counter, "duplicate eigenvalue");
            RoundOutcome::Duplicate {
                eigenvalue,
                repeat_counter: self.repeat_counter,
            }
        } else {
            let vector = deflate(
                &candidate.eigenvector,
                self.accepted.iter().map(|p| &p.vector),
            )?;
            let norm = vector.norm();
            if norm.is_nan() || norm <= DEGENERATE_RATIO * candidate.eigenvector.norm() {
                self.reject_invalid(eigenvalue)
            } else {
                let index = self.accepted.len();
                info!(index, eigenvalue, "found new eigenvector");
                self.accepted.push(EigenPair {
                    value: eigenvalue,
                    vector,
                });
                self.repeat_counter = 0;
                RoundOutcome::Accepted { index, eigenvalue }
            }
        };

        if !self.is_done() {
            self.reseed()?;
        }
        Ok(outcome)
    }

    /// Step until done
    ///
    /// # Errors
    ///
    /// Whatever [`step`](Self::step) returns.
    pub fn run(mut self) -> Result<SearchReport> {
        while !self.is_done() {
            self.step()?;
        }
        info!(
            eigenvalues = ?self.accepted.iter().map(|p| p.value).collect::<Vec<_>>(),
            rounds = self.rounds,
            "search complete"
        );
        Ok(self.into_report())
    }

    /// Report of the pairs accepted so far
    pub fn into_report(self) -> SearchReport {
        SearchReport {
            pairs: self.accepted,
            rounds: self.rounds,
            duplicates: self.duplicates,
            invalid: self.invalid,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }

    fn is_duplicate(&self, eigenvalue: f64) -> bool {
        self.accepted
            .iter()
            .any(|p| (p.value - eigenvalue).abs() < self.config.duplicate_tolerance)
    }

    fn reject_invalid(&mut self, eigenvalue: f64) -> RoundOutcome {
        self.invalid += 1;
        if self.config.grow_on_invalid {
            self.repeat_counter += 1;
        }
        warn!(eigenvalue, "found something not an eigenvector of A");
        RoundOutcome::Invalid { eigenvalue }
    }

    fn ensure_budget_left(&self) -> Result<()> {
        let out_of_time = self
            .deadline
            .is_some_and(|deadline| self.started.elapsed() >= deadline);
        if self.rounds >= self.config.max_rounds || out_of_time {
            return Err(EigError::SearchExhausted {
                found: self.accepted.len(),
                target: self.config.target_count,
                rounds: self.rounds,
            });
        }
        Ok(())
    }

    /// Normal draw with spread `1 + repeat_counter`, deflated against the accepted set
    fn reseed(&mut self) -> Result<()> {
        let n = self.starting_point.len();
        let std_dev = 1.0 + self.repeat_counter as f64;
        let draw = Vector::normal(n, 0.0, std_dev, &mut self.rng)?;
        let point = deflate(&draw, self.accepted.iter().map(|p| &p.vector))?;
        self.starting_point = if self.config.normalize_restarts {
            point.normalize()?
        } else {
            point
        };
        Ok(())
    }
}

/// Run [`EigenSearch`] to completion with the RNG from `config`
///
/// # Errors
///
/// See [`EigenSearch::new`] and [`EigenSearch::step`].
pub fn search_until_found<F: SolverFactory>(
    matrix: &Matrix<f64>,
    factory: &F,
    config: &SearchConfig,
) -> Result<SearchReport> {
    EigenSearch::new(matrix, factory, config, config.rng())?.run()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::oracle::SpectralOracle;
    use crate::solver::{Candidate, EigenSolver, TrainingBudget};
    use crate::validate::CheckMode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;

    /// Solver returning a fixed candidate regardless of the starting point
    pub(crate) struct Fixed(pub(crate) Candidate);

    impl EigenSolver for Fixed {
        fn train_model(&mut self, _budget: &TrainingBudget) -> Result<()> {
            Ok(())
        }

        fn compute_eig(&self) -> Result<Candidate> {
            Ok(self.0.clone())
        }
    }

    /// Factory replaying a script of candidates, repeating the last one
    pub(crate) struct Scripted {
        script: Vec<Candidate>,
        calls: RefCell<usize>,
        pub(crate) starts: RefCell<Vec<Vector<f64>>>,
    }

    impl Scripted {
        pub(crate) fn new(script: Vec<(f64, Vec<f64>)>) -> Self {
            Self {
                script: script
                    .into_iter()
                    .map(|(eigenvalue, v)| Candidate {
                        eigenvalue,
                        eigenvector: Vector::from_vec(v),
                    })
                    .collect(),
                calls: RefCell::new(0),
                starts: RefCell::new(Vec::new()),
            }
        }
    }

    impl SolverFactory for Scripted {
        type Solver = Fixed;

        fn create(&self, _matrix: &Matrix<f64>, start: &Vector<f64>) -> Result<Fixed> {
            let mut calls = self.calls.borrow_mut();
            let i = (*calls).min(self.script.len() - 1);
            *calls += 1;
            self.starts.borrow_mut().push(start.clone());
            Ok(Fixed(self.script[i].clone()))
        }
    }

    fn diag123() -> Matrix<f64> {
        Matrix::from_diagonal(&[1.0, 2.0, 3.0])
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_oracle_finds_all_pairs() {
        let a = Matrix::from_diagonal(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let config = SearchConfig::new().with_seed(11);
        let report = search_until_found(&a, &SpectralOracle::new(), &config).unwrap();

        assert_eq!(report.pairs.len(), 6);
        assert_eq!(report.rounds, 6);
        assert_eq!(report.duplicates, 0);
        let mut values = report.eigenvalues();
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_constant_solver_never_accepts_twice() {
        let a = diag123();
        let factory = Scripted::new(vec![(2.0, vec![0.0, 1.0, 0.0])]);
        let config = SearchConfig::new().with_target_count(2).with_max_rounds(8);
        let mut search = EigenSearch::new(&a, &factory, &config, rng()).unwrap();

        assert_eq!(
            search.step().unwrap(),
            RoundOutcome::Accepted {
                index: 0,
                eigenvalue: 2.0
            }
        );

        let mut previous = search.repeat_counter();
        for _ in 1..8 {
            let outcome = search.step().unwrap();
            assert!(matches!(outcome, RoundOutcome::Duplicate { .. }));
            assert!(search.repeat_counter() > previous);
            previous = search.repeat_counter();
        }
        assert_eq!(search.accepted().len(), 1);

        let err = search.step().unwrap_err();
        assert!(matches!(
            err,
            EigError::SearchExhausted {
                found: 1,
                target: 2,
                rounds: 8
            }
        ));
    }

    #[test]
    fn test_invalid_candidate_keeps_counter_by_default() {
        let a = diag123();
        // (1, 1, 0) is not an eigenvector of diag(1, 2, 3)
        let factory = Scripted::new(vec![
            (2.0, vec![0.0, 1.0, 0.0]),
            (2.0, vec![0.0, 1.0, 0.0]),
            (1.5, vec![1.0, 1.0, 0.0]),
        ]);
        let config = SearchConfig::new().with_target_count(2).with_max_rounds(10);
        let mut search = EigenSearch::new(&a, &factory, &config, rng()).unwrap();

        search.step().unwrap();
        search.step().unwrap();
        assert_eq!(search.repeat_counter(), 1);
        assert_eq!(
            search.step().unwrap(),
            RoundOutcome::Invalid { eigenvalue: 1.5 }
        );
        assert_eq!(search.repeat_counter(), 1);
    }

    #[test]
    fn test_grow_on_invalid() {
        let a = diag123();
        let factory = Scripted::new(vec![(1.5, vec![1.0, 1.0, 0.0])]);
        let config = SearchConfig::new()
            .with_target_count(1)
            .with_max_rounds(3)
            .with_grow_on_invalid(true);
        let mut search = EigenSearch::new(&a, &factory, &config, rng()).unwrap();

        search.step().unwrap();
        search.step().unwrap();
        assert_eq!(search.repeat_counter(), 2);

        search.step().unwrap();
        assert!(matches!(
            search.step(),
            Err(EigError::SearchExhausted {
                found: 0,
                rounds: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_is_absolute_tolerance() {
        let a = Matrix::from_diagonal(&[2.0, 2.005, 3.0]);
        let factory = Scripted::new(vec![
            (2.0, vec![1.0, 0.0, 0.0]),
            (2.005, vec![0.0, 1.0, 0.0]),
        ]);
        let config = SearchConfig::new().with_target_count(2).with_max_rounds(2);
        let mut search = EigenSearch::new(&a, &factory, &config, rng()).unwrap();

        search.step().unwrap();
        assert!(matches!(
            search.step().unwrap(),
            RoundOutcome::Duplicate { .. }
        ));
    }

    #[test]
    fn test_accepted_vector_is_deflated() {
        let a = Matrix::from_vec(2, 2, vec![2.0, 1.0, 1.0, 2.0]).unwrap();
        let s = std::f64::consts::FRAC_1_SQRT_2;
        // Second candidate carries a small component along the first
        let factory = Scripted::new(vec![(3.0, vec![s, s]), (1.0, vec![s + 0.01, -s])]);
        let config = SearchConfig::new().with_target_count(2);
        let report = EigenSearch::new(&a, &factory, &config, rng())
            .unwrap()
            .run()
            .unwrap();

        let first = &report.pairs[0].vector;
        let second = &report.pairs[1].vector;
        assert!(first.dot(second).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_restarts_are_deflated() {
        let a = diag123();
        let factory = Scripted::new(vec![(3.0, vec![0.0, 0.0, 1.0]), (2.0, vec![0.0, 1.0, 0.0])]);
        let config = SearchConfig::new().with_target_count(2);
        EigenSearch::new(&a, &factory, &config, rng())
            .unwrap()
            .run()
            .unwrap();

        let starts = factory.starts.borrow();
        assert_eq!(starts.len(), 2);
        assert!(starts[1].as_slice()[2].abs() < 1e-12);
    }

    #[test]
    fn test_normalize_restarts() {
        let a = diag123();
        let factory = Scripted::new(vec![(3.0, vec![0.0, 0.0, 1.0])]);
        let config = SearchConfig::new()
            .with_target_count(2)
            .with_max_rounds(4)
            .with_normalize_restarts(true);
        let mut search = EigenSearch::new(&a, &factory, &config, rng()).unwrap();

        for _ in 0..3 {
            search.step().unwrap();
            assert!((search.starting_point().norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_no_reseed_after_done() {
        let a = diag123();
        let factory = Scripted::new(vec![(3.0, vec![0.0, 0.0, 1.0])]);
        let config = SearchConfig::new().with_target_count(1);
        let mut search = EigenSearch::new(&a, &factory, &config, rng()).unwrap();

        let before = search.starting_point().clone();
        search.step().unwrap();
        assert!(search.is_done());
        assert_eq!(search.starting_point(), &before);
        assert!(matches!(search.step(), Err(EigError::InvalidInput(_))));
    }

    #[test]
    fn test_target_larger_than_dimension() {
        let a = diag123();
        let config = SearchConfig::new().with_target_count(4);
        let err = EigenSearch::new(&a, &SpectralOracle::new(), &config, rng()).unwrap_err();
        assert!(matches!(err, EigError::Config { field: "target_count", .. }));
    }

    #[test]
    fn test_deadline_exhausts_search() {
        let a = diag123();
        let factory = Scripted::new(vec![(3.0, vec![0.0, 0.0, 1.0])]);
        let config = SearchConfig::new()
            .with_target_count(2)
            .with_deadline(Duration::from_nanos(1));
        let mut search = EigenSearch::new(&a, &factory, &config, rng()).unwrap();

        std::thread::sleep(Duration::from_millis(1));
        assert!(matches!(
            search.step(),
            Err(EigError::SearchExhausted { rounds: 0, .. })
        ));
    }

    #[test]
    fn test_oversized_deadline_is_a_config_error() {
        let a = diag123();
        let mut config = SearchConfig::new().with_target_count(1);
        config.deadline_secs = Some(1e30);
        let err = EigenSearch::new(&a, &SpectralOracle::new(), &config, rng()).unwrap_err();
        assert!(matches!(err, EigError::Config { field: "deadline_secs", .. }));
        assert!(search_until_found(&a, &SpectralOracle::new(), &config).is_err());
    }

    #[test]
    fn test_report_elapsed_saturates() {
        let mut report = SearchReport {
            pairs: Vec::new(),
            rounds: 0,
            duplicates: 0,
            invalid: 0,
            elapsed_secs: 1e30,
        };
        assert_eq!(report.elapsed(), Duration::MAX);
        report.elapsed_secs = f64::NAN;
        assert_eq!(report.elapsed(), Duration::ZERO);
        report.elapsed_secs = 1.5;
        assert_eq!(report.elapsed(), Duration::from_millis(1500));
    }

    #[test]
    fn test_componentwise_mode_rejects_basis_vectors() {
        let a = diag123();
        let factory = Scripted::new(vec![(3.0, vec![0.0, 0.0, 1.0])]);
        let config = SearchConfig::new()
            .with_target_count(1)
            .with_max_rounds(2)
            .with_check_mode(CheckMode::Componentwise);
        let mut search = EigenSearch::new(&a, &factory, &config, rng()).unwrap();
        assert!(matches!(
            search.step().unwrap(),
            RoundOutcome::Invalid { .. }
        ));
    }

    #[test]
    fn test_report_serializes() {
        let a = Matrix::from_diagonal(&[1.0, 2.0]);
        let config = SearchConfig::new().with_target_count(2).with_seed(1);
        let report = search_until_found(&a, &SpectralOracle::new(), &config).unwrap();

        let json = serde_json::to_string(&report).unwrap();
        let back: SearchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pairs, report.pairs);
        assert_eq!(back.rounds, 2);
    }
}
