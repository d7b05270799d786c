//! Search configuration
//!
//! # Examples
//!
//! ```
//! use eigseek::config::SearchConfig;
//!
//! // Reference settings: 6 eigenpairs, 50 000 epochs × 4 batches per round
//! let reference = SearchConfig::reference();
//! assert_eq!(reference.target_count, 6);
//!
//! // Custom configuration using builder pattern
//! let custom = SearchConfig::new()
//!     .with_target_count(3)
//!     .with_seed(42)
//!     .with_max_rounds(200)
//!     .build();
//! assert!(custom.validate().is_ok());
//! ```

use std::path::Path;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::solver::{duration_secs, TrainingBudget};
use crate::validate::{CheckMode, DEFAULT_RESIDUAL_TOLERANCE};
use crate::{EigError, Result};

/// Settings shared by the search loop and its variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of distinct eigenpairs to collect
    pub target_count: usize,
    /// Training budget for every solver instance
    pub budget: TrainingBudget,
    /// Relative tolerance of the eigenpair test
    pub residual_tolerance: f64,
    /// Which eigenpair test to run
    pub check_mode: CheckMode,
    /// Absolute eigenvalue distance below which a candidate is a duplicate
    pub duplicate_tolerance: f64,
    /// Relative eigenvalue distance used to deduplicate batch results
    pub batch_dedup_tolerance: f64,
    /// Also widen the restart distribution after an invalid candidate
    pub grow_on_invalid: bool,
    /// Scale every restart point to unit length after deflation
    pub normalize_restarts: bool,
    /// Training rounds allowed before giving up
    pub max_rounds: usize,
    /// Overall wall-clock limit in seconds
    pub deadline_secs: Option<f64>,
    /// RNG seed (entropy when unset)
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_count: 6,
            budget: TrainingBudget::default(),
            residual_tolerance: DEFAULT_RESIDUAL_TOLERANCE,
            check_mode: CheckMode::default(),
            duplicate_tolerance: 0.01,
            batch_dedup_tolerance: 0.2,
            grow_on_invalid: false,
            normalize_restarts: false,
            max_rounds: 1000,
            deadline_secs: None,
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference preset: the defaults, spelled out
    pub fn reference() -> Self {
        Self::default()
    }

    /// Small training budget for smoke runs
    ///
    /// ```
    /// use eigseek::config::SearchConfig;
    ///
    /// let quick = SearchConfig::quick();
    /// assert_eq!(quick.budget.epochs, 2_000);
    /// assert_eq!(quick.max_rounds, 100);
    /// ```
    pub fn quick() -> Self {
        Self::new()
            .with_budget(TrainingBudget::default().with_epochs(2_000))
            .with_max_rounds(100)
    }

    /// Set number of eigenpairs to collect
    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target_count = count;
        self
    }

    /// Set training budget
    pub fn with_budget(mut self, budget: TrainingBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Set eigenpair test tolerance
    pub fn with_residual_tolerance(mut self, tolerance: f64) -> Self {
        self.residual_tolerance = tolerance;
        self
    }

    /// Set eigenpair test mode
    pub fn with_check_mode(mut self, mode: CheckMode) -> Self {
        self.check_mode = mode;
        self
    }

    /// Set absolute duplicate tolerance
    pub fn with_duplicate_tolerance(mut self, tolerance: f64) -> Self {
        self.duplicate_tolerance = tolerance;
        self
    }

    /// Set relative batch deduplication tolerance
    pub fn with_batch_dedup_tolerance(mut self, tolerance: f64) -> Self {
        self.batch_dedup_tolerance = tolerance;
        self
    }

    /// Widen restarts after invalid candidates too
    pub fn with_grow_on_invalid(mut self, enabled: bool) -> Self {
        self.grow_on_invalid = enabled;
        self
    }

    /// Normalize restart points
    pub fn with_normalize_restarts(mut self, enabled: bool) -> Self {
        self.normalize_restarts = enabled;
        self
    }

    /// Set maximum number of training rounds
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Set overall deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_secs = Some(deadline.as_secs_f64());
        self
    }

    /// Set RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Finalize configuration (no-op, for builder pattern consistency)
    pub fn build(self) -> Self {
        self
    }

    /// Overall deadline as a [`Duration`]
    ///
    /// # Errors
    ///
    /// [`EigError::Config`] if `deadline_secs` is not a representable
    /// positive duration.
    pub fn deadline(&self) -> Result<Option<Duration>> {
        self.deadline_secs
            .map(|secs| duration_secs("deadline_secs", secs))
            .transpose()
    }

    /// RNG for starting points: seeded when `seed` is set, entropy otherwise
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Validate all fields
    ///
    /// # Errors
    ///
    /// Returns [`EigError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.target_count == 0 {
            return Err(EigError::config("target_count", "must be > 0"));
        }
        self.budget.validate()?;
        positive("residual_tolerance", self.residual_tolerance)?;
        positive("duplicate_tolerance", self.duplicate_tolerance)?;
        positive("batch_dedup_tolerance", self.batch_dedup_tolerance)?;
        if self.max_rounds == 0 {
            return Err(EigError::config("max_rounds", "must be > 0"));
        }
        self.deadline()?;
        Ok(())
    }

    /// Load and validate a JSON configuration file
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// [`EigError::Io`] if the file cannot be read, [`EigError::Json`] if it
    /// does not parse, [`EigError::Config`] if validation fails.
    pub fn from_json(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| EigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SearchConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// [`EigError::Io`] if the file cannot be written.
    pub fn to_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| EigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(EigError::config(
            field,
            format!("must be finite and > 0, got {}", value),
        ))
    }
}
