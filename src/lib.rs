//! eigseek: eigenpair search for symmetric matrices
//!
//! **eigseek** finds eigenpairs of a real symmetric matrix by repeatedly
//! training a model whose output drifts toward an eigenvector, then checking,
//! deduplicating and deflating what comes out:
//!
//! 1. **Train** a fresh solver from a starting point ([`solver`], [`flow`])
//! 2. **Validate** the candidate against `A·v ≈ λ·v` ([`validate`])
//! 3. **Deflate** accepted eigenvectors by Gram-Schmidt projection ([`orthogonal`])
//! 4. **Reseed** from a normal draw that widens after every duplicate ([`search`])
//!
//! # Design Principles
//!
//! - **The solver is a collaborator**: the loop only sees [`solver::SolverFactory`]
//! - **Bounded retry**: every search ends with a result or [`EigError::SearchExhausted`]
//! - **Reproducible**: all randomness flows from one seedable RNG
//! - **Ground truth on hand**: [`SymmetricEigen`] (Jacobi) for comparison and tests
//!
//! # Quick Start
//!
//! ```rust
//! use eigseek::{config::SearchConfig, flow::RayleighFlowFactory, search::search_until_found};
//! use eigseek::{solver::TrainingBudget, Matrix};
//!
//! let a = Matrix::from_vec(2, 2, vec![2.0, 1.0, 1.0, 2.0]).unwrap();
//! let config = SearchConfig::new()
//!     .with_target_count(2)
//!     .with_seed(42)
//!     .with_budget(TrainingBudget::default().with_epochs(5_000).with_tolerance(1e-9));
//!
//! // The second round starts orthogonal to the first eigenvector found
//! let report = search_until_found(&a, &RayleighFlowFactory::new(), &config).unwrap();
//! let mut values = report.eigenvalues();
//! values.sort_by(f64::total_cmp);
//! assert!((values[0] - 1.0).abs() < 1e-6);
//! assert!((values[1] - 3.0).abs() < 1e-6);
//! ```

pub mod config;
pub mod eigen;
pub mod error;
pub mod flow;
pub mod io;
pub mod matrix;
pub mod oracle;
pub mod orthogonal;
pub mod search;
pub mod solver;
pub mod validate;
pub mod vector;

pub use config::SearchConfig;
pub use eigen::SymmetricEigen;
pub use error::{EigError, Result};
pub use matrix::Matrix;
pub use search::{EigenPair, SearchReport};
pub use vector::Vector;
