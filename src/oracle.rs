//! Exact solver collaborator
//!
//! [`SpectralOracle`] decomposes the matrix with [`SymmetricEigen`] and
//! answers each round with the exact eigenpair whose eigenvector overlaps the
//! starting point most. Deflated starting points have no overlap with the
//! eigenvectors already found, so the oracle walks the spectrum the way an
//! ideally trained model would. Useful for testing the search loop and for
//! sanity runs against a real matrix.
//!
//! The last decomposition is cached together with its source matrix and
//! reused only while `create` is called with an equal matrix.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::solver::{Candidate, EigenSolver, SolverFactory, TrainingBudget};
use crate::{EigError, Matrix, Result, SymmetricEigen, Vector};

type Cached = (Matrix<f64>, Arc<SymmetricEigen>);

/// Factory answering with exact eigenpairs
#[derive(Debug, Default)]
pub struct SpectralOracle {
    cache: Mutex<Option<Cached>>,
}

impl SpectralOracle {
    /// Oracle that decomposes the matrix on first use
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle reusing an existing decomposition of `matrix`
    ///
    /// # Errors
    ///
    /// `SizeMismatch` if `eigen` does not have the dimension of `matrix`.
    pub fn from_decomposition(matrix: &Matrix<f64>, eigen: SymmetricEigen) -> Result<Self> {
        let n = matrix.ensure_square()?;
        if eigen.len() != n {
            return Err(EigError::SizeMismatch {
                expected: n,
                actual: eigen.len(),
            });
        }
        Ok(Self {
            cache: Mutex::new(Some((matrix.clone(), Arc::new(eigen)))),
        })
    }

    fn decomposition(&self, matrix: &Matrix<f64>) -> Result<Arc<SymmetricEigen>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| EigError::Solver("oracle cache lock poisoned".to_string()))?;
        if let Some((source, eigen)) = cache.as_ref() {
            if source == matrix {
                return Ok(Arc::clone(eigen));
            }
        }

        let eigen = Arc::new(SymmetricEigen::new(matrix)?);
        debug!(n = eigen.len(), sweeps = eigen.sweeps(), "oracle decomposition ready");
        *cache = Some((matrix.clone(), Arc::clone(&eigen)));
        Ok(eigen)
    }
}

impl SolverFactory for SpectralOracle {
    type Solver = OracleSolver;

    fn create(&self, matrix: &Matrix<f64>, starting_point: &Vector<f64>) -> Result<OracleSolver> {
        let eigen = self.decomposition(matrix)?;
        if starting_point.len() != eigen.len() {
            return Err(EigError::SizeMismatch {
                expected: eigen.len(),
                actual: starting_point.len(),
            });
        }

        let mut best: Option<(f64, Candidate)> = None;
        for (eigenvalue, eigenvector) in eigen.iter() {
            let overlap = starting_point.dot(&eigenvector)?.abs();
            if best.as_ref().map_or(true, |(b, _)| overlap > *b) {
                best = Some((
                    overlap,
                    Candidate {
                        eigenvalue,
                        eigenvector,
                    },
                ));
            }
        }

        best.map(|(_, candidate)| OracleSolver { candidate })
            .ok_or_else(|| EigError::InvalidInput("empty decomposition".to_string()))
    }
}

/// Solver whose "training" is a no-op
#[derive(Debug, Clone)]
pub struct OracleSolver {
    candidate: Candidate,
}

impl EigenSolver for OracleSolver {
    fn train_model(&mut self, _budget: &TrainingBudget) -> Result<()> {
        Ok(())
    }

    fn compute_eig(&self) -> Result<Candidate> {
        Ok(self.candidate.clone())
    }
}
