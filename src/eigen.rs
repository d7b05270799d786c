//! Reference eigendecomposition for symmetric matrices
//!
//! Search results are heuristic. This module computes the exact spectrum with
//! the cyclic Jacobi eigenvalue algorithm so a run can be compared against
//! ground truth, and backs [`crate::oracle::SpectralOracle`].
//!
//! # Example
//!
//! ```
//! use eigseek::{Matrix, SymmetricEigen};
//!
//! let a = Matrix::from_vec(2, 2, vec![
//!     2.0, 1.0,
//!     1.0, 2.0,
//! ]).unwrap();
//!
//! let eigen = SymmetricEigen::new(&a).unwrap();
//!
//! // Ascending order, like LAPACK's `syevd`
//! let values = eigen.eigenvalues();
//! assert!((values[0] - 1.0).abs() < 1e-12);
//! assert!((values[1] - 3.0).abs() < 1e-12);
//! ```

use crate::{EigError, Matrix, Result, Vector};

/// Maximum number of sweeps for Jacobi algorithm convergence
/// Each sweep processes all n(n-1)/2 off-diagonal elements once
const MAX_JACOBI_SWEEPS: usize = 100;

/// Convergence threshold for off-diagonal elements (relative to Frobenius norm)
const CONVERGENCE_THRESHOLD: f64 = 1e-14;

/// Symmetric matrix eigendecomposition
///
/// Eigenvalues are sorted ascending. Eigenvectors are stored as the columns
/// of an orthonormal matrix, column `i` belonging to `eigenvalues()[i]`.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    eigenvalues: Vec<f64>,
    eigenvectors: Matrix<f64>,
    sweeps: usize,
}

impl SymmetricEigen {
    /// Computes eigendecomposition of a symmetric matrix
    ///
    /// Only the upper triangle's symmetric counterpart is assumed; the input
    /// is not checked for symmetry.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if matrix is not square or empty
    /// - `InvalidInput` if the algorithm fails to converge
    pub fn new(matrix: &Matrix<f64>) -> Result<Self> {
        let n = matrix.ensure_square()?;
        let mut a = matrix.as_slice().to_vec();

        let frobenius_sq: f64 = a.iter().map(|x| x * x).sum();
        let tolerance = CONVERGENCE_THRESHOLD * frobenius_sq.sqrt().max(1.0);

        let mut v = vec![0.0f64; n * n];
        for i in 0..n {
            v[i * n + i] = 1.0;
        }

        for sweep in 0..MAX_JACOBI_SWEEPS {
            let mut converged = true;

            for i in 0..n {
                for j in (i + 1)..n {
                    if a[i * n + j].abs() < tolerance {
                        continue;
                    }
                    converged = false;
                    Self::jacobi_rotate(&mut a, &mut v, n, i, j);
                }
            }

            if converged {
                return Self::sorted(&a, &v, n, sweep + 1);
            }
        }

        Err(EigError::InvalidInput(format!(
            "Jacobi algorithm failed to converge after {} sweeps",
            MAX_JACOBI_SWEEPS
        )))
    }

    fn sorted(a: &[f64], v: &[f64], n: usize, sweeps: usize) -> Result<Self> {
        let diagonal: Vec<f64> = (0..n).map(|i| a[i * n + i]).collect();

        let mut indices: Vec<usize> = (0..n).collect();
        indices.sort_by(|&i, &j| diagonal[i].total_cmp(&diagonal[j]));

        let eigenvalues = indices.iter().map(|&i| diagonal[i]).collect();
        let mut columns = vec![0.0f64; n * n];
        for (new_col, &old_col) in indices.iter().enumerate() {
            for row in 0..n {
                columns[row * n + new_col] = v[row * n + old_col];
            }
        }

        Ok(SymmetricEigen {
            eigenvalues,
            eigenvectors: Matrix::from_vec(n, n, columns)?,
            sweeps,
        })
    }

    /// Apply Jacobi rotation to zero out a[p][q] and a[q][p]
    ///
    /// Uses the numerically stable formula from:
    /// Golub & Van Loan, "Matrix Computations", 4th Edition
    #[inline]
    fn jacobi_rotate(a: &mut [f64], v: &mut [f64], n: usize, p: usize, q: usize) {
        let app = a[p * n + p];
        let aqq = a[q * n + q];
        let apq = a[p * n + q];

        // t = sign(tau) / (|tau| + sqrt(1 + tau^2)) avoids cancellation
        let tau = (aqq - app) / (2.0 * apq);
        let t = if tau >= 0.0 {
            1.0 / (tau + (1.0 + tau * tau).sqrt())
        } else {
            -1.0 / (-tau + (1.0 + tau * tau).sqrt())
        };
        let c = 1.0 / (1.0 + t * t).sqrt();
        let s = t * c;

        a[p * n + p] = app - t * apq;
        a[q * n + q] = aqq + t * apq;
        a[p * n + q] = 0.0;
        a[q * n + p] = 0.0;

        for k in 0..n {
            if k != p && k != q {
                let akp = a[k * n + p];
                let akq = a[k * n + q];
                a[k * n + p] = c * akp - s * akq;
                a[p * n + k] = a[k * n + p];
                a[k * n + q] = s * akp + c * akq;
                a[q * n + k] = a[k * n + q];
            }
        }

        for k in 0..n {
            let vkp = v[k * n + p];
            let vkq = v[k * n + q];
            v[k * n + p] = c * vkp - s * vkq;
            v[k * n + q] = s * vkp + c * vkq;
        }
    }

    /// Eigenvalues in ascending order
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Eigenvector matrix, one eigenvector per column
    pub fn eigenvectors(&self) -> &Matrix<f64> {
        &self.eigenvectors
    }

    /// Number of Jacobi sweeps until convergence
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Number of eigenpairs
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    /// True if there are no eigenpairs
    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Eigenvector `i` (column `i`), or `None` if out of bounds
    pub fn eigenvector(&self, i: usize) -> Option<Vector<f64>> {
        if i >= self.eigenvalues.len() {
            return None;
        }
        Some(self.column(i))
    }

    fn column(&self, i: usize) -> Vector<f64> {
        let n = self.eigenvectors.rows();
        let data = self.eigenvectors.as_slice();
        Vector::from_vec((0..n).map(|row| data[row * n + i]).collect())
    }

    /// Iterator over (eigenvalue, eigenvector) pairs in ascending order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (f64, Vector<f64>)> + '_ {
        (0..self.len()).map(move |i| (self.eigenvalues[i], self.column(i)))
    }

    /// Reference eigenvalue nearest to `value`, with its absolute error
    pub fn closest(&self, value: f64) -> Option<(f64, f64)> {
        self.eigenvalues
            .iter()
            .map(|&e| (e, (e - value).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
