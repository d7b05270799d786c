//! Eigenpair validation
//!
//! A candidate `(λ, v)` coming out of a training run is only an estimate.
//! [`check_eig`] decides whether it satisfies `A·v ≈ λ·v` closely enough to be
//! accepted. Failures are reported with a `warn!` and a `false` verdict, never
//! an error: a bad candidate just means another round of training.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{EigError, Matrix, Result, Vector};

/// Default relative tolerance for the eigenpair test
///
/// Generous on purpose: trained estimates are noisy.
pub const DEFAULT_RESIDUAL_TOLERANCE: f64 = 0.2;

/// Absolute slack of the componentwise test, as in `numpy.allclose`
const ALLCLOSE_ATOL: f64 = 1e-8;

/// How `A·v ≈ λ·v` is tested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// `‖A·v − λv‖ / (|λ|‖v‖) < tol`
    #[default]
    Residual,
    /// Every entry of `(A·v) / v / λ` within `tol` (relative) of 1
    ///
    /// Divides by each component of `v`, so any component at or near zero
    /// makes the ratio meaningless and the test fails.
    Componentwise,
}

/// Check that `eigvec` is an eigenvector of `a` with eigenvalue `eigval`
///
/// # Example
///
/// ```
/// use eigseek::{validate::{check_eig, CheckMode}, Matrix, Vector};
///
/// let a = Matrix::from_diagonal(&[1.0, 2.0, 3.0]);
/// let e1 = Vector::from_slice(&[0.0, 1.0, 0.0]);
///
/// assert!(check_eig(2.0, &e1, &a, 0.2, CheckMode::Residual).unwrap());
/// assert!(!check_eig(3.0, &e1, &a, 0.2, CheckMode::Residual).unwrap());
/// ```
///
/// # Errors
///
/// Returns [`EigError::SizeMismatch`] if `eigvec` does not match `a`.
pub fn check_eig(
    eigval: f64,
    eigvec: &Vector<f64>,
    a: &Matrix<f64>,
    tolerance: f64,
    mode: CheckMode,
) -> Result<bool> {
    let av = a.matvec(eigvec)?;
    if av.len() != eigvec.len() {
        return Err(EigError::SizeMismatch {
            expected: av.len(),
            actual: eigvec.len(),
        });
    }

    let verdict = match mode {
        CheckMode::Residual => residual_ok(eigval, eigvec, &av, tolerance)?,
        CheckMode::Componentwise => componentwise_ok(eigval, eigvec, &av, tolerance)?,
    };

    if !verdict {
        warn!(
            eigenvalue = eigval,
            mode = ?mode,
            "eigenvector ({:?}) might not be an eigenvector of A",
            eigvec.as_slice()
        );
    }
    Ok(verdict)
}

/// Like [`check_eig`], but a failed check becomes [`EigError::InvalidEigenpair`]
///
/// # Errors
///
/// [`EigError::InvalidEigenpair`] on a failed check, [`EigError::SizeMismatch`]
/// on a dimension error.
pub fn ensure_eigenpair(
    eigval: f64,
    eigvec: &Vector<f64>,
    a: &Matrix<f64>,
    tolerance: f64,
    mode: CheckMode,
) -> Result<()> {
    if check_eig(eigval, eigvec, a, tolerance, mode)? {
        Ok(())
    } else {
        Err(EigError::InvalidEigenpair { eigenvalue: eigval })
    }
}

/// Relative residual `‖A·v − λv‖ / (|λ|‖v‖)`
///
/// For `λ = 0` the denominator falls back to `‖v‖`.
///
/// # Errors
///
/// [`EigError::SizeMismatch`] on a dimension error, [`EigError::DivisionByZero`]
/// for the zero vector.
pub fn relative_residual(eigval: f64, eigvec: &Vector<f64>, a: &Matrix<f64>) -> Result<f64> {
    let av = a.matvec(eigvec)?;
    residual(eigval, eigvec, &av)
}

fn residual(eigval: f64, v: &Vector<f64>, av: &Vector<f64>) -> Result<f64> {
    let v_norm = v.norm();
    if v_norm == 0.0 {
        return Err(EigError::DivisionByZero);
    }
    let diff = av.sub(&v.scale(eigval))?.norm();
    let scale = if eigval == 0.0 {
        v_norm
    } else {
        eigval.abs() * v_norm
    };
    Ok(diff / scale)
}

fn residual_ok(eigval: f64, v: &Vector<f64>, av: &Vector<f64>, tol: f64) -> Result<bool> {
    match residual(eigval, v, av) {
        Ok(r) => Ok(r.is_finite() && r < tol),
        Err(EigError::DivisionByZero) => Ok(false),
        Err(e) => Err(e),
    }
}

fn componentwise_ok(eigval: f64, v: &Vector<f64>, av: &Vector<f64>, tol: f64) -> Result<bool> {
    let ratios = av.div(v)?.scale(1.0 / eigval);
    Ok(ratios
        .as_slice()
        .iter()
        .all(|r| r.is_finite() && (r - 1.0).abs() <= ALLCLOSE_ATOL + tol))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag123() -> Matrix<f64> {
        Matrix::from_diagonal(&[1.0, 2.0, 3.0])
    }

    #[test]
    fn test_basis_vectors_are_eigenvectors() {
        let a = diag123();
        for (i, lambda) in [1.0, 2.0, 3.0].into_iter().enumerate() {
            let e = Vector::basis(3, i).unwrap();
            assert!(check_eig(lambda, &e, &a, 0.2, CheckMode::Residual).unwrap());
        }
    }

    #[test]
    fn test_perturbed_vector_is_rejected() {
        let a = diag123();
        let v = Vector::from_slice(&[0.0, 1.0, 0.5]);
        assert!(!check_eig(2.0, &v, &a, 0.2, CheckMode::Residual).unwrap());
    }

    #[test]
    fn test_small_perturbation_within_tolerance() {
        let a = diag123();
        let v = Vector::from_slice(&[0.01, 1.0, 0.01]);
        assert!(check_eig(2.0, &v, &a, 0.2, CheckMode::Residual).unwrap());
    }

    #[test]
    fn test_componentwise_exact_pair() {
        // [[2,1],[1,2]] has eigenvector (1,1) for λ=3 with no zero components
        let a = Matrix::from_vec(2, 2, vec![2.0, 1.0, 1.0, 2.0]).unwrap();
        let v = Vector::from_slice(&[1.0, 1.0]);
        assert!(check_eig(3.0, &v, &a, 0.2, CheckMode::Componentwise).unwrap());
        assert!(!check_eig(1.0, &v, &a, 0.2, CheckMode::Componentwise).unwrap());
    }

    #[test]
    fn test_componentwise_tolerance_boundary() {
        let a = Matrix::from_diagonal(&[1.0, 1.1]);
        let v = Vector::from_slice(&[1.0, 1.0]);
        // Ratios are [1.0, 1.1]
        assert!(check_eig(1.0, &v, &a, 0.2, CheckMode::Componentwise).unwrap());
        assert!(!check_eig(1.0, &v, &a, 0.05, CheckMode::Componentwise).unwrap());
    }

    #[test]
    fn test_componentwise_zero_component_fails() {
        let a = diag123();
        let e = Vector::basis(3, 0).unwrap();
        assert!(!check_eig(1.0, &e, &a, 0.2, CheckMode::Componentwise).unwrap());
    }

    #[test]
    fn test_zero_eigenvalue() {
        let a = Matrix::from_diagonal(&[0.0, 2.0]);
        let e0 = Vector::basis(2, 0).unwrap();
        assert!(check_eig(0.0, &e0, &a, 0.2, CheckMode::Residual).unwrap());
        assert!(!check_eig(0.0, &e0, &a, 0.2, CheckMode::Componentwise).unwrap());
    }

    #[test]
    fn test_zero_vector_is_never_an_eigenvector() {
        let a = diag123();
        assert!(!check_eig(1.0, &Vector::zeros(3), &a, 0.2, CheckMode::Residual).unwrap());
    }

    #[test]
    fn test_size_mismatch() {
        let a = diag123();
        let v = Vector::from_slice(&[1.0, 0.0]);
        assert!(matches!(
            check_eig(1.0, &v, &a, 0.2, CheckMode::Residual),
            Err(EigError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_ensure_eigenpair() {
        let a = diag123();
        let e2 = Vector::basis(3, 2).unwrap();
        assert!(ensure_eigenpair(3.0, &e2, &a, 0.2, CheckMode::Residual).is_ok());
        assert!(matches!(
            ensure_eigenpair(1.0, &e2, &a, 0.2, CheckMode::Residual),
            Err(EigError::InvalidEigenpair { eigenvalue }) if eigenvalue == 1.0
        ));
    }

    #[test]
    fn test_relative_residual() {
        let a = diag123();
        let v = Vector::from_slice(&[0.0, 1.0, 0.0]);
        assert_eq!(relative_residual(2.0, &v, &a).unwrap(), 0.0);
        // ‖(0,2,0) − 1·(0,1,0)‖ / (1·1) = 1
        assert!((relative_residual(1.0, &v, &a).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_check_mode_serde() {
        assert_eq!(
            serde_json::to_string(&CheckMode::Componentwise).unwrap(),
            "\"componentwise\""
        );
        let mode: CheckMode = serde_json::from_str("\"residual\"").unwrap();
        assert_eq!(mode, CheckMode::Residual);
    }
}
