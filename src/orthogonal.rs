//! Gram-Schmidt projection helpers
//!
//! [`deflate`] removes the components of a vector that lie along an
//! already-found set of eigenvectors. [`create_orthogonal`] applies the same
//! projection to a random standard-normal draw and normalizes the result,
//! yielding a fresh unit direction orthogonal to the whole set.
//!
//! Both assume the input set is pairwise orthogonal; classical Gram-Schmidt
//! does not re-orthogonalize the basis itself.

use rand::Rng;

use crate::{EigError, Result, Vector};

/// Collapse threshold for the norm of a freshly projected random vector
///
/// A standard-normal draw in R^n has norm about sqrt(n). Anything left below
/// this fraction of it after projection is round-off, not a direction.
pub(crate) const DEGENERATE_RATIO: f64 = 1e-10;

/// Projection of `v` onto the direction of `u`: `(v·u / u·u) u`
///
/// Projection onto the zero vector is the zero vector.
///
/// # Example
///
/// ```
/// use eigseek::{orthogonal::normalized_proj, Vector};
///
/// let v = Vector::from_slice(&[2.0, 3.0]);
/// let u = Vector::from_slice(&[2.0, 0.0]);
/// assert_eq!(normalized_proj(&v, &u).unwrap().as_slice(), &[2.0, 0.0]);
/// ```
///
/// # Errors
///
/// Returns [`EigError::SizeMismatch`] if the lengths differ.
pub fn normalized_proj(v: &Vector<f64>, u: &Vector<f64>) -> Result<Vector<f64>> {
    let uu = u.dot(u)?;
    if uu == 0.0 {
        return Ok(Vector::zeros(u.len()));
    }
    Ok(u.scale(v.dot(u)? / uu))
}

/// Subtract from `v` its projection onto every vector in `basis`
///
/// The result is not renormalized.
///
/// # Errors
///
/// Returns [`EigError::SizeMismatch`] if any basis vector has a different length.
pub fn deflate<'a, I>(v: &Vector<f64>, basis: I) -> Result<Vector<f64>>
where
    I: IntoIterator<Item = &'a Vector<f64>>,
{
    let mut out = v.clone();
    for u in basis {
        let uu = u.dot(u)?;
        if uu == 0.0 {
            continue;
        }
        let coeff = out.dot(u)? / uu;
        out.sub_scaled(coeff, u)?;
    }
    Ok(out)
}

/// Random unit vector in R^`dimension` orthogonal to every vector in `vectors`
///
/// # Example
///
/// ```
/// use eigseek::{orthogonal::create_orthogonal, Vector};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(1);
/// let e0 = Vector::from_slice(&[1.0, 0.0, 0.0]);
/// let w = create_orthogonal(&[e0.clone()], 3, &mut rng).unwrap();
///
/// assert!((w.norm() - 1.0).abs() < 1e-12);
/// assert!(w.dot(&e0).unwrap().abs() < 1e-12);
/// ```
///
/// # Errors
///
/// - [`EigError::DegenerateSubspace`] if `vectors.len() >= dimension`, or if
///   the projected draw collapses to (numerically) zero
/// - [`EigError::InvalidInput`] if `dimension == 0`
/// - [`EigError::SizeMismatch`] if an input vector is not of length `dimension`
pub fn create_orthogonal<R: Rng + ?Sized>(
    vectors: &[Vector<f64>],
    dimension: usize,
    rng: &mut R,
) -> Result<Vector<f64>> {
    if dimension == 0 {
        return Err(EigError::InvalidInput(
            "cannot draw an orthogonal vector in R^0".to_string(),
        ));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(EigError::SizeMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }
    if vectors.len() >= dimension {
        return Err(EigError::DegenerateSubspace {
            vectors: vectors.len(),
            dimension,
        });
    }

    let draw = Vector::standard_normal(dimension, rng);
    let projected = deflate(&draw, vectors)?;

    let norm = projected.norm();
    if norm.is_nan() || norm <= DEGENERATE_RATIO * draw.norm() {
        return Err(EigError::DegenerateSubspace {
            vectors: vectors.len(),
            dimension,
        });
    }
    Ok(projected.scale(1.0 / norm))
}
