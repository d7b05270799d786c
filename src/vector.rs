//! Dense vector type used for eigenvector estimates and starting points

use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::{EigError, Result};

/// Dense vector of real components
///
/// # Examples
///
/// ```
/// use eigseek::Vector;
///
/// let a = Vector::from_slice(&[1.0, 2.0, 3.0]);
/// let b = Vector::from_slice(&[4.0, 5.0, 6.0]);
/// let result = a.add(&b).unwrap();
///
/// assert_eq!(result.as_slice(), &[5.0, 7.0, 9.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector<T> {
    data: Vec<T>,
}

impl<T> Vector<T>
where
    T: Clone,
{
    /// Create vector from slice
    ///
    /// # Examples
    ///
    /// ```
    /// use eigseek::Vector;
    ///
    /// let v = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(v.len(), 4);
    /// ```
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Create vector taking ownership of `data`
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    /// Get underlying data as slice
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consume the vector and return its components
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get vector length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if vector is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use eigseek::Vector;
    ///
    /// let v1: Vector<f64> = Vector::from_slice(&[]);
    /// assert!(v1.is_empty());
    ///
    /// let v2 = Vector::from_slice(&[1.0]);
    /// assert!(!v2.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Vector<f64> {
    /// Vector of `n` zeros
    pub fn zeros(n: usize) -> Self {
        Self { data: vec![0.0; n] }
    }

    /// Standard basis vector `e_index` in R^n
    ///
    /// # Errors
    ///
    /// Returns [`EigError::InvalidInput`] if `index >= n`.
    pub fn basis(n: usize, index: usize) -> Result<Self> {
        if index >= n {
            return Err(EigError::InvalidInput(format!(
                "basis index {} out of range for dimension {}",
                index, n
            )));
        }
        let mut data = vec![0.0; n];
        data[index] = 1.0;
        Ok(Self { data })
    }

    /// Draw `n` components from the standard normal distribution
    pub fn standard_normal<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let data = (0..n).map(|_| StandardNormal.sample(rng)).collect();
        Self { data }
    }

    /// Draw `n` components from N(mean, std_dev²)
    ///
    /// # Errors
    ///
    /// Returns [`EigError::InvalidInput`] if `std_dev` is negative or not finite.
    pub fn normal<R: Rng + ?Sized>(n: usize, mean: f64, std_dev: f64, rng: &mut R) -> Result<Self> {
        let dist = Normal::new(mean, std_dev).map_err(|e| {
            EigError::InvalidInput(format!("normal distribution with std {}: {}", std_dev, e))
        })?;
        let data = (0..n).map(|_| dist.sample(rng)).collect();
        Ok(Self { data })
    }

    fn check_len(&self, other: &Self) -> Result<()> {
        if self.len() != other.len() {
            return Err(EigError::SizeMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        Ok(())
    }

    /// Element-wise addition
    ///
    /// # Errors
    ///
    /// Returns [`EigError::SizeMismatch`] if vectors have different lengths.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_len(other)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a + b)
            .collect();
        Ok(Self { data })
    }

    /// Element-wise subtraction
    ///
    /// # Errors
    ///
    /// Returns [`EigError::SizeMismatch`] if vectors have different lengths.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_len(other)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Ok(Self { data })
    }

    /// Element-wise division
    ///
    /// Zero divisors produce infinities or NaN, as in IEEE arithmetic.
    ///
    /// # Errors
    ///
    /// Returns [`EigError::SizeMismatch`] if vectors have different lengths.
    pub fn div(&self, other: &Self) -> Result<Self> {
        self.check_len(other)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a / b)
            .collect();
        Ok(Self { data })
    }

    /// Multiply every component by `factor`
    ///
    /// # Examples
    ///
    /// ```
    /// use eigseek::Vector;
    ///
    /// let v = Vector::from_slice(&[1.0, -2.0]);
    /// assert_eq!(v.scale(3.0).as_slice(), &[3.0, -6.0]);
    /// ```
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            data: self.data.iter().map(|x| x * factor).collect(),
        }
    }

    /// In-place `self -= factor * other`
    ///
    /// # Errors
    ///
    /// Returns [`EigError::SizeMismatch`] if vectors have different lengths.
    pub fn sub_scaled(&mut self, factor: f64, other: &Self) -> Result<()> {
        self.check_len(other)?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a -= factor * b;
        }
        Ok(())
    }

    /// Dot product
    ///
    /// # Examples
    ///
    /// ```
    /// use eigseek::Vector;
    ///
    /// let a = Vector::from_slice(&[1.0, 2.0, 3.0]);
    /// let b = Vector::from_slice(&[4.0, 5.0, 6.0]);
    /// assert_eq!(a.dot(&b).unwrap(), 32.0);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`EigError::SizeMismatch`] if vectors have different lengths.
    pub fn dot(&self, other: &Self) -> Result<f64> {
        self.check_len(other)?;
        Ok(self.data.iter().zip(&other.data).map(|(a, b)| a * b).sum())
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Unit vector in the same direction
    ///
    /// # Errors
    ///
    /// Returns [`EigError::DivisionByZero`] for the zero vector, and
    /// [`EigError::InvalidInput`] if any component is not finite.
    pub fn normalize(&self) -> Result<Self> {
        let norm = self.norm();
        if !norm.is_finite() {
            return Err(EigError::InvalidInput(
                "cannot normalize a vector with non-finite components".to_string(),
            ));
        }
        if norm == 0.0 {
            return Err(EigError::DivisionByZero);
        }
        Ok(self.scale(1.0 / norm))
    }

    /// True if every component is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}
