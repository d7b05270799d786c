//! Matrix type for the eigenproblem instance
//!
//! # Example
//!
//! ```
//! use eigseek::Matrix;
//!
//! let m = Matrix::zeros(2, 3);
//! assert_eq!(m.rows(), 2);
//! assert_eq!(m.cols(), 3);
//! ```

use crate::{EigError, Result, Vector};

/// A 2D matrix with row-major storage
///
/// Data is stored in row-major format (C-style), where consecutive elements
/// in memory belong to the same row. This is the layout NumPy writes to
/// `.npy` files by default.
///
/// # Storage Layout
///
/// For a 2x3 matrix:
/// ```text
/// [[a, b, c],
///  [d, e, f]]
/// ```
/// Data is stored as: [a, b, c, d, e, f]
///
/// # Example
///
/// ```
/// use eigseek::Matrix;
///
/// let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(m.get(0, 1), Some(&2.0));
/// assert_eq!(m.get(1, 0), Some(&3.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> Matrix<T> {
    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// True if rows == cols
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Element at (row, col), or `None` if out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col)
    }

    /// Row-major backing data
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Row `i` as a slice
    pub fn row(&self, i: usize) -> Option<&[T]> {
        if i >= self.rows {
            return None;
        }
        Some(&self.data[i * self.cols..(i + 1) * self.cols])
    }
}

impl Matrix<f64> {
    /// Creates a matrix from a vector of data
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `data.len() != rows * cols`
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(EigError::InvalidInput(format!(
                "Data length {} does not match matrix dimensions {}x{} (expected {})",
                data.len(),
                rows,
                cols,
                rows * cols
            )));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Matrix of zeros
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// n x n identity matrix
    pub fn identity(n: usize) -> Self {
        Self::from_diagonal(&vec![1.0; n])
    }

    /// Square matrix with `diag` on the diagonal
    ///
    /// # Example
    ///
    /// ```
    /// use eigseek::Matrix;
    ///
    /// let d = Matrix::from_diagonal(&[1.0, 2.0, 3.0]);
    /// assert_eq!(d.get(1, 1), Some(&2.0));
    /// assert_eq!(d.get(0, 1), Some(&0.0));
    /// ```
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let n = diag.len();
        let mut m = Self::zeros(n, n);
        for (i, &d) in diag.iter().enumerate() {
            m.data[i * n + i] = d;
        }
        m
    }

    /// Transpose
    pub fn transpose(&self) -> Matrix<f64> {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Matrix-vector product `A·v`
    ///
    /// # Example
    ///
    /// ```
    /// use eigseek::{Matrix, Vector};
    ///
    /// let m = Matrix::from_vec(2, 2, vec![2.0, 1.0, 1.0, 2.0]).unwrap();
    /// let v = Vector::from_slice(&[1.0, 1.0]);
    /// assert_eq!(m.matvec(&v).unwrap().as_slice(), &[3.0, 3.0]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if `v.len() != cols`.
    pub fn matvec(&self, v: &Vector<f64>) -> Result<Vector<f64>> {
        if v.len() != self.cols {
            return Err(EigError::SizeMismatch {
                expected: self.cols,
                actual: v.len(),
            });
        }
        let x = v.as_slice();
        let data = self
            .data
            .chunks_exact(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().zip(x).map(|(a, b)| a * b).sum())
            .collect();
        Ok(Vector::from_vec(data))
    }

    /// Checks `|a_ij - a_ji| <= tol * max(1, |a_ij|)` for every pair
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.rows;
        for i in 0..n {
            for j in (i + 1)..n {
                let a = self.data[i * n + j];
                let b = self.data[j * n + i];
                if (a - b).abs() > tol * a.abs().max(1.0) {
                    return false;
                }
            }
        }
        true
    }

    /// Largest absolute row sum (infinity norm)
    ///
    /// By Gershgorin's theorem this bounds the magnitude of every eigenvalue.
    pub fn max_abs_row_sum(&self) -> f64 {
        self.data
            .chunks_exact(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().map(|x| x.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// Fails unless the matrix is square and non-empty
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` describing the offending shape.
    pub fn ensure_square(&self) -> Result<usize> {
        if !self.is_square() {
            return Err(EigError::InvalidInput(format!(
                "Matrix must be square, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.rows == 0 {
            return Err(EigError::InvalidInput("Matrix is empty".to_string()));
        }
        Ok(self.rows)
    }
}
