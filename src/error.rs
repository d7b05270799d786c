//! Error types for eigseek operations

use std::path::PathBuf;

use thiserror::Error;

/// Result type for eigseek operations
pub type Result<T> = std::result::Result<T, EigError>;

/// Errors that can occur while searching for eigenpairs
#[derive(Debug, Error)]
pub enum EigError {
    /// Size mismatch between operands
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Division by zero (e.g., normalizing zero vector)
    #[error("Division by zero")]
    DivisionByZero,

    /// Candidate failed the eigenvector residual test
    #[error("Invalid eigenpair: vector is not an eigenvector for eigenvalue {eigenvalue}")]
    InvalidEigenpair {
        /// Eigenvalue estimate of the rejected candidate
        eigenvalue: f64,
    },

    /// No direction left orthogonal to the given vectors
    #[error("Degenerate subspace: {vectors} vectors leave no orthogonal direction in R^{dimension}")]
    DegenerateSubspace {
        /// Number of vectors projected out
        vectors: usize,
        /// Dimension of the ambient space
        dimension: usize,
    },

    /// Retry or time budget ran out before the target count was reached
    #[error("Search exhausted after {rounds} rounds: found {found} of {target} eigenpairs")]
    SearchExhausted {
        /// Eigenpairs accepted before giving up
        found: usize,
        /// Requested number of eigenpairs
        target: usize,
        /// Training rounds performed
        rounds: usize,
    },

    /// Solver collaborator failed during training
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration field failed validation
    #[error("Invalid configuration for `{field}`: {reason}")]
    Config {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// File could not be read or written
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// `.npy` payload could not be decoded
    #[error("NPY error: {0}")]
    Npy(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EigError {
    /// Shorthand for a [`EigError::Config`] error
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        EigError::Config {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_error() {
        let err = EigError::SizeMismatch {
            expected: 10,
            actual: 5,
        };
        assert_eq!(err.to_string(), "Size mismatch: expected 10, got 5");
    }

    #[test]
    fn test_invalid_input_error() {
        let err = EigError::InvalidInput("Empty matrix".to_string());
        assert_eq!(err.to_string(), "Invalid input: Empty matrix");
    }

    #[test]
    fn test_division_by_zero_error() {
        let err = EigError::DivisionByZero;
        assert_eq!(err.to_string(), "Division by zero");
    }

    #[test]
    fn test_degenerate_subspace_error() {
        let err = EigError::DegenerateSubspace {
            vectors: 3,
            dimension: 3,
        };
        assert_eq!(
            err.to_string(),
            "Degenerate subspace: 3 vectors leave no orthogonal direction in R^3"
        );
    }

    #[test]
    fn test_search_exhausted_error() {
        let err = EigError::SearchExhausted {
            found: 2,
            target: 6,
            rounds: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Search exhausted after 1000 rounds: found 2 of 6 eigenpairs"
        );
    }

    #[test]
    fn test_config_error() {
        let err = EigError::config("residual_tolerance", "must be > 0");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for `residual_tolerance`: must be > 0"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = EigError::Io {
            path: PathBuf::from("A.npy"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().starts_with("I/O error at A.npy"));
        assert!(err.source().is_some());
    }
}
