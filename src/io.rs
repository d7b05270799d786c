//! Matrix and report files
//!
//! The problem matrix arrives as a NumPy `.npy` file holding a 2-D float
//! array. `f8` is read as is, `f4` is widened to `f64`; Fortran-ordered
//! arrays are converted to row-major. Search reports are written as JSON.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::{Array2, ArrayD, Ix2};
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyExt};
use tracing::debug;

use crate::search::SearchReport;
use crate::{EigError, Matrix, Result};

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| EigError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| EigError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn npy_error(path: &Path, err: impl std::fmt::Display) -> EigError {
    EigError::Npy(format!("{}: {}", path.display(), err))
}

fn read_f64_array(path: &Path) -> Result<ArrayD<f64>> {
    match ArrayD::<f64>::read_npy(open(path)?) {
        Ok(array) => Ok(array),
        Err(ReadNpyError::WrongDescriptor(_)) => {
            let array = ArrayD::<f32>::read_npy(open(path)?).map_err(|e| npy_error(path, e))?;
            debug!(path = %path.display(), "widening f32 array to f64");
            Ok(array.mapv(f64::from))
        }
        Err(e) => Err(npy_error(path, e)),
    }
}

/// Load a square matrix from a `.npy` file
///
/// Symmetry is not checked here.
///
/// # Errors
///
/// - `Io` if the file cannot be opened
/// - `Npy` if it is not a 2-D `f4`/`f8` array
/// - `InvalidInput` if the array is not square or is empty
pub fn load_matrix_npy(path: &Path) -> Result<Matrix<f64>> {
    let array = read_f64_array(path)?;
    let shape = array.shape().to_vec();
    let array = array
        .into_dimensionality::<Ix2>()
        .map_err(|_| npy_error(path, format!("expected a 2-D array, got shape {:?}", shape)))?;

    let (rows, cols) = array.dim();
    let data: Vec<f64> = array.iter().copied().collect();
    let matrix = Matrix::from_vec(rows, cols, data)?;
    matrix.ensure_square()?;
    debug!(path = %path.display(), n = rows, "loaded matrix");
    Ok(matrix)
}

/// Write a matrix as a row-major `f8` `.npy` file
///
/// # Errors
///
/// `Io` if the file cannot be created, `Npy` if encoding fails.
pub fn save_matrix_npy(matrix: &Matrix<f64>, path: &Path) -> Result<()> {
    let array = Array2::from_shape_vec(matrix.shape(), matrix.as_slice().to_vec())
        .map_err(|e| npy_error(path, e))?;
    let mut writer = create(path)?;
    array
        .write_npy(&mut writer)
        .map_err(|e| npy_error(path, e))?;
    writer.flush().map_err(|source| EigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a search report as pretty-printed JSON
///
/// # Errors
///
/// `Io` if the file cannot be created, `Json` if serialization fails.
pub fn write_report_json(report: &SearchReport, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush().map_err(|source| EigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::EigenPair;
    use crate::Vector;

    #[test]
    fn test_npy_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.npy");
        let a = Matrix::from_vec(2, 2, vec![2.0, -1.0, -1.0, 2.0]).unwrap();

        save_matrix_npy(&a, &path).unwrap();
        assert_eq!(load_matrix_npy(&path).unwrap(), a);
    }

    #[test]
    fn test_f32_is_widened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A32.npy");
        let array = ndarray::arr2(&[[1.5f32, 0.25], [0.25, -3.0]]);
        array.write_npy(File::create(&path).unwrap()).unwrap();

        let a = load_matrix_npy(&path).unwrap();
        assert_eq!(a.as_slice(), &[1.5, 0.25, 0.25, -3.0]);
    }

    #[test]
    fn test_fortran_order_is_row_major_after_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("F.npy");
        let array = ndarray::arr2(&[[1.0f64, 2.0], [3.0, 4.0]]);
        array.t().write_npy(File::create(&path).unwrap()).unwrap();

        let a = load_matrix_npy(&path).unwrap();
        assert_eq!(a.as_slice(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_rejects_non_square() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rect.npy");
        Array2::<f64>::zeros((2, 3))
            .write_npy(File::create(&path).unwrap())
            .unwrap();
        assert!(matches!(
            load_matrix_npy(&path),
            Err(EigError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_one_dimensional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.npy");
        ndarray::arr1(&[1.0f64, 2.0, 3.0])
            .write_npy(File::create(&path).unwrap())
            .unwrap();
        assert!(matches!(load_matrix_npy(&path), Err(EigError::Npy(_))));
    }

    #[test]
    fn test_rejects_integer_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("i.npy");
        ndarray::arr2(&[[1i64, 0], [0, 1]])
            .write_npy(File::create(&path).unwrap())
            .unwrap();
        assert!(matches!(load_matrix_npy(&path), Err(EigError::Npy(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_matrix_npy(Path::new("/nonexistent/A.npy")),
            Err(EigError::Io { .. })
        ));
    }

    #[test]
    fn test_write_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = SearchReport {
            pairs: vec![EigenPair {
                value: 2.0,
                vector: Vector::from_slice(&[0.0, 1.0]),
            }],
            rounds: 3,
            duplicates: 1,
            invalid: 1,
            elapsed_secs: 0.5,
        };

        write_report_json(&report, &path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["rounds"], 3);
        assert_eq!(json["pairs"][0]["value"], 2.0);
        assert_eq!(json["pairs"][0]["vector"], serde_json::json!([0.0, 1.0]));
    }
}
