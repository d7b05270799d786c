use std::time::Instant;

use tracing::info;

use super::{EigenPair, SearchReport};
use crate::config::SearchConfig;
use crate::orthogonal::create_orthogonal;
use crate::solver::{train_candidate, SolverFactory};
use crate::validate::check_eig;
use crate::{Matrix, Result, Vector};

/// One training round per dimension, no retries
///
/// Round `i` trains from the current starting point and records whatever
/// comes out; a failed eigenpair test only logs a warning. The next starting
/// point is a random unit vector orthogonal to every vector recorded so far.
/// Returns exactly `n` pairs.
///
/// `target_count`, `max_rounds` and the duplicate tolerances of `config` are
/// not used.
///
/// # Errors
///
/// - `InvalidInput` if the matrix is not square or is empty
/// - `DegenerateSubspace` from [`create_orthogonal`] if a projected restart
///   collapses
/// - solver errors from the factory or training run
pub fn find_eigenvectors<F: SolverFactory>(
    matrix: &Matrix<f64>,
    factory: &F,
    config: &SearchConfig,
) -> Result<SearchReport> {
    config.budget.validate()?;
    let n = matrix.ensure_square()?;

    let started = Instant::now();
    let mut rng = config.rng();
    let mut starting_point = Vector::standard_normal(n, &mut rng);
    let mut pairs: Vec<EigenPair> = Vec::with_capacity(n);
    let mut invalid = 0;

    for i in 0..n {
        info!(index = i, "finding eigenvector");
        let candidate = train_candidate(factory, matrix, &starting_point, &config.budget)?;
        if !check_eig(
            candidate.eigenvalue,
            &candidate.eigenvector,
            matrix,
            config.residual_tolerance,
            config.check_mode,
        )? {
            invalid += 1;
        }

        pairs.push(EigenPair {
            value: candidate.eigenvalue,
            vector: candidate.eigenvector,
        });

        if i + 1 < n {
            let recorded: Vec<Vector<f64>> = pairs.iter().map(|p| p.vector.clone()).collect();
            starting_point = create_orthogonal(&recorded, n, &mut rng)?;
        }
    }

    Ok(SearchReport {
        pairs,
        rounds: n,
        duplicates: 0,
        invalid,
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}
