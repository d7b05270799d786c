use std::time::Instant;

use tracing::{debug, info};

use super::{EigenPair, SearchReport};
use crate::config::SearchConfig;
use crate::solver::{train_candidate, Candidate, SolverFactory, TrainingBudget};
use crate::validate::check_eig;
use crate::{EigError, Matrix, Result, Vector};

/// Train from `number_of_points` independent random starts, keep the distinct results
///
/// All starting points are drawn from `config`'s RNG before any training,
/// so a seeded run is reproducible with or without the `parallel` feature.
/// `budget` replaces `config.budget` when set (see
/// [`TrainingBudget::batch_reference`] for the classic batch settings), and
/// `learning_rate` then overrides its learning rate.
///
/// Candidates failing the eigenpair test are dropped. The survivors are
/// deduplicated in order: a value is kept unless some already-kept `λu`
/// satisfies `|λu − λ| < batch_dedup_tolerance · |λ|`.
///
/// # Errors
///
/// - `InvalidInput` if `number_of_points` is zero or the matrix is not square
/// - `Config` if the budget is invalid
/// - the first solver error, in starting-point order
pub fn many_random_points<F>(
    matrix: &Matrix<f64>,
    factory: &F,
    number_of_points: usize,
    budget: Option<&TrainingBudget>,
    learning_rate: Option<f64>,
    config: &SearchConfig,
) -> Result<SearchReport>
where
    F: SolverFactory + Sync,
{
    if number_of_points == 0 {
        return Err(EigError::InvalidInput(
            "number_of_points must be > 0".to_string(),
        ));
    }
    let n = matrix.ensure_square()?;
    let mut budget = budget.unwrap_or(&config.budget).clone();
    if learning_rate.is_some() {
        budget.learning_rate = learning_rate;
    }
    budget.validate()?;

    let started = Instant::now();
    let mut rng = config.rng();
    let points: Vec<Vector<f64>> = (0..number_of_points)
        .map(|_| Vector::standard_normal(n, &mut rng))
        .collect();

    info!(number_of_points, n, "training independent starting points");
    let candidates = train_all(matrix, factory, &points, &budget)?;

    let mut valid = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if check_eig(
            candidate.eigenvalue,
            &candidate.eigenvector,
            matrix,
            config.residual_tolerance,
            config.check_mode,
        )? {
            valid.push(candidate);
        }
    }
    let invalid = number_of_points - valid.len();
    let kept = valid.len();

    let pairs = dedup_relative(valid, config.batch_dedup_tolerance);

    info!(
        unique = pairs.len(),
        invalid,
        eigenvalues = ?pairs.iter().map(|p| p.value).collect::<Vec<_>>(),
        "batch search complete"
    );
    Ok(SearchReport {
        duplicates: kept - pairs.len(),
        pairs,
        rounds: number_of_points,
        invalid,
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}

/// Keep candidates in order unless a kept `λu` has `|λu − λ| < tolerance · |λ|`
fn dedup_relative(candidates: Vec<Candidate>, tolerance: f64) -> Vec<EigenPair> {
    let mut pairs: Vec<EigenPair> = Vec::new();
    for candidate in candidates {
        let eigenvalue = candidate.eigenvalue;
        if pairs
            .iter()
            .any(|p| (p.value - eigenvalue).abs() < tolerance * eigenvalue.abs())
        {
            debug!(eigenvalue, "dropping duplicate eigenvalue");
            continue;
        }
        pairs.push(EigenPair {
            value: eigenvalue,
            vector: candidate.eigenvector,
        });
    }
    pairs
}

#[cfg(feature = "parallel")]
fn train_all<F>(
    matrix: &Matrix<f64>,
    factory: &F,
    points: &[Vector<f64>],
    budget: &TrainingBudget,
) -> Result<Vec<Candidate>>
where
    F: SolverFactory + Sync,
{
    use rayon::prelude::*;

    // Each worker owns its solver; results come back in starting-point order
    points
        .par_iter()
        .map(|point| train_candidate(factory, matrix, point, budget))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn train_all<F>(
    matrix: &Matrix<f64>,
    factory: &F,
    points: &[Vector<f64>],
    budget: &TrainingBudget,
) -> Result<Vec<Candidate>>
where
    F: SolverFactory + Sync,
{
    points
        .iter()
        .map(|point| train_candidate(factory, matrix, point, budget))
        .collect()
}
