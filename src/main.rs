//! `eigseek` binary: search for eigenpairs of a matrix stored in a `.npy` file.
//!
//! # Usage
//!
//! ```bash
//! eigseek --matrix A.npy
//! eigseek --matrix A.npy --strategy batch --points 15 --learning-rate 0.0175
//! eigseek --matrix A.npy --solver oracle --target 3 --output report.json
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use eigseek::flow::{FlowObjective, RayleighFlowFactory};
use eigseek::io::{load_matrix_npy, write_report_json};
use eigseek::oracle::SpectralOracle;
use eigseek::search::{find_eigenvectors, many_random_points, search_until_found};
use eigseek::solver::SolverFactory;
use eigseek::{Matrix, Result, SearchConfig, SearchReport, SymmetricEigen};

/// Loop policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Retry with widening restarts until the target count is reached
    Search,
    /// Exactly n rounds with orthogonal restarts, no retries
    Sweep,
    /// Independent random starts, deduplicated afterwards
    Batch,
}

/// Trainable model
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SolverKind {
    /// Euler-trained flow solver (see `--objective`)
    Flow,
    /// Exact eigenpairs from the Jacobi decomposition
    Oracle,
}

/// Objective of the flow solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Objective {
    /// Residual descent, converging to an eigenpair near each start
    Residual,
    /// Yi-Fu-Tang flow toward the largest eigenvalue present in each start
    Rayleigh,
}

impl From<Objective> for FlowObjective {
    fn from(objective: Objective) -> Self {
        match objective {
            Objective::Residual => FlowObjective::Residual,
            Objective::Rayleigh => FlowObjective::Rayleigh,
        }
    }
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "eigseek",
    version,
    about = "Eigenpair search by repeated training, validation and deflation",
    long_about = None
)]
struct Args {
    /// Square matrix in NumPy `.npy` format (f8 or f4)
    #[arg(short, long, value_name = "FILE", default_value = "A.npy")]
    matrix: PathBuf,

    /// JSON search configuration; defaults are used when absent
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Loop policy
    #[arg(long, value_enum, default_value_t = Strategy::Search)]
    strategy: Strategy,

    /// Trainable model
    #[arg(long, value_enum, default_value_t = SolverKind::Flow)]
    solver: SolverKind,

    /// Objective of the flow solver
    #[arg(long, value_enum, default_value_t = Objective::Residual)]
    objective: Objective,

    /// Number of eigenpairs to collect (search strategy)
    #[arg(long)]
    target: Option<usize>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Training epochs per round
    #[arg(long)]
    epochs: Option<usize>,

    /// Optimizer steps per epoch
    #[arg(long)]
    batches: Option<usize>,

    /// Number of random starting points (batch strategy)
    #[arg(long, default_value_t = 15)]
    points: usize,

    /// Learning rate override for the solver
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Maximum training rounds before giving up (search strategy)
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Write the search report as JSON
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); falls back to RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    let args = Args::parse();

    let filter = match args.log_level.as_deref() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<SearchConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            SearchConfig::from_json(path)?
        }
        None => SearchConfig::reference(),
    };

    if let Some(target) = args.target {
        config.target_count = target;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(epochs) = args.epochs {
        config.budget.epochs = epochs;
    }
    if let Some(batches) = args.batches {
        config.budget.batches = batches;
    }
    if let Some(rounds) = args.max_rounds {
        config.max_rounds = rounds;
    }
    if let Some(lr) = args.learning_rate {
        config.budget.learning_rate = Some(lr);
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let matrix = load_matrix_npy(&args.matrix)?;
    info!(
        "Loaded {}x{} matrix from {}",
        matrix.rows(),
        matrix.cols(),
        args.matrix.display()
    );
    if !matrix.is_symmetric(1e-10) {
        warn!("matrix is not symmetric; eigenpairs may not be real or orthogonal");
    }

    let report = match args.solver {
        SolverKind::Flow => {
            let factory = RayleighFlowFactory::new().with_objective(args.objective.into());
            run_strategy(args, &matrix, &factory, &config)?
        }
        SolverKind::Oracle => run_strategy(args, &matrix, &SpectralOracle::new(), &config)?,
    };

    info!(
        rounds = report.rounds,
        duplicates = report.duplicates,
        invalid = report.invalid,
        elapsed = ?report.elapsed(),
        "eigenvalues found: {:?}",
        report.eigenvalues()
    );

    let reference = SymmetricEigen::new(&matrix)?;
    info!("reference spectrum: {:?}", reference.eigenvalues());
    for pair in &report.pairs {
        if let Some((closest, err)) = reference.closest(pair.value) {
            info!(
                found = pair.value,
                reference = closest,
                error = err,
                "closest reference eigenvalue"
            );
        }
    }

    if let Some(path) = args.output.as_deref() {
        write_report_json(&report, path)?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn run_strategy<F: SolverFactory + Sync>(
    args: &Args,
    matrix: &Matrix<f64>,
    factory: &F,
    config: &SearchConfig,
) -> Result<SearchReport> {
    match args.strategy {
        Strategy::Search => search_until_found(matrix, factory, config),
        Strategy::Sweep => find_eigenvectors(matrix, factory, config),
        Strategy::Batch => {
            many_random_points(matrix, factory, args.points, None, args.learning_rate, config)
        }
    }
}
