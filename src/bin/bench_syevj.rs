//! Batched symmetric-eigendecomposition latency benchmark driver

use clap::{Parser, ValueEnum};

use linbench::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Host,
    Device,
}

/// Measure batched two-sided Jacobi symmetric eigendecomposition latency
#[derive(Parser, Debug)]
#[command(name = "bench_syevj", version)]
struct Cli {
    /// Matrix size (N x N)
    #[arg(short = 'n', long, default_value_t = 10)]
    size: usize,

    /// Leading dimension (lda)
    #[arg(short = 'l', long, default_value_t = 10)]
    lda: usize,

    /// Stride between matrices (default: lda * size)
    #[arg(short = 's', long)]
    stride: Option<usize>,

    /// Batch count
    #[arg(short = 'b', long, default_value_t = 2)]
    batch_count: usize,

    /// Random seed for matrix generation
    #[arg(short = 'r', long, default_value_t = 42)]
    random_seed: u64,

    /// Number of iterations for timing
    #[arg(short = 'i', long, default_value_t = 10)]
    iterations: usize,

    /// Warm-up time in milliseconds before timing
    #[arg(short = 'w', long, default_value_t = 1000)]
    warmup_time: u64,

    /// Tolerance for the Jacobi method
    #[arg(short = 't', long, default_value_t = 1e-7)]
    tolerance: f64,

    /// Maximum number of sweeps for the Jacobi method
    #[arg(short = 'm', long, default_value_t = 100)]
    max_sweeps: u32,

    /// Execution backend
    #[arg(long, value_enum, default_value_t = BackendArg::Host)]
    backend: BackendArg,
}

fn main() {
    init_logging();
    let cli = parse_or_exit();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cfg = BatchConfig::square(
        cli.size,
        cli.lda,
        cli.stride,
        cli.batch_count,
        Layout::Strided,
    )?;
    let run_cfg = RunConfig::new(cli.iterations, cli.warmup_time, cli.random_seed)?;
    let controls = JacobiControls {
        tolerance: cli.tolerance,
        max_sweeps: cli.max_sweeps,
    };
    let pristine = generate::symmetric::<f32>(&cfg, 10.0, run_cfg.seed)?;

    let (backend, warmup, series) = match cli.backend {
        BackendArg::Host => {
            let mut kernel = HostSyevj::new(cfg, controls, pristine)?;
            let (warmup, series) = harness::run(&mut kernel, &run_cfg)?;
            ("host", warmup, series)
        }
        BackendArg::Device => run_device(cfg, &run_cfg, controls, pristine)?,
    };

    let report = Report {
        backend,
        rows: cfg.rows,
        cols: cfg.cols,
        batch_count: cfg.batch_count,
        extras: vec![
            ("Tolerance", format!("{:e}", controls.tolerance)),
            ("Max sweeps", controls.max_sweeps.to_string()),
        ],
        warmup_budget_ms: cli.warmup_time,
        warmup_iterations: warmup.iterations,
        iterations: run_cfg.iterations,
        summary: Summary::of(&series),
    };
    println!("{report}");
    Ok(())
}

#[cfg(feature = "cuda")]
fn run_device(
    cfg: BatchConfig,
    run_cfg: &RunConfig,
    controls: JacobiControls,
    pristine: BatchedMatrixSet<f32>,
) -> Result<(&'static str, WarmupOutcome, TimingSeries)> {
    let backend = CudaBackend::new(0)?;
    let mut kernel = CudaSyevj::new(backend, cfg, controls, pristine)?;
    let (warmup, series) = harness::run(&mut kernel, run_cfg)?;
    Ok(("device", warmup, series))
}

#[cfg(not(feature = "cuda"))]
fn run_device(
    _cfg: BatchConfig,
    _run_cfg: &RunConfig,
    _controls: JacobiControls,
    _pristine: BatchedMatrixSet<f32>,
) -> Result<(&'static str, WarmupOutcome, TimingSeries)> {
    Err(Error::BackendUnavailable {
        backend: "device",
        reason: "linbench was built without the 'cuda' feature".to_string(),
    })
}

fn parse_or_exit() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let failed = e.use_stderr();
            let _ = e.print();
            std::process::exit(if failed { 1 } else { 0 });
        }
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
