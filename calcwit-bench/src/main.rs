//! calcwit-bench: load harness for the calcwit scheduler.
//!
//! Builds a synthetic layered circuit (see `synthetic`), runs it through the
//! witness calculator a number of times and reports timings. With `--verify`
//! each witness is checked against a sequential evaluation.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use calcwit_core::{Config, Inputs, WitnessCalculator};

mod synthetic;

#[derive(Parser, Debug)]
#[command(name = "calcwit-bench", about = "calcwit witness scheduler benchmark utility")]
struct Cli {
    /// Path to configuration file (TOML). Defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override log level.
    #[arg(long)]
    log_level: Option<String>,

    /// Cells per layer.
    #[arg(short, long, default_value = "64")]
    width: usize,

    /// Number of layers.
    #[arg(short, long, default_value = "16")]
    depth: usize,

    /// Run every n-th cell on its own thread (0 = only the last layer).
    #[arg(short = 't', long, default_value = "8")]
    threaded_every: usize,

    /// Number of witness computations.
    #[arg(short = 'n', long, default_value = "3")]
    iterations: u32,

    /// Override the lock/condvar pool size.
    #[arg(long)]
    pool_size: Option<usize>,

    /// Enable signal sanity checks.
    #[arg(long)]
    sanity: bool,

    /// Compare every witness with a sequential evaluation.
    #[arg(long)]
    verify: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {:?}", path))?,
        None => Config::default(),
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(size) = cli.pool_size {
        config.scheduler.mutex_pool_size = size;
    }
    if cli.sanity {
        config.scheduler.sanity_check = true;
    }
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    let shape = synthetic::Shape {
        width: cli.width,
        depth: cli.depth,
        threaded_every: cli.threaded_every,
    };

    let build_start = Instant::now();
    let circuit = Arc::new(synthetic::build(shape).context("failed to build synthetic circuit")?);
    let field = circuit.field()?;
    info!(
        signals = circuit.n_signals(),
        components = circuit.n_components(),
        build_ms = build_start.elapsed().as_millis() as u64,
        "synthetic circuit built"
    );

    println!("=== Synthetic Witness Benchmark ===");
    println!("shape:      {} x {} (threaded every {})", shape.width, shape.depth, shape.threaded_every);
    println!("signals:    {}", circuit.n_signals());
    println!("components: {}", circuit.n_components());
    println!("pool size:  {}", config.scheduler.mutex_pool_size);
    println!("sanity:     {}", config.scheduler.sanity_check);
    println!("iterations: {}", cli.iterations);
    println!();

    let calculator = Arc::new(WitnessCalculator::new(circuit, config)?);
    let mut times = Vec::with_capacity(cli.iterations as usize);

    for i in 0..cli.iterations {
        let values: Vec<u64> = (0..shape.width as u64).map(|j| j + 1 + u64::from(i)).collect();
        let inputs = Inputs::new().with("in", values.iter().copied());

        let wall_start = Instant::now();
        let witness = calculator
            .clone()
            .calculate_async(inputs)
            .await
            .with_context(|| format!("witness computation {} failed", i + 1))?;
        let wall_time = wall_start.elapsed();

        if cli.verify {
            let expected = synthetic::expected_outputs(shape, &field, &values);
            let out = &witness.values()[1 + shape.width..1 + 2 * shape.width];
            anyhow::ensure!(
                out == expected.as_slice(),
                "witness {} does not match sequential evaluation",
                i + 1
            );
        }

        println!(
            "  [{}] wall={:.3}ms  signals={}{}",
            i + 1,
            wall_time.as_secs_f64() * 1000.0,
            witness.len(),
            if cli.verify { "  verified" } else { "" },
        );
        times.push(wall_time);
    }

    if cli.iterations > 1 {
        let avg = times.iter().map(|t| t.as_secs_f64()).sum::<f64>() / times.len() as f64;
        let min = times.iter().map(|t| t.as_secs_f64()).fold(f64::INFINITY, f64::min);
        let max = times.iter().map(|t| t.as_secs_f64()).fold(0.0, f64::max);
        println!();
        println!("=== Summary ({} iterations) ===", cli.iterations);
        println!(
            "wall:   avg={:.3}ms  min={:.3}ms  max={:.3}ms",
            avg * 1000.0,
            min * 1000.0,
            max * 1000.0
        );
    }

    Ok(())
}
