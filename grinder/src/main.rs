use std::fs::File;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use accel_iht_src::prelude::*;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Which {
    Iht,
    Iht2,
    Both,
}

/// Sparse recovery of a random non-negative signal with accelerated IHT.
#[derive(Debug, Parser)]
struct Args {
    /// Number of measurements (rows of phi).
    #[arg(long, default_value_t = 300)]
    m: usize,
    /// Number of candidate columns.
    #[arg(long, default_value_t = 1000)]
    n: usize,
    /// Sparsity of the true signal and of the solution.
    #[arg(long, default_value_t = 100)]
    k: usize,
    #[arg(long, default_value_t = 233)]
    seed: u64,
    #[arg(long, value_enum, default_value_t = Which::Both)]
    mode: Which,
    /// Fraction of columns per stochastic gradient.
    #[arg(long)]
    ratio: Option<f64>,
    #[arg(long, default_value_t = 1e-5)]
    tol: f64,
    #[arg(long, default_value_t = 300)]
    max_iter: usize,
    /// Print the per-iteration table.
    #[arg(long)]
    verbose: bool,
    /// Write the solutions as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let phi = Array2::from_shape_fn((args.m, args.n), |_| rng.gen::<f64>() - 0.5);
    let true_supp = rand::seq::index::sample(&mut rng, args.n, args.k.min(args.n)).into_vec();
    let mut true_w = Array1::<f64>::zeros(args.n);
    for &j in &true_supp {
        true_w[j] = rng.gen::<f64>();
    }
    let y = phi.dot(&true_w);

    let mut options = SolverOptions::default()
        .with_tol(args.tol)
        .with_max_iter(args.max_iter)
        .with_seed(args.seed)
        .with_verbose(args.verbose);
    options.stochastic_ratio = args.ratio;

    let modes = match args.mode {
        Which::Iht => vec![Mode::Iht],
        Which::Iht2 => vec![Mode::IhtII],
        Which::Both => vec![Mode::Iht, Mode::IhtII],
    };

    let (tx, rx) = mpsc::channel::<()>();
    let clock = thread::spawn(move || {
        let start = Instant::now();
        while rx.recv_timeout(Duration::from_secs(1)).is_err() {
            info!("{:.0} s", start.elapsed().as_secs_f64());
        }
    });

    let mut results = Vec::new();
    for mode in modes {
        let start = Instant::now();
        let solution = solve(phi.view(), y.view(), args.k, mode, &options)?;
        let hits = solution
            .support
            .iter()
            .filter(|i| true_supp.contains(i))
            .count();
        info!(
            "{mode}: objective {:.6e} (||y|| = {:.6e}), {} iterations, {:?}, {}/{} of the true support, {:.3} s",
            solution.objective,
            y.dot(&y).sqrt(),
            solution.iterations,
            solution.status,
            hits,
            true_supp.len(),
            start.elapsed().as_secs_f64()
        );
        results.push((mode, solution));
    }
    tx.send(()).ok();
    clock.join().ok();

    if let Some(path) = args.output {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &results).context("writing solutions")?;
        info!("solutions written to {}", path.display());
    }
    Ok(())
}
