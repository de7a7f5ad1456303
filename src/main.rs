use std::time::Instant;

use anyhow::Result;
use structopt::StructOpt;

use hitori::config::{Args, EngineConfig};
use hitori::engine::Engine;
use hitori::grid::Grid;
use hitori::io;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn build_grid(config: &EngineConfig) -> Grid {
    if config.fixed {
        io::fixed_grid(config.side)
    } else {
        io::random_grid(config.side)
    }
}

fn run_once(grid: &Grid, config: &EngineConfig) -> (f64, Option<hitori::grid::Status>, Vec<u64>) {
    let engine = Engine::new(grid.clone(), config.clone());
    let start = Instant::now();
    let report = engine.run();
    let elapsed = start.elapsed().as_secs_f64();
    (elapsed, report.solution, report.leaves_examined)
}

fn main() -> Result<()> {
    let args = Args::from_args();
    init_logging(args.verbose);

    let config = match EngineConfig::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    log::info!(
        "side={} threads={} cutoff={} chunk={} donate_denominator={} fixed={} benchmark={}",
        config.side,
        config.threads,
        config.cutoff,
        config.chunk,
        config.donate_denominator,
        config.fixed,
        config.benchmark
    );

    let grid = build_grid(&config);
    io::print_grid(&grid);

    let iterations = if config.benchmark { 10 } else { 1 };
    let mut total_elapsed = 0.0;
    let mut last_solution = None;
    let mut last_leaves = Vec::new();

    for _ in 0..iterations {
        let (elapsed, solution, leaves) = run_once(&grid, &config);
        total_elapsed += elapsed;
        last_solution = solution;
        last_leaves = leaves;
    }

    let avg_elapsed = total_elapsed / iterations as f64;

    match &last_solution {
        Some(status) => io::print_solution(status, &grid),
        None => io::print_no_solution(),
    }

    if !config.benchmark {
        println!("Parallel execution time: {avg_elapsed:.6} seconds");
        for (rank, leaves) in last_leaves.iter().enumerate() {
            println!("worker {rank}: {leaves} leaves examined");
        }
    } else {
        println!("Average parallel execution time over {iterations} iterations: {avg_elapsed:.6} seconds");
        io::run_benchmark_script(config.threads, avg_elapsed, config.side)?;
    }

    Ok(())
}
