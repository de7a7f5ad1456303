//! Grid initialization, pretty-printing, and benchmark-script invocation
//! (C9) — the external-collaborator layer referenced from the overview.

use std::process::Command;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::grid::{Grid, Status};

/// The original program's 8x8 reference board (`hitoriseqfunctions.h`),
/// selected with `--fixed`.
const FIXED_GRID: [[i32; 8]; 8] = [
    [4, 8, 7, 2, 3, 2, 1, 2],
    [5, 6, 1, 3, 4, 1, 5, 7],
    [7, 2, 2, 8, 2, 1, 7, 3],
    [5, 7, 1, 4, 8, 3, 6, 4],
    [7, 1, 5, 2, 2, 7, 5, 4],
    [6, 4, 1, 7, 5, 2, 8, 1],
    [3, 7, 6, 5, 6, 4, 2, 8],
    [3, 3, 4, 6, 2, 8, 7, 1],
];

/// Builds the `side x side` fixed reference grid, truncating or repeating
/// nothing: callers are expected to have validated `side <= 8` beforehand
/// when requesting the fixed board (`EngineConfig::from_args` always sets
/// `side == 8` for `--fixed`).
pub fn fixed_grid(side: usize) -> Grid {
    let mut values = Vec::with_capacity(side * side);
    for row in FIXED_GRID.iter().take(side) {
        values.extend(row.iter().take(side));
    }
    Grid::new(side, values)
}

/// Builds a random grid of the given side, following the original's
/// `initialize_grid`: values `1..=side` repeated to fill the grid, then
/// shuffled.
pub fn random_grid(side: usize) -> Grid {
    let mut values: Vec<i32> = (0..side * side).map(|i| (i % side) as i32 + 1).collect();
    values.shuffle(&mut thread_rng());
    Grid::new(side, values)
}

pub fn print_grid(grid: &Grid) {
    println!("Grid:");
    for row in 0..grid.side {
        let line: Vec<String> = (0..grid.side).map(|col| grid.get(row, col).to_string()).collect();
        println!("{}", line.join(" "));
    }
}

pub fn print_solution(status: &Status, grid: &Grid) {
    println!("Solution:");
    for row in 0..grid.side {
        let line: Vec<String> = (0..grid.side)
            .map(|col| {
                if status.is_marked(row, col) {
                    "\u{2588}".to_string()
                } else {
                    grid.get(row, col).to_string()
                }
            })
            .collect();
        println!("{}", line.join(" "));
    }
}

pub fn print_no_solution() {
    println!("No solution found.");
}

/// Invokes the external plotting script exactly once, at the end of
/// benchmark mode (§6, out of scope for the core's own correctness).
pub fn run_benchmark_script(world_size: usize, avg_seconds: f64, side: usize) -> Result<()> {
    let status = Command::new("python3")
        .arg("../benchmark.py")
        .arg(world_size.to_string())
        .arg(avg_seconds.to_string())
        .arg(side.to_string())
        .arg("results")
        .status()
        .context("failed to spawn the benchmark plotting script")?;

    if !status.success() {
        log::warn!("benchmark.py exited with status {status}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::has_island;

    #[test]
    fn fixed_grid_matches_reference_dimensions() {
        let grid = fixed_grid(8);
        assert_eq!(grid.get(0, 0), 4);
        assert_eq!(grid.get(7, 7), 1);
    }

    #[test]
    fn random_grid_values_stay_in_range() {
        let grid = random_grid(5);
        assert_eq!(grid.values.data.len(), 25);
        assert!(grid.values.data.iter().all(|&v| (1..=5).contains(&v)));
    }

    #[test]
    fn all_open_status_has_no_island() {
        let status = Status::all_open(5);
        assert!(!has_island(&status));
    }
}
