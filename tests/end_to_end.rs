//! Concrete end-to-end scenarios (§8 of SPEC_FULL.md), driving the real
//! multi-threaded `Engine` in-process. Adapted from the teacher's own
//! `examples/srflp`/`examples/tsptw` self-contained runnable cases into
//! `#[test]` integration tests, since this crate ships a single binary
//! target rather than a family of example binaries (see DESIGN.md).

use hitori::config::EngineConfig;
use hitori::engine::Engine;
use hitori::grid::{has_island, is_valid, Grid, OPEN};
use hitori::io;

fn config(side: usize, threads: usize) -> EngineConfig {
    EngineConfig {
        side,
        cutoff: 2,
        chunk: 8,
        threads,
        fixed: false,
        benchmark: false,
        donate_denominator: 4,
    }
}

fn all_cells(side: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..side).flat_map(move |r| (0..side).map(move |c| (r, c)))
}

#[test]
fn scenario_1_single_cell_no_duplicates() {
    let grid = Grid::new(1, vec![7]);
    let report = Engine::new(grid, config(1, 2)).run();

    let solution = report.solution.expect("a single cell with no duplicate is trivially solvable");
    assert_eq!(solution.get(0, 0), OPEN);
    assert!(report.leaves_examined.iter().sum::<u64>() >= 1);
}

#[test]
fn scenario_2_latin_square_needs_no_marks() {
    #[rustfmt::skip]
    let values = vec![
        1, 2, 3, 4,
        2, 3, 4, 1,
        3, 4, 1, 2,
        4, 1, 2, 3,
    ];
    let grid = Grid::new(4, values);
    let report = Engine::new(grid, config(4, 2)).run();

    let solution = report.solution.expect("a Latin square is already a valid Hitori solution");
    assert!(all_cells(4).all(|(r, c)| solution.get(r, c) == OPEN));
}

#[test]
fn scenario_3_single_duplicate_pair_blackens_exactly_one() {
    #[rustfmt::skip]
    let values = vec![
        1, 1, 2, 3,
        2, 3, 1, 4,
        3, 2, 4, 1,
        4, 1, 3, 2,
    ];
    let grid = Grid::new(4, values.clone());
    let report = Engine::new(grid.clone(), config(4, 2)).run();

    let solution = report.solution.expect("exactly one of the two duplicate cells must be blackened");
    assert!(is_valid(&grid, &solution));
    assert!(!has_island(&solution));

    let marked_at_00 = solution.get(0, 0) != OPEN;
    let marked_at_01 = solution.get(0, 1) != OPEN;
    assert_ne!(marked_at_00, marked_at_01, "exactly one of (0,0)/(0,1) should be blackened");
}

#[test]
fn scenario_4_fixed_reference_grid_terminates_for_every_worker_count() {
    for &threads in &[1usize, 2, 4, 8] {
        let grid = io::fixed_grid(8);
        let report = Engine::new(grid.clone(), config(8, threads)).run();

        let solution = report.solution.unwrap_or_else(|| panic!("expected a solution with threads={threads}"));
        assert!(is_valid(&grid, &solution), "threads={threads}");
        assert!(!has_island(&solution), "threads={threads}");
    }
}

#[test]
fn scenario_5_unsolvable_seed_reports_no_solution() {
    let grid = Grid::new(2, vec![1, 1, 1, 1]);
    let report = Engine::new(grid, config(2, 2)).run();
    assert!(report.solution.is_none());
}

#[test]
fn scenario_6_deterministic_under_single_worker() {
    #[rustfmt::skip]
    let values = vec![
        1, 1, 2, 3,
        2, 3, 1, 4,
        3, 2, 4, 1,
        4, 1, 3, 2,
    ];
    let grid = Grid::new(4, values);

    let first = Engine::new(grid.clone(), config(4, 1)).run().solution;
    let second = Engine::new(grid, config(4, 1)).run().solution;

    assert_eq!(first, second);
}
