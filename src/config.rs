//! Command-line surface (C8) and the validated configuration it is reduced
//! to before any worker thread is spawned.

use structopt::StructOpt;
use thiserror::Error;

/// Raw CLI flags, parsed by `structopt` the way the teacher crate's
/// `xputils::Args` is (see DESIGN.md).
#[derive(Debug, StructOpt)]
#[structopt(
    name = "phitori",
    about = "Parallel depth-first Hitori solver with work stealing and Safra termination detection"
)]
pub struct Args {
    /// Puzzle side length N; N*N must be <= 64. Ignored when `--fixed` is set.
    #[structopt(short = "n", long)]
    pub side: Option<usize>,

    /// Use the built-in 8x8 reference grid instead of a random one, forcing N=8.
    #[structopt(short = "p", long)]
    pub fixed: bool,

    /// Minimum local stack size above which a worker donates work on request.
    #[structopt(short, long)]
    pub cutoff: usize,

    /// Number of states popped per work burst before protocol service.
    #[structopt(short = "w", long)]
    pub chunk: usize,

    /// Benchmark mode: run 10 iterations, report the average, invoke the plotting script.
    #[structopt(short, long)]
    pub benchmark: bool,

    /// Number of worker threads (simulated ranks); defaults to the number of logical CPUs.
    #[structopt(short = "t", long)]
    pub threads: Option<usize>,

    /// Donor-side split divisor: a donor keeps the bottom 1/divisor of its
    /// stack and donates the rest (§9, "work-split oddity"). Defaults to 4.
    #[structopt(short = "d", long)]
    pub donate_denominator: Option<usize>,

    /// Increase logging verbosity; repeat for more (-v, -vv, -vvv). `RUST_LOG` overrides this.
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: u8,
}

/// CLI-validation failures (§7), surfaced at the `main` boundary.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--side is required unless --fixed is given")]
    MissingSide,
    #[error("grid side {side} is too large: {side}*{side} = {cells} exceeds the 64-bit bitmap capacity")]
    SideTooLarge { side: usize, cells: usize },
    #[error("--side must be at least 1, got {0}")]
    SideTooSmall(usize),
    #[error("--threads must be at least 1, got {0}")]
    NoThreads(usize),
    #[error("--donate-denominator must be at least 1, got {0}")]
    NoDonateDenominator(usize),
}

/// The single validated object the engine and grid/I/O layers are driven
/// from. Built once, by `main`, from `Args`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub side: usize,
    pub cutoff: usize,
    pub chunk: usize,
    pub threads: usize,
    pub fixed: bool,
    pub benchmark: bool,
    /// Donor-side split divisor (§9, "work-split oddity"); a donor keeps the
    /// bottom `1/donate_denominator` of its stack and donates the rest.
    /// Defaults to 4, matching the original's `n/4` behavior, but is exposed
    /// as a tunable rather than hard-coded.
    pub donate_denominator: usize,
}

const FIXED_GRID_SIDE: usize = 8;
const DEFAULT_DONATE_DENOMINATOR: usize = 4;

impl EngineConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let side = if args.fixed {
            FIXED_GRID_SIDE
        } else {
            args.side.ok_or(ConfigError::MissingSide)?
        };

        if side == 0 {
            return Err(ConfigError::SideTooSmall(side));
        }

        let cells = side * side;
        if cells > 64 {
            return Err(ConfigError::SideTooLarge { side, cells });
        }

        let threads = args.threads.unwrap_or_else(num_cpus::get);
        if threads == 0 {
            return Err(ConfigError::NoThreads(threads));
        }

        let donate_denominator = args.donate_denominator.unwrap_or(DEFAULT_DONATE_DENOMINATOR);
        if donate_denominator == 0 {
            return Err(ConfigError::NoDonateDenominator(donate_denominator));
        }

        Ok(EngineConfig {
            side,
            cutoff: args.cutoff,
            chunk: args.chunk,
            threads,
            fixed: args.fixed,
            benchmark: args.benchmark,
            donate_denominator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(side: Option<usize>, fixed: bool, threads: Option<usize>) -> Args {
        Args {
            side,
            fixed,
            cutoff: 2,
            chunk: 16,
            benchmark: false,
            threads,
            donate_denominator: None,
            verbose: 0,
        }
    }

    #[test]
    fn rejects_missing_side() {
        let err = EngineConfig::from_args(&args(None, false, None)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSide));
    }

    #[test]
    fn rejects_side_too_large() {
        let err = EngineConfig::from_args(&args(Some(9), false, None)).unwrap_err();
        assert!(matches!(err, ConfigError::SideTooLarge { side: 9, cells: 81 }));
    }

    #[test]
    fn fixed_flag_forces_side_eight() {
        let config = EngineConfig::from_args(&args(None, true, Some(1))).unwrap();
        assert_eq!(config.side, 8);
    }

    #[test]
    fn rejects_zero_threads() {
        let err = EngineConfig::from_args(&args(Some(4), false, Some(0))).unwrap_err();
        assert!(matches!(err, ConfigError::NoThreads(0)));
    }

    #[test]
    fn donate_denominator_defaults_to_four() {
        let config = EngineConfig::from_args(&args(Some(4), false, Some(1))).unwrap();
        assert_eq!(config.donate_denominator, 4);
    }

    #[test]
    fn donate_denominator_honors_override() {
        let mut raw = args(Some(4), false, Some(1));
        raw.donate_denominator = Some(2);
        let config = EngineConfig::from_args(&raw).unwrap();
        assert_eq!(config.donate_denominator, 2);
    }

    #[test]
    fn rejects_zero_donate_denominator() {
        let mut raw = args(Some(4), false, Some(1));
        raw.donate_denominator = Some(0);
        let err = EngineConfig::from_args(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::NoDonateDenominator(0)));
    }
}
