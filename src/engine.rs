//! Top-level engine (C7): spawns `P` worker threads sharing one read-only
//! grid, wires them into a [`ChannelMailbox`] mesh, and collects the result.
//!
//! Mirrors the teacher crate's `BarrierParallelSolver::maximize` — a single
//! `std::thread::scope` fanning out one long-running worker per thread (see
//! DESIGN.md) — generalized from a branch-and-bound frontier to the Hitori
//! DFS-with-work-stealing protocol.

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::grid::{Grid, Status};
use crate::transport::ChannelMailbox;
use crate::worker::Worker;

pub struct Engine {
    grid: Grid,
    config: EngineConfig,
}

/// The outcome of one complete run: the first solution found, if any, and
/// the number of leaves each worker examined (§6, Output).
pub struct RunReport {
    pub solution: Option<Status>,
    pub leaves_examined: Vec<u64>,
}

impl Engine {
    pub fn new(grid: Grid, config: EngineConfig) -> Self {
        Engine { grid, config }
    }

    pub fn run(&self) -> RunReport {
        let world_size = self.config.threads;
        let mailboxes = ChannelMailbox::mesh(world_size);
        let found: Mutex<Option<Status>> = Mutex::new(None);
        let leaves_examined = Mutex::new(vec![0u64; world_size]);

        std::thread::scope(|scope| {
            for (rank, mailbox) in mailboxes.into_iter().enumerate() {
                let grid = &self.grid;
                let config = &self.config;
                let found = &found;
                let leaves_examined = &leaves_examined;
                scope.spawn(move || {
                    let mut worker = Worker::new(rank, world_size, grid, config, mailbox);
                    worker.run(found);
                    leaves_examined.lock()[rank] = worker.leaves_examined();
                });
            }
        });

        RunReport {
            solution: found.into_inner(),
            leaves_examined: leaves_examined.into_inner(),
        }
    }
}
