//! Per-worker DFS driver (C7), work-stealing (C4), the Safra token-ring
//! termination detector (C5), and solution broadcast (C6).

use log::{debug, info, trace};
use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::grid::{is_safe, is_valid, Grid, Status, MARKED};
use crate::state::{CompressedState, PartialState};
use crate::transport::{Color, Mailbox, Payload, Tag};

/// Number of full ring sweeps an idle worker attempts before yielding one
/// outer iteration (§4.4).
const NUMRETRY: usize = 3;

/// One simulated MPI rank, driving its own private stack against a shared,
/// read-only grid and an exclusively-owned [`Mailbox`].
pub struct Worker<'a, M: Mailbox> {
    rank: usize,
    world_size: usize,
    grid: &'a Grid,
    config: &'a EngineConfig,
    mailbox: M,
    stack: Vec<PartialState>,
    /// This worker's own Safra color; turns black when it donates work to a
    /// numerically-lower peer (a "backward" transfer).
    color: Color,
    /// `Some(color)` while this worker is holding a token it received from
    /// its ring predecessor and has not yet forwarded. For rank 0 this is
    /// the *returned* token, distinct from the token it injects itself
    /// (tracked by `token_in_flight`) — conflating the two would let rank 0
    /// decide termination against the token it just created instead of one
    /// that has actually completed a lap of the ring.
    held_token: Option<Color>,
    /// Rank 0 only: true once it has dispatched its current token and is
    /// waiting for it to complete the ring.
    token_in_flight: bool,
    should_stop: bool,
    leaves_examined: u64,
}

impl<'a, M: Mailbox> Worker<'a, M> {
    pub fn new(rank: usize, world_size: usize, grid: &'a Grid, config: &'a EngineConfig, mailbox: M) -> Self {
        let stack = if rank == 0 {
            vec![PartialState::initial(grid.side)]
        } else {
            Vec::new()
        };

        Worker {
            rank,
            world_size,
            grid,
            config,
            mailbox,
            stack,
            color: Color::White,
            held_token: None,
            token_in_flight: false,
            should_stop: false,
            leaves_examined: 0,
        }
    }

    pub fn leaves_examined(&self) -> u64 {
        self.leaves_examined
    }

    /// Drives this worker's search loop to completion (§4.7). `found` is the
    /// single cross-worker slot the first discovered solution is stored in.
    pub fn run(&mut self, found: &Mutex<Option<Status>>) {
        if self.world_size == 1 {
            self.run_single(found);
            return;
        }

        while !self.should_stop {
            if self.stack.is_empty() {
                if !self.handle_idle() {
                    break;
                }
            } else {
                self.expand_chunk(found);
            }
            self.service_protocol();
        }
    }

    /// The P=1 degenerate case (§4.7): no peers, no token, no stealing.
    fn run_single(&mut self, found: &Mutex<Option<Status>>) {
        while !self.stack.is_empty() && !self.should_stop {
            self.expand_chunk(found);
        }
    }

    /// Returns `false` when this worker has just broadcast `Termination` and
    /// the outer loop should stop.
    fn handle_idle(&mut self) -> bool {
        if self.rank == 0 {
            if !self.token_in_flight {
                self.color = Color::White;
                let dest = (self.rank + 1) % self.world_size;
                debug!("rank 0 injecting a fresh white token");
                self.mailbox.send(dest, Tag::Token, Payload::Token(Color::White));
                self.token_in_flight = true;
            } else if let Some(returned_color) = self.held_token.take() {
                if returned_color == Color::White && self.color == Color::White {
                    info!("rank 0 observed its token returned white while white itself; broadcasting termination");
                    self.broadcast_termination();
                    return false;
                }
                // Black anywhere in the last lap means observed quiescence
                // was not sound; re-initiate a fresh white token (§4.5).
                debug!("rank 0 re-initiating token (self={:?}, returned={:?})", self.color, returned_color);
                self.token_in_flight = false;
            }
        } else if let Some(token_color) = self.held_token.take() {
            self.forward_token(token_color);
        }

        self.run_steal_sweeps();
        true
    }

    fn forward_token(&mut self, incoming_color: Color) {
        let outgoing = if self.color == Color::Black { Color::Black } else { incoming_color };
        let dest = (self.rank + 1) % self.world_size;
        debug!("rank {} forwarding token as {:?} to {}", self.rank, outgoing, dest);
        self.mailbox.send(dest, Tag::Token, Payload::Token(outgoing));
        self.color = Color::White;
    }

    fn run_steal_sweeps(&mut self) {
        for _ in 0..NUMRETRY {
            for offset in 1..self.world_size {
                if self.should_stop || !self.stack.is_empty() {
                    return;
                }
                let peer = (self.rank + offset) % self.world_size;
                trace!("rank {} requesting work from {}", self.rank, peer);
                self.mailbox.send(peer, Tag::Request, Payload::Signal);
                self.await_steal_reply(peer);
            }
        }
    }

    /// Blocks (via a servicing spin) until `peer` answers the outstanding
    /// `Request` with either `Work` or `NoWork`.
    fn await_steal_reply(&mut self, peer: usize) {
        loop {
            if let Some((_, payload)) = self.mailbox.try_recv(Some(peer), Tag::Work) {
                let states = match payload {
                    Payload::Work(states) => states,
                    _ => unreachable!("Work tag always carries Payload::Work"),
                };
                debug!("rank {} received {} states from {}", self.rank, states.len(), peer);
                self.stack = states
                    .into_iter()
                    .map(|compressed: CompressedState| compressed.into_partial(self.grid.side))
                    .collect();
                return;
            }
            if self.mailbox.try_recv(Some(peer), Tag::NoWork).is_some() {
                return;
            }
            // Keep donating and servicing the ring while we wait, so a
            // cycle of mutually idle workers cannot deadlock.
            self.service_protocol();
            if self.should_stop {
                return;
            }
        }
    }

    fn service_protocol(&mut self) {
        self.service_requests();

        if self.held_token.is_none() {
            let from = if self.rank == 0 { self.world_size - 1 } else { self.rank - 1 };
            if let Some((_, payload)) = self.mailbox.try_recv(Some(from), Tag::Token) {
                let color = match payload {
                    Payload::Token(color) => color,
                    _ => unreachable!("Token tag always carries Payload::Token"),
                };
                self.held_token = Some(color);
            }
        }

        if self.mailbox.try_recv(None, Tag::SolutionFound).is_some() {
            self.should_stop = true;
        }

        if self.mailbox.try_recv(None, Tag::Termination).is_some() {
            self.should_stop = true;
        }
    }

    fn service_requests(&mut self) {
        while let Some((from, _)) = self.mailbox.try_recv(None, Tag::Request) {
            self.handle_work_request(from);
        }
    }

    /// Donor side of the work-stealing protocol (§4.4).
    fn handle_work_request(&mut self, from: usize) {
        let n = self.stack.len();
        if n > self.config.cutoff {
            // Keep the bottom 1/donate_denominator, donate the rest (§9,
            // "work-split oddity"; defaults to n/4, tunable via -d).
            let split_point = n / self.config.donate_denominator;
            let donated: Vec<CompressedState> = self
                .stack
                .split_off(split_point)
                .iter()
                .map(CompressedState::from_partial)
                .collect();
            debug!("rank {} donating {} states to {}", self.rank, donated.len(), from);
            self.mailbox.send(from, Tag::Work, Payload::Work(donated));

            let is_ring_wrap = self.rank == self.world_size - 1 && from == 0;
            if from < self.rank && !is_ring_wrap {
                self.color = Color::Black;
            }
        } else {
            trace!("rank {} has nothing to spare for {}", self.rank, from);
            self.mailbox.send(from, Tag::NoWork, Payload::Signal);
        }
    }

    /// Pops up to `config.chunk` states and expands or finalizes each
    /// (§4.7 step 2).
    fn expand_chunk(&mut self, found: &Mutex<Option<Status>>) {
        let side = self.grid.side;

        for _ in 0..self.config.chunk {
            let state = match self.stack.pop() {
                Some(state) => state,
                None => break,
            };

            if state.is_leaf(side) {
                self.leaves_examined += 1;
                if is_valid(self.grid, &state.status) {
                    self.report_solution(state.status, found);
                }
                continue;
            }

            let (next_row, next_col) = PartialState::next_cursor(state.row, state.col, side);

            // Unmarked child first, so the marked child (pushed after) is
            // explored first under LIFO — the more constrained branch tends
            // to fail faster (§4.7 ordering note).
            self.stack.push(PartialState {
                status: state.status.clone(),
                row: next_row,
                col: next_col,
            });

            if is_safe(&state.status, state.row, state.col, self.grid) {
                let mut marked = state.status;
                marked.set(state.row, state.col, MARKED);
                self.stack.push(PartialState {
                    status: marked,
                    row: next_row,
                    col: next_col,
                });
            }
        }
    }

    fn report_solution(&mut self, status: Status, found: &Mutex<Option<Status>>) {
        let mut guard = found.lock();
        if guard.is_none() {
            *guard = Some(status);
            drop(guard);
            info!("rank {} found a solution after {} leaves", self.rank, self.leaves_examined);
            self.should_stop = true;
            self.broadcast_solution_found();
        }
    }

    fn broadcast_solution_found(&mut self) {
        for peer in 0..self.world_size {
            if peer != self.rank {
                self.mailbox.send(peer, Tag::SolutionFound, Payload::Signal);
            }
        }
    }

    fn broadcast_termination(&mut self) {
        for peer in 0..self.world_size {
            if peer != self.rank {
                self.mailbox.send(peer, Tag::Termination, Payload::Signal);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackMailbox;

    fn config(cutoff: usize, chunk: usize) -> EngineConfig {
        EngineConfig {
            side: 0,
            cutoff,
            chunk,
            threads: 1,
            fixed: false,
            benchmark: false,
            donate_denominator: 4,
        }
    }

    #[test]
    fn single_worker_finds_latin_square_solution() {
        let grid = Grid::new(2, vec![1, 2, 2, 1]);
        let cfg = config(4, 8);
        let found = Mutex::new(None);
        let mut worker = Worker::new(0, 1, &grid, &cfg, LoopbackMailbox::new());
        worker.run(&found);

        let solution = found.into_inner().expect("a Latin 2x2 square has the empty solution");
        assert!((0..2).flat_map(|r| (0..2).map(move |c| (r, c))).all(|(r, c)| solution.get(r, c) == crate::grid::OPEN));
    }

    #[test]
    fn single_worker_reports_no_solution_for_conflicting_grid() {
        let grid = Grid::new(2, vec![1, 1, 1, 1]);
        let cfg = config(4, 8);
        let found = Mutex::new(None);
        let mut worker = Worker::new(0, 1, &grid, &cfg, LoopbackMailbox::new());
        worker.run(&found);

        assert!(found.into_inner().is_none());
    }
}
