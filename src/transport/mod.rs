//! Messaging layer (C3, §4.3): a small `Mailbox` capability factored out so
//! the search engine can be driven against a real transport or an
//! in-process mock, following the teacher crate's pattern of hiding a
//! collaborator behind a narrow trait (its `Frontier` trait behind
//! `SimpleFrontier`/`NoDupFrontier`).

mod channel;
mod loopback;

pub use channel::ChannelMailbox;
pub use loopback::LoopbackMailbox;

use crate::state::CompressedState;

/// The six logical channels of the protocol, distinguished by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Request,
    Work,
    NoWork,
    SolutionFound,
    Token,
    Termination,
}

/// Token color (§3, §4.5): white means "no backward activation observed
/// this round", black is its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn as_byte(self) -> u8 {
        match self {
            Color::White => b'W',
            Color::Black => b'B',
        }
    }

    pub fn from_byte(b: u8) -> Self {
        if b == b'B' {
            Color::Black
        } else {
            Color::White
        }
    }
}

/// Wire payloads (§6): a single zero byte for the signal-only tags, a
/// one-byte token color, or an array of compressed states for `Work`.
#[derive(Debug, Clone)]
pub enum Payload {
    Signal,
    Token(Color),
    Work(Vec<CompressedState>),
}

/// The messaging capability every worker drives the protocol through.
///
/// Implementors only need to guarantee FIFO delivery per (source,
/// destination, tag) — the spec explicitly allows reordering across tags or
/// sources (§5).
pub trait Mailbox {
    /// Non-blocking send; ordering per (source, dest, tag) is required.
    fn send(&mut self, dest: usize, tag: Tag, payload: Payload);

    /// Non-blocking peek+receive. `src = None` accepts any source.
    fn try_recv(&mut self, src: Option<usize>, tag: Tag) -> Option<(usize, Payload)>;

    /// Blocking receive from a specific, known producer.
    fn recv(&mut self, src: usize, tag: Tag) -> Payload;
}
