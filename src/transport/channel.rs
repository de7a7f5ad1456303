//! `crossbeam-channel`-backed [`Mailbox`] wiring P worker threads into a
//! full mesh of unidirectional channels, one per (sender, receiver) pair.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{Mailbox, Payload, Tag};

struct Envelope {
    from: usize,
    tag: Tag,
    payload: Payload,
}

/// One worker's view of the mesh: a single inbox shared by every peer, and
/// one outbox per destination rank.
pub struct ChannelMailbox {
    rank: usize,
    inbox: Receiver<Envelope>,
    outboxes: Vec<Sender<Envelope>>,
    // Messages pulled off `inbox` while looking for a different (src, tag)
    // are parked here rather than dropped, so a later matching receive still
    // observes them in arrival order (§4.3: FIFO per (source, dest, tag),
    // no ordering guarantee across tags or sources).
    pending: Vec<Envelope>,
}

impl ChannelMailbox {
    /// Builds a fully connected mesh of `world_size` mailboxes, indexed by
    /// rank, each wired to every other rank's inbox.
    pub fn mesh(world_size: usize) -> Vec<ChannelMailbox> {
        let mut senders: Vec<Sender<Envelope>> = Vec::with_capacity(world_size);
        let mut receivers: Vec<Receiver<Envelope>> = Vec::with_capacity(world_size);
        for _ in 0..world_size {
            let (tx, rx) = unbounded();
            senders.push(tx);
            receivers.push(rx);
        }

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ChannelMailbox {
                rank,
                inbox,
                outboxes: senders.clone(),
                pending: Vec::new(),
            })
            .collect()
    }

    fn take_pending(&mut self, src: Option<usize>, tag: Tag) -> Option<Envelope> {
        let pos = self
            .pending
            .iter()
            .position(|env| env.tag == tag && src.map_or(true, |s| s == env.from))?;
        Some(self.pending.remove(pos))
    }
}

impl Mailbox for ChannelMailbox {
    fn send(&mut self, dest: usize, tag: Tag, payload: Payload) {
        let envelope = Envelope {
            from: self.rank,
            tag,
            payload,
        };
        // A disconnected peer only happens at shutdown, after termination
        // has already been decided; dropping the message is harmless there.
        let _ = self.outboxes[dest].send(envelope);
    }

    fn try_recv(&mut self, src: Option<usize>, tag: Tag) -> Option<(usize, Payload)> {
        if let Some(env) = self.take_pending(src, tag) {
            return Some((env.from, env.payload));
        }

        loop {
            match self.inbox.try_recv() {
                Ok(env) => {
                    if env.tag == tag && src.map_or(true, |s| s == env.from) {
                        return Some((env.from, env.payload));
                    }
                    self.pending.push(env);
                }
                Err(_) => return None,
            }
        }
    }

    fn recv(&mut self, src: usize, tag: Tag) -> Payload {
        if let Some(env) = self.take_pending(Some(src), tag) {
            return env.payload;
        }

        loop {
            match self.inbox.recv() {
                Ok(env) => {
                    if env.tag == tag && env.from == src {
                        return env.payload;
                    }
                    self.pending.push(env);
                }
                Err(_) => panic!("mailbox for rank {} disconnected while awaiting {:?} from {}", self.rank, tag, src),
            }
        }
    }
}
