//! The bounded, concurrent FIFO that connects exactly one producer node to
//! exactly one consumer node.
//!
//! `Edge` is a cheap, `Clone`-able handle (an `Arc`-backed inner state, the
//! same shape as holding a shared pointer to a single channel) rather than
//! split producer/consumer halves — both `collect` and `next` are safe to
//! call concurrently from their respective single threads. Abort is
//! implemented by racing the real channel operation against a second,
//! zero-capacity "abort" channel in a `select!`: dropping the abort
//! channel's sender wakes any blocked `collect`/`next` immediately, without
//! waiting on buffer space or new messages.

pub mod stats;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::message::Message;

/// Default bounded capacity for an edge (spec.md §4.1, §6).
pub const DEFAULT_CAPACITY: usize = 1000;

/// Whether an edge carries a stream of individual points or batches.
///
/// Threaded through so the legacy adapter (legacy.rs) can pick `next_point`
/// or `next_batch` without inspecting message contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Stream,
    Batch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    Open,
    Closed,
    Aborted,
}

struct Inner {
    sender: Mutex<Option<Sender<Message>>>,
    receiver: Receiver<Message>,
    abort_tx: Mutex<Option<Sender<()>>>,
    abort_rx: Receiver<()>,
    state: Mutex<EdgeState>,
}

/// A unidirectional, bounded FIFO carrying `Message` values between two
/// nodes. See spec.md §4.1 for the full state-machine and blocking contract.
#[derive(Clone)]
pub struct Edge {
    inner: Arc<Inner>,
    kind: EdgeKind,
}

impl Edge {
    pub fn new(kind: EdgeKind, capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        let (abort_tx, abort_rx) = bounded(0);
        Edge {
            inner: Arc::new(Inner {
                sender: Mutex::new(Some(sender)),
                receiver,
                abort_tx: Mutex::new(Some(abort_tx)),
                abort_rx,
                state: Mutex::new(EdgeState::Open),
            }),
            kind,
        }
    }

    pub fn with_default_capacity(kind: EdgeKind) -> Self {
        Self::new(kind, DEFAULT_CAPACITY)
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// Enqueue `m`. Blocks while the buffer is full; fails with `Aborted`
    /// if the edge has been aborted, either before the call or while it was
    /// blocked waiting for room.
    pub fn collect(&self, m: Message) -> Result<()> {
        if *self.inner.state.lock() == EdgeState::Aborted {
            return Err(Error::Aborted);
        }
        let sender = match self.inner.sender.lock().as_ref() {
            Some(s) => s.clone(),
            None => return Err(Error::Aborted),
        };
        select! {
            send(sender, m) -> res => res.map_err(|_| Error::Aborted),
            recv(self.inner.abort_rx) -> _ => Err(Error::Aborted),
        }
    }

    /// Dequeue the next message. Blocks until one arrives; returns
    /// `(None, false)` once the edge is drained after `close`, or
    /// immediately on `abort`.
    pub fn next(&self) -> (Option<Message>, bool) {
        if *self.inner.state.lock() == EdgeState::Aborted {
            return (None, false);
        }
        select! {
            recv(self.inner.receiver) -> res => match res {
                Ok(m) => (Some(m), true),
                Err(_) => (None, false),
            },
            recv(self.inner.abort_rx) -> _ => (None, false),
        }
    }

    /// Signal that no more messages will be collected. Buffered messages
    /// still flow to the consumer until drained. Calling `close` a second
    /// time is a contract violation and fails; calling it after `abort` is
    /// a no-op.
    pub fn close(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        match *state {
            EdgeState::Aborted => Ok(()),
            EdgeState::Closed => Err(Error::AlreadyClosed),
            EdgeState::Open => {
                *state = EdgeState::Closed;
                drop(state);
                self.inner.sender.lock().take();
                Ok(())
            }
        }
    }

    /// Immediate shutdown: unblocks any pending `collect`/`next`, discards
    /// buffered messages going forward, and makes all future calls fail
    /// fast. Idempotent.
    pub fn abort(&self) {
        let mut state = self.inner.state.lock();
        if *state == EdgeState::Aborted {
            return;
        }
        *state = EdgeState::Aborted;
        drop(state);
        self.inner.abort_tx.lock().take();
        self.inner.sender.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Barrier, Message};
    use std::time::{Duration, SystemTime};

    fn barrier(secs: u64) -> Message {
        Message::Barrier(Barrier {
            time: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        })
    }

    #[test]
    fn round_trip_preserves_order() {
        let edge = Edge::new(EdgeKind::Stream, 4);
        for i in 0..10 {
            edge.collect(barrier(i)).unwrap();
        }
        edge.close().unwrap();
        let mut seen = Vec::new();
        loop {
            let (m, ok) = edge.next();
            if !ok {
                break;
            }
            seen.push(m.unwrap());
        }
        let expected: Vec<_> = (0..10).map(barrier).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn close_is_not_idempotent() {
        let edge = Edge::new(EdgeKind::Stream, 4);
        edge.close().unwrap();
        assert!(matches!(edge.close(), Err(Error::AlreadyClosed)));
    }

    #[test]
    fn close_after_abort_is_noop() {
        let edge = Edge::new(EdgeKind::Stream, 4);
        edge.abort();
        assert!(edge.close().is_ok());
    }

    #[test]
    fn abort_is_idempotent() {
        let edge = Edge::new(EdgeKind::Stream, 4);
        edge.abort();
        edge.abort();
    }

    #[test]
    fn abort_unblocks_a_full_producer() {
        let edge = Edge::new(EdgeKind::Stream, 1);
        edge.collect(barrier(0)).unwrap();

        let producer_edge = edge.clone();
        let handle = std::thread::spawn(move || producer_edge.collect(barrier(1)));

        std::thread::sleep(Duration::from_millis(50));
        edge.abort();

        let result = handle.join().unwrap();
        assert!(matches!(result, Err(Error::Aborted)));

        let (_, ok) = edge.next();
        assert!(!ok);
    }

    #[test]
    fn collect_after_abort_fails() {
        let edge = Edge::new(EdgeKind::Stream, 4);
        edge.abort();
        assert!(matches!(edge.collect(barrier(0)), Err(Error::Aborted)));
    }
}
