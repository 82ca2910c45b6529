//! Driving an `Edge` to exhaustion, dispatching each message to a `Receiver`.

use crate::edge::Edge;
use crate::error::Result;
use crate::message::{BatchBegin, BatchEnd, BatchPoint, Barrier, BufferedBatch, Message, Point};

/// Callbacks for the un-buffered message grammar: `Point`s and `Barrier`s
/// arrive individually, batches arrive as a `BeginBatch ... EndBatch`
/// bracket (spec.md §4.3).
///
/// Any `Err` returned from a callback stops `Consumer::run` and is
/// propagated to its caller — there is no per-message recovery at this
/// layer (that's the node's job, see `error.rs`'s `EvalError` doc comment).
pub trait Receiver {
    fn begin_batch(&mut self, begin: BatchBegin) -> Result<()>;
    fn batch_point(&mut self, point: BatchPoint) -> Result<()>;
    fn end_batch(&mut self, end: BatchEnd) -> Result<()>;
    fn point(&mut self, point: Point) -> Result<()>;
    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        let _ = barrier;
        Ok(())
    }
}

/// Callbacks for the buffered grammar: whole batches arrive pre-assembled
/// (spec.md §4.6).
pub trait BufferedReceiver {
    fn batch(&mut self, batch: BufferedBatch) -> Result<()>;
    fn point(&mut self, point: Point) -> Result<()>;
    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        let _ = barrier;
        Ok(())
    }
}

/// Drains an edge, dispatching each `Message` to a `Receiver`.
///
/// Matching `Message` exhaustively here is what makes `Error::ImpossibleType`
/// unreachable on this path — every variant has a home.
pub struct Consumer<R> {
    edge: Edge,
    receiver: R,
}

impl<R: Receiver> Consumer<R> {
    pub fn new(edge: Edge, receiver: R) -> Self {
        Consumer { edge, receiver }
    }

    pub fn into_receiver(self) -> R {
        self.receiver
    }

    /// Run until the edge is drained (`close`d and empty) or aborted.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let (message, ok) = self.edge.next();
            if !ok {
                return Ok(());
            }
            let Some(message) = message else {
                return Ok(());
            };
            match message {
                Message::Point(p) => self.receiver.point(p)?,
                Message::BeginBatch(b) => self.receiver.begin_batch(b)?,
                Message::BatchPoint(p) => self.receiver.batch_point(p)?,
                Message::EndBatch(e) => self.receiver.end_batch(e)?,
                Message::Barrier(b) => self.receiver.barrier(b)?,
                Message::BufferedBatch(buffered) => {
                    // A buffered batch arriving on an un-buffered receiver is
                    // unwrapped into its bracket form, so any `Receiver` can
                    // consume either grammar transparently.
                    self.receiver.begin_batch(buffered.begin.clone())?;
                    for point in buffered.points {
                        self.receiver.batch_point(point)?;
                    }
                    self.receiver.end_batch(buffered.end)?;
                }
            }
        }
    }
}
