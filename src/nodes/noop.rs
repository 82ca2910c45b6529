//! Passes every message through unchanged — useful as a tee point or a
//! placeholder while wiring up a pipeline (spec.md §4.7, grounded on
//! `noop.go`).

use crate::error::Result;
use crate::message::{BatchBegin, BatchEnd, BatchPoint, Barrier, Message, Point};
use crate::receiver::{ForwardReceiver, Receiver};

pub struct NoOpNode<F> {
    out: F,
}

impl<F: ForwardReceiver> NoOpNode<F> {
    pub fn new(out: F) -> Self {
        NoOpNode { out }
    }
}

impl<F: ForwardReceiver> Receiver for NoOpNode<F> {
    fn begin_batch(&mut self, begin: BatchBegin) -> Result<()> {
        self.out.forward(Message::BeginBatch(begin))
    }

    fn batch_point(&mut self, point: BatchPoint) -> Result<()> {
        self.out.forward(Message::BatchPoint(point))
    }

    fn end_batch(&mut self, end: BatchEnd) -> Result<()> {
        self.out.forward(Message::EndBatch(end))
    }

    fn point(&mut self, point: Point) -> Result<()> {
        self.out.forward(Message::Point(point))
    }

    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        self.out.forward(Message::Barrier(barrier))
    }
}
