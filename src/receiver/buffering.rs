//! Materializing a `BeginBatch...EndBatch` bracket into a single
//! `BufferedBatch` value before handing it to a receiver (spec.md §4.6).

use crate::consumer::{BufferedReceiver, Receiver};
use crate::error::Result;
use crate::message::{BatchBegin, BatchEnd, BatchPoint, Barrier, BufferedBatch, Point};

/// Adapts any `BufferedReceiver` into a `Receiver` by accumulating the
/// bracket in memory. `size_hint` from `BeginBatch` sizes the initial
/// allocation but is never clamped — a bad hint costs a reallocation, not
/// correctness (Open Question 1, resolved in DESIGN.md).
pub struct BufferingReceiver<R> {
    inner: R,
    current: Option<(BatchBegin, Vec<BatchPoint>)>,
}

impl<R: BufferedReceiver> BufferingReceiver<R> {
    pub fn new(inner: R) -> Self {
        BufferingReceiver { inner, current: None }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufferedReceiver> Receiver for BufferingReceiver<R> {
    fn begin_batch(&mut self, begin: BatchBegin) -> Result<()> {
        let points = Vec::with_capacity(begin.size_hint);
        self.current = Some((begin, points));
        Ok(())
    }

    fn batch_point(&mut self, point: BatchPoint) -> Result<()> {
        if let Some((_, points)) = &mut self.current {
            points.push(point);
        }
        Ok(())
    }

    fn end_batch(&mut self, end: BatchEnd) -> Result<()> {
        if let Some((begin, points)) = self.current.take() {
            self.inner.batch(BufferedBatch { begin, points, end })?;
        }
        Ok(())
    }

    fn point(&mut self, point: Point) -> Result<()> {
        self.inner.point(point)
    }

    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        self.inner.barrier(barrier)
    }
}
