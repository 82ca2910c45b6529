//! Bridging the typed message model to the monolithic point/batch API an
//! older caller expects (spec.md §4.8, grounded on `edge.go`'s
//! `LegacyEdge`).
//!
//! Collecting and draining are independently serialized: a collector and a
//! drainer on the same `LegacyEdge` never contend for the same lock, just
//! as on the underlying `Edge` itself.

use parking_lot::Mutex;

use crate::edge::Edge;
use crate::error::Result;
use crate::message::{BufferedBatch, Message, MessageType, Point};

pub struct LegacyEdge {
    edge: Edge,
    collect_lock: Mutex<()>,
    next_lock: Mutex<()>,
}

impl LegacyEdge {
    pub fn new(edge: Edge) -> Self {
        LegacyEdge {
            edge,
            collect_lock: Mutex::new(()),
            next_lock: Mutex::new(()),
        }
    }

    pub fn collect_point(&self, point: Point) -> Result<()> {
        let _guard = self.collect_lock.lock();
        self.edge.collect(Message::Point(point))
    }

    pub fn collect_batch(&self, batch: BufferedBatch) -> Result<()> {
        let _guard = self.collect_lock.lock();
        self.edge.collect(Message::BufferedBatch(batch))
    }

    /// Returns `Ok(None)` once the edge is drained or aborted.
    ///
    /// Skips any message that isn't a `Point` — a stray message type is
    /// logged and dropped, never fatal (spec.md §4.8).
    pub fn next_point(&self) -> Result<Option<Point>> {
        let _guard = self.next_lock.lock();
        loop {
            match self.edge.next() {
                (Some(Message::Point(p)), true) => return Ok(Some(p)),
                (Some(other), true) => {
                    tracing::warn!(found = ?other.message_type(), expected = ?MessageType::Point, "skipping unexpected message on legacy edge");
                }
                (_, _) => return Ok(None),
            }
        }
    }

    /// Returns `Ok(None)` once the edge is drained or aborted.
    ///
    /// Skips any message that isn't a `BufferedBatch` — a stray message type
    /// is logged and dropped, never fatal (spec.md §4.8).
    pub fn next_batch(&self) -> Result<Option<BufferedBatch>> {
        let _guard = self.next_lock.lock();
        loop {
            match self.edge.next() {
                (Some(Message::BufferedBatch(b)), true) => return Ok(Some(b)),
                (Some(other), true) => {
                    tracing::warn!(found = ?other.message_type(), expected = ?MessageType::BufferedBatch, "skipping unexpected message on legacy edge");
                }
                (_, _) => return Ok(None),
            }
        }
    }

    pub fn close(&self) -> Result<()> {
        self.edge.close()
    }

    pub fn abort(&self) {
        self.edge.abort()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::Dimensions;
    use crate::edge::EdgeKind;
    use crate::message::{BatchBegin, BatchEnd};
    use crate::value::{Fields, Tags};
    use std::time::SystemTime;

    #[test]
    fn next_point_skips_a_stray_buffered_batch() {
        use crate::message::Point;

        let legacy = LegacyEdge::new(Edge::new(EdgeKind::Batch, 4));
        let dims = Dimensions::default();
        let batch = BufferedBatch {
            begin: BatchBegin {
                name: "cpu".into(),
                group: crate::dimensions::group_id("cpu", &Tags::new(), &dims),
                tags: Tags::new(),
                dimensions: dims.clone(),
                size_hint: 0,
            },
            points: Vec::new(),
            end: BatchEnd { t_max: SystemTime::UNIX_EPOCH },
        };
        legacy.collect_batch(batch).unwrap();
        let point = Point::new("cpu", Tags::new(), Fields::new(), SystemTime::UNIX_EPOCH, dims);
        legacy.collect_point(point.clone()).unwrap();
        legacy.close().unwrap();

        let next = legacy.next_point().unwrap();
        assert_eq!(next, Some(point));
        assert!(legacy.next_point().unwrap().is_none());
    }

    #[test]
    fn drains_to_none_after_close() {
        let legacy = LegacyEdge::new(Edge::new(EdgeKind::Stream, 4));
        legacy.close().unwrap();
        assert!(legacy.next_point().unwrap().is_none());
    }
}
