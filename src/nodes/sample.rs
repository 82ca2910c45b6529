//! Thinning a stream or a stream of whole batches: keep one point (or one
//! batch) in every N, or one per fixed interval, independently per group
//! (spec.md §4.7, grounded on `sample.go`).
//!
//! Batches arrive pre-assembled (`BufferedReceiver`, not the raw bracket
//! grammar) because `shouldKeep` in the original is evaluated once per whole
//! batch — `b.Group`/`b.TMax` are only known once the bracket is closed, so
//! a node driven off the raw grammar can't make the keep/skip decision until
//! `EndBatch` anyway. A caller wanting the raw grammar wraps this node in
//! `BufferingReceiver`, same as `GroupByNode`.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use crate::dimensions::GroupId;
use crate::error::{Error, Result};
use crate::message::{Barrier, BufferedBatch, Message, Point};
use crate::node::Gauge;
use crate::receiver::{BufferedReceiver, ForwardReceiver};

#[derive(Debug, Clone, Copy)]
pub enum SampleMode {
    /// Keep every Nth point/batch seen for a group (N >= 1; N == 1 is identity).
    Count(u64),
    /// Keep a point/batch iff its timestamp falls exactly on a `Duration`
    /// boundary — stateless, no per-group bookkeeping (`shouldKeep` in
    /// `sample.go` for duration mode: `t.Equal(t.Truncate(duration))`).
    Interval(Duration),
}

pub struct SampleNode<F> {
    mode: SampleMode,
    counters: HashMap<GroupId, u64>,
    cardinality: Gauge,
    out: F,
}

impl<F: ForwardReceiver> SampleNode<F> {
    pub fn new(mode: SampleMode, out: F) -> Result<Self> {
        if let SampleMode::Count(0) = mode {
            return Err(Error::InvalidConfig("sample count must be at least 1".into()));
        }
        Ok(SampleNode {
            mode,
            counters: HashMap::new(),
            cardinality: Gauge::new("sample", "cardinality"),
            out,
        })
    }

    fn should_emit(&mut self, group: GroupId, time: SystemTime) -> bool {
        match self.mode {
            SampleMode::Count(n) => {
                let counter = self.counters.entry(group).or_insert(0);
                let emit = *counter % n == 0;
                *counter += 1;
                self.cardinality.set(self.counters.len());
                emit
            }
            SampleMode::Interval(interval) => {
                let since_epoch = time.duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
                let step = interval.as_nanos();
                step != 0 && since_epoch.as_nanos() % step == 0
            }
        }
    }
}

impl<F: ForwardReceiver> BufferedReceiver for SampleNode<F> {
    fn batch(&mut self, batch: BufferedBatch) -> Result<()> {
        if self.should_emit(batch.begin.group, batch.end.t_max) {
            self.out.forward(Message::BufferedBatch(batch))
        } else {
            Ok(())
        }
    }

    fn point(&mut self, point: Point) -> Result<()> {
        if self.should_emit(point.group, point.time) {
            self.out.forward(Message::Point(point))
        } else {
            Ok(())
        }
    }

    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        self.out.forward(Message::Barrier(barrier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::Receiver;
    use crate::dimensions::Dimensions;
    use crate::edge::{Edge, EdgeKind};
    use crate::message::{BatchBegin, BatchEnd, BatchPoint};
    use crate::receiver::{BufferingReceiver, ForwardingReceiver};
    use crate::value::{Fields, Tags};

    #[test]
    fn count_mode_keeps_every_nth() {
        let out_edge = Edge::new(EdgeKind::Stream, 8);
        let mut node = SampleNode::new(SampleMode::Count(3), ForwardingReceiver::new(vec![out_edge.clone()])).unwrap();
        let dims = Dimensions::default();
        for i in 0..6u64 {
            let point = Point::new(
                "cpu",
                Tags::new(),
                Fields::new(),
                SystemTime::UNIX_EPOCH + Duration::from_secs(i),
                dims.clone(),
            );
            node.point(point).unwrap();
        }
        out_edge.close().unwrap();
        let mut kept = 0;
        while let (Some(_), true) = out_edge.next() {
            kept += 1;
        }
        assert_eq!(kept, 2);
    }

    #[test]
    fn interval_mode_keeps_points_on_boundary_regardless_of_history() {
        let out_edge = Edge::new(EdgeKind::Stream, 8);
        let mut node =
            SampleNode::new(SampleMode::Interval(Duration::from_secs(10)), ForwardingReceiver::new(vec![out_edge.clone()])).unwrap();
        let dims = Dimensions::default();

        // A burst of points all truncating to the same boundary must all be
        // kept — duration mode has no "since last kept" bookkeeping.
        for offset in [0u64, 0, 10, 10, 17] {
            let point = Point::new(
                "cpu",
                Tags::new(),
                Fields::new(),
                SystemTime::UNIX_EPOCH + Duration::from_secs(offset),
                dims.clone(),
            );
            node.point(point).unwrap();
        }
        out_edge.close().unwrap();
        let mut kept = 0;
        while let (Some(_), true) = out_edge.next() {
            kept += 1;
        }
        assert_eq!(kept, 4);
    }

    #[test]
    fn rejects_zero_count() {
        let out_edge = Edge::new(EdgeKind::Stream, 1);
        assert!(SampleNode::new(SampleMode::Count(0), ForwardingReceiver::new(vec![out_edge])).is_err());
    }

    #[test]
    fn batch_mode_keeps_or_skips_the_whole_batch() {
        let out_edge = Edge::new(EdgeKind::Stream, 8);
        let node = SampleNode::new(SampleMode::Count(2), ForwardingReceiver::new(vec![out_edge.clone()])).unwrap();
        let mut buffering = BufferingReceiver::new(node);

        let dims = Dimensions::default();
        let group = crate::dimensions::group_id("cpu", &Tags::new(), &dims);
        for i in 0..2u64 {
            buffering
                .begin_batch(BatchBegin {
                    name: "cpu".into(),
                    group,
                    tags: Tags::new(),
                    dimensions: dims.clone(),
                    size_hint: 1,
                })
                .unwrap();
            buffering
                .batch_point(BatchPoint { time: SystemTime::UNIX_EPOCH, fields: Fields::new(), tags: Tags::new() })
                .unwrap();
            buffering
                .end_batch(BatchEnd { t_max: SystemTime::UNIX_EPOCH + Duration::from_secs(i) })
                .unwrap();
        }
        out_edge.close().unwrap();

        let mut kept = 0;
        while let (Some(_), true) = out_edge.next() {
            kept += 1;
        }
        assert_eq!(kept, 1);
    }
}
