//! Regrouping a stream or batch under a different set of dimensions, with
//! optional `"*"` (all tags) and `excluded` support, splitting one incoming
//! batch into one outgoing `BufferedBatch` per resulting group (spec.md
//! §4.7 S3, grounded on `group_by.go`).
//!
//! Operates on the buffered grammar (`BufferedReceiver`), mirroring the
//! original's `edge.NewBufferingReceiver(g)` wiring — a caller on the raw
//! bracket grammar wraps this node in `BufferingReceiver`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::dimensions::{group_id, Dimensions, GroupId};
use crate::error::Result;
use crate::message::{BatchBegin, Barrier, BufferedBatch, Message, Point};
use crate::node::Gauge;
use crate::receiver::{BufferedReceiver, ForwardReceiver, NullTimer, Timer};
use crate::value::Tags;

/// Recomputes every point's/batch-point's `group`/`dimensions` under a new
/// dimension set and forwards it; downstream `GroupedConsumer`s
/// re-demultiplex from there.
///
/// `last_time` is the watermark of the most recent `Barrier`/`EndBatch`
/// seen; `emit` flushes every buffered per-group batch exactly when that
/// watermark advances, matching `group_by.go`'s `lastTime` comparison. The
/// very first watermark has nothing to compare against (Open Question 2:
/// resolved as a harmless no-op, not a special case).
pub struct GroupByNode<F> {
    explicit_dimensions: Dimensions,
    all_dimensions: bool,
    excluded: Vec<String>,
    last_time: Option<SystemTime>,
    groups: HashMap<GroupId, BufferedBatch>,
    cardinality: Gauge,
    timer: Arc<dyn Timer>,
    out: F,
}

impl<F: ForwardReceiver> GroupByNode<F> {
    pub fn new(dimensions: Dimensions, all_dimensions: bool, excluded: Vec<String>, out: F) -> Self {
        GroupByNode::with_timer(dimensions, all_dimensions, excluded, Arc::new(NullTimer), out)
    }

    pub fn with_timer(dimensions: Dimensions, all_dimensions: bool, excluded: Vec<String>, timer: Arc<dyn Timer>, out: F) -> Self {
        GroupByNode {
            explicit_dimensions: dimensions,
            all_dimensions,
            excluded,
            last_time: None,
            groups: HashMap::new(),
            cardinality: Gauge::new("group_by", "cardinality"),
            timer,
            out,
        }
    }

    pub fn last_time(&self) -> Option<SystemTime> {
        self.last_time
    }

    /// Number of distinct groups currently buffered, awaiting the next
    /// watermark (the Go version's `statCardinalityGauge`).
    pub fn cardinality(&self) -> usize {
        self.groups.len()
    }

    /// `determineDimensions`/`filterExcludedDimensions` combined: explicit
    /// mode uses the configured tag-name list verbatim and ignores
    /// `excluded`; `"*"` mode uses every tag name the point/batch-point
    /// itself carries, minus `excluded`.
    fn effective_dimensions(&self, tags: &Tags) -> Dimensions {
        if self.all_dimensions {
            let names: Vec<String> = tags.keys().filter(|name| !self.excluded.contains(name)).cloned().collect();
            Dimensions::new(names, self.explicit_dimensions.by_name)
        } else {
            Dimensions::new(self.explicit_dimensions.tag_names.to_vec(), self.explicit_dimensions.by_name)
        }
    }

    fn update_cardinality(&self) {
        self.cardinality.set(self.groups.len());
    }

    /// Sends every buffered group to the output edges once `t` differs from
    /// `last_time` (`group_by.go`'s `emit`). The node timer is assumed
    /// already running; forwarding is bracketed in `pause`/`resume` so
    /// downstream processing time isn't attributed to this node.
    fn emit(&mut self, t: SystemTime) -> Result<()> {
        if self.last_time != Some(t) {
            self.last_time = Some(t);
            let ids: Vec<GroupId> = self.groups.keys().copied().collect();
            for id in ids {
                if let Some(group) = self.groups.remove(&id) {
                    self.timer.pause();
                    let result = self.out.forward(Message::BufferedBatch(group));
                    self.timer.resume();
                    result?;
                }
            }
            self.update_cardinality();
        }
        Ok(())
    }

    fn accumulate(&mut self, batch: BufferedBatch) -> Result<()> {
        self.emit(batch.end.t_max)?;

        let name = batch.begin.name.clone();
        let size_hint = batch.begin.size_hint;
        let end = batch.end;
        for bp in batch.points {
            let dims = self.effective_dimensions(&bp.tags);
            let group = group_id(&name, &bp.tags, &dims);
            let entry = self.groups.entry(group).or_insert_with(|| {
                let mut tags = Tags::new();
                for dim in &dims.tag_names {
                    if let Some(value) = bp.tags.get(dim) {
                        tags.insert(dim.clone(), value.clone());
                    }
                }
                BufferedBatch {
                    begin: BatchBegin { name: name.clone(), group, tags, dimensions: dims.clone(), size_hint },
                    points: Vec::with_capacity(size_hint),
                    end,
                }
            });
            entry.points.push(bp);
        }
        self.update_cardinality();
        Ok(())
    }
}

impl<F: ForwardReceiver> BufferedReceiver for GroupByNode<F> {
    fn batch(&mut self, batch: BufferedBatch) -> Result<()> {
        self.timer.start();
        let result = self.accumulate(batch);
        self.timer.stop();
        result
    }

    fn point(&mut self, mut point: Point) -> Result<()> {
        self.timer.start();
        point.dimensions = self.effective_dimensions(&point.tags);
        point.update_group();
        self.timer.stop();
        self.out.forward(Message::Point(point))
    }

    /// Only triggers a flush of buffered groups — `group_by.go`'s `Barrier`
    /// callback never forwards the barrier itself downstream, only calls
    /// `emit`.
    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        self.timer.start();
        let result = self.emit(barrier.time);
        self.timer.stop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{Edge, EdgeKind};
    use crate::message::{BatchEnd, BatchPoint};
    use crate::receiver::ForwardingReceiver;
    use crate::value::Fields;
    use std::time::Duration;

    #[test]
    fn regroups_point_under_new_dimensions() {
        let out_edge = Edge::new(EdgeKind::Stream, 4);
        let mut node = GroupByNode::new(
            Dimensions::new(vec!["host".into()], false),
            false,
            Vec::new(),
            ForwardingReceiver::new(vec![out_edge.clone()]),
        );

        let mut tags = Tags::new();
        tags.insert("host".into(), "a".into());
        tags.insert("region".into(), "us".into());
        let original_dims = Dimensions::new(vec!["region".into()], false);
        let point = Point::new("cpu", tags, Fields::new(), SystemTime::UNIX_EPOCH, original_dims);
        let original_group = point.group;

        node.point(point).unwrap();
        let (message, _) = out_edge.next();
        match message.unwrap() {
            Message::Point(p) => {
                assert_ne!(p.group, original_group);
                assert_eq!(p.dimensions.tag_names.as_slice(), ["host"]);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn wildcard_dimensions_use_every_tag_minus_excluded() {
        let out_edge = Edge::new(EdgeKind::Stream, 4);
        let mut node = GroupByNode::new(
            Dimensions::default(),
            true,
            vec!["secret".into()],
            ForwardingReceiver::new(vec![out_edge.clone()]),
        );

        let mut tags = Tags::new();
        tags.insert("host".into(), "a".into());
        tags.insert("secret".into(), "x".into());
        let point = Point::new("cpu", tags, Fields::new(), SystemTime::UNIX_EPOCH, Dimensions::default());

        node.point(point).unwrap();
        let (message, _) = out_edge.next();
        match message.unwrap() {
            Message::Point(p) => assert_eq!(p.dimensions.tag_names.as_slice(), ["host"]),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn first_barrier_sets_watermark_without_special_casing() {
        let out_edge = Edge::new(EdgeKind::Stream, 4);
        let mut node = GroupByNode::new(Dimensions::default(), false, Vec::new(), ForwardingReceiver::new(vec![out_edge]));
        assert!(node.last_time().is_none());
        node.barrier(Barrier { time: SystemTime::UNIX_EPOCH }).unwrap();
        assert_eq!(node.last_time(), Some(SystemTime::UNIX_EPOCH));
    }

    /// S3: a single incoming batch spanning two hosts must split into two
    /// downstream batches, one per host, flushed only once the watermark
    /// advances past the batch that produced them.
    #[test]
    fn one_batch_splits_into_one_buffered_batch_per_group() {
        let out_edge = Edge::new(EdgeKind::Stream, 8);
        let mut node = GroupByNode::new(
            Dimensions::new(vec!["host".into()], false),
            false,
            Vec::new(),
            ForwardingReceiver::new(vec![out_edge.clone()]),
        );

        let incoming_dims = Dimensions::default();
        let incoming_tags = Tags::new();
        let incoming_group = group_id("cpu", &incoming_tags, &incoming_dims);
        let t0 = SystemTime::UNIX_EPOCH;
        let t1 = t0 + Duration::from_secs(10);

        let mut tags_a = Tags::new();
        tags_a.insert("host".into(), "a".into());
        let mut tags_b = Tags::new();
        tags_b.insert("host".into(), "b".into());

        node.batch(BufferedBatch {
            begin: BatchBegin { name: "cpu".into(), group: incoming_group, tags: incoming_tags, dimensions: incoming_dims, size_hint: 2 },
            points: vec![
                BatchPoint { time: t0, fields: Fields::new(), tags: tags_a },
                BatchPoint { time: t0, fields: Fields::new(), tags: tags_b },
            ],
            end: BatchEnd { t_max: t0 },
        })
        .unwrap();
        // Nothing flushed yet: the watermark hasn't moved.
        assert_eq!(node.cardinality(), 2);

        node.barrier(Barrier { time: t1 }).unwrap();
        assert_eq!(node.cardinality(), 0);
        out_edge.close().unwrap();

        let mut groups = Vec::new();
        while let (Some(Message::BufferedBatch(b)), true) = out_edge.next() {
            groups.push(b);
        }
        assert_eq!(groups.len(), 2);
        let mut hosts: Vec<String> = groups.iter().map(|b| b.begin.tags.get("host").cloned().unwrap()).collect();
        hosts.sort();
        assert_eq!(hosts, vec!["a".to_string(), "b".to_string()]);
        for group in &groups {
            assert_eq!(group.points.len(), 1);
        }
    }
}
