//! Filling in tag/field values a point doesn't already carry.

use std::sync::Arc;

use crate::error::Result;
use crate::message::{BatchBegin, BatchEnd, BatchPoint, Barrier, Message, Point};
use crate::node::Counter;
use crate::receiver::{ForwardReceiver, NullTimer, Receiver, Timer};
use crate::value::{Fields, Tags};

/// Sets `tags`/`fields` on every point that doesn't already define them.
/// Existing values are never overwritten (spec.md §4.7, grounded on
/// `default.go`).
pub struct DefaultNode<F> {
    tags: Tags,
    fields: Fields,
    tags_defaulted: Counter,
    fields_defaulted: Counter,
    timer: Arc<dyn Timer>,
    out: F,
}

impl<F: ForwardReceiver> DefaultNode<F> {
    pub fn new(tags: Tags, fields: Fields, out: F) -> Self {
        DefaultNode::with_timer(tags, fields, Arc::new(NullTimer), out)
    }

    pub fn with_timer(tags: Tags, fields: Fields, timer: Arc<dyn Timer>, out: F) -> Self {
        DefaultNode {
            tags,
            fields,
            tags_defaulted: Counter::new("default", "tags_defaulted_total"),
            fields_defaulted: Counter::new("default", "fields_defaulted_total"),
            timer,
            out,
        }
    }

    pub fn tags_defaulted(&self) -> u64 {
        self.tags_defaulted.get()
    }

    pub fn fields_defaulted(&self) -> u64 {
        self.fields_defaulted.get()
    }

    fn apply_tags(&self, tags: &mut Tags) -> bool {
        let mut added = 0u64;
        for (k, v) in &self.tags {
            if !tags.contains_key(k) {
                tags.insert(k.clone(), v.clone());
                added += 1;
            }
        }
        self.tags_defaulted.add(added);
        added > 0
    }

    fn apply_fields(&self, fields: &mut Fields) {
        let mut added = 0u64;
        for (k, v) in &self.fields {
            if let std::collections::hash_map::Entry::Vacant(entry) = fields.entry(k.clone()) {
                entry.insert(v.clone());
                added += 1;
            }
        }
        self.fields_defaulted.add(added);
    }
}

impl<F: ForwardReceiver> Receiver for DefaultNode<F> {
    fn begin_batch(&mut self, mut begin: BatchBegin) -> Result<()> {
        if self.apply_tags(&mut begin.tags) {
            begin.update_group();
        }
        self.out.forward(Message::BeginBatch(begin))
    }

    fn batch_point(&mut self, mut point: BatchPoint) -> Result<()> {
        self.apply_tags(&mut point.tags);
        self.apply_fields(&mut point.fields);
        self.out.forward(Message::BatchPoint(point))
    }

    fn end_batch(&mut self, end: BatchEnd) -> Result<()> {
        self.out.forward(Message::EndBatch(end))
    }

    fn point(&mut self, mut point: Point) -> Result<()> {
        self.timer.start();
        if self.apply_tags(&mut point.tags) {
            point.update_group();
            tracing::debug!(group = ?point.group, "recomputed group after defaulting a tag");
        }
        self.apply_fields(&mut point.fields);
        let result = self.out.forward(Message::Point(point));
        self.timer.stop();
        result
    }

    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        self.out.forward(Message::Barrier(barrier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::Dimensions;
    use crate::edge::{Edge, EdgeKind};
    use crate::message::Message;
    use crate::receiver::ForwardingReceiver;
    use crate::value::Value;
    use std::time::SystemTime;

    #[test]
    fn fills_missing_tag_and_recomputes_group() {
        let out_edge = Edge::new(EdgeKind::Stream, 4);
        let out = ForwardingReceiver::new(vec![out_edge.clone()]);
        let mut defaults = Tags::new();
        defaults.insert("dc".into(), "west".into());
        let mut node = DefaultNode::new(defaults, Fields::new(), out);

        let dims = Dimensions::new(vec!["dc".into()], false);
        let point = Point::new("cpu", Tags::new(), Fields::new(), SystemTime::UNIX_EPOCH, dims.clone());
        let unfilled_group = point.group;
        node.point(point).unwrap();

        let (message, ok) = out_edge.next();
        assert!(ok);
        match message.unwrap() {
            Message::Point(p) => {
                assert_eq!(p.tags.get("dc"), Some(&"west".to_string()));
                assert_ne!(p.group, unfilled_group);
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert_eq!(node.tags_defaulted(), 1);
    }

    #[test]
    fn does_not_overwrite_existing_field() {
        let out_edge = Edge::new(EdgeKind::Stream, 4);
        let out = ForwardingReceiver::new(vec![out_edge.clone()]);
        let mut defaults = Fields::new();
        defaults.insert("region".into(), Value::Str("west".into()));
        let mut node = DefaultNode::new(Tags::new(), defaults, out);

        let dims = Dimensions::default();
        let mut fields = Fields::new();
        fields.insert("region".into(), Value::Str("east".into()));
        let point = Point::new("cpu", Tags::new(), fields, SystemTime::UNIX_EPOCH, dims);
        node.point(point).unwrap();

        let (message, _) = out_edge.next();
        match message.unwrap() {
            Message::Point(p) => assert_eq!(p.fields.get("region"), Some(&Value::Str("east".into()))),
            other => panic!("unexpected message {other:?}"),
        }
        assert_eq!(node.fields_defaulted(), 0);
    }
}
