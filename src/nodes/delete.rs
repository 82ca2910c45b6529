//! Removing named tags and fields from every point on an edge.

use std::collections::HashSet;
use std::sync::Arc;

use crate::dimensions::Dimensions;
use crate::error::Result;
use crate::message::{BatchBegin, BatchEnd, BatchPoint, Barrier, Message, Point};
use crate::node::Counter;
use crate::receiver::{ForwardReceiver, NullTimer, Receiver, Timer};
use crate::value::{Fields, Tags};

/// Deletes `fields`/`tags` by name, recomputing the group ID whenever a
/// deleted tag was part of the point's dimensions (spec.md §4.7, grounded
/// on `delete.go`).
///
/// `BeginBatch` only strips tags from the batch's own tag set — unlike
/// `Point`, it never touches `group`/`dimensions` (`delete.go`'s
/// `BeginBatch` callback does the same).
pub struct DeleteNode<F> {
    fields: Vec<String>,
    tags: HashSet<String>,
    fields_deleted: Counter,
    tags_deleted: Counter,
    timer: Arc<dyn Timer>,
    out: F,
}

impl<F: ForwardReceiver> DeleteNode<F> {
    pub fn new(fields: Vec<String>, tags: Vec<String>, out: F) -> Self {
        DeleteNode::with_timer(fields, tags, Arc::new(NullTimer), out)
    }

    pub fn with_timer(fields: Vec<String>, tags: Vec<String>, timer: Arc<dyn Timer>, out: F) -> Self {
        DeleteNode {
            fields,
            tags: tags.into_iter().collect(),
            fields_deleted: Counter::new("delete", "fields_deleted_total"),
            tags_deleted: Counter::new("delete", "tags_deleted_total"),
            timer,
            out,
        }
    }

    pub fn fields_deleted(&self) -> u64 {
        self.fields_deleted.get()
    }

    pub fn tags_deleted(&self) -> u64 {
        self.tags_deleted.get()
    }

    fn strip_tags(&self, tags: &mut Tags) -> bool {
        let mut removed = 0u64;
        for tag in &self.tags {
            if tags.remove(tag).is_some() {
                removed += 1;
            }
        }
        self.tags_deleted.add(removed);
        removed > 0
    }

    fn strip_fields(&self, fields: &mut Fields) {
        let mut removed = 0u64;
        for field in &self.fields {
            if fields.remove(field).is_some() {
                removed += 1;
            }
        }
        self.fields_deleted.add(removed);
    }

    /// Drops any deleted tag name out of `dimensions.tag_names`, mirroring
    /// `delete.go`'s rebuild of `Dimensions.TagNames` before recomputing the
    /// group — otherwise a stale dimension name with no matching tag left in
    /// the map still perturbs `group_id` (spec.md §8 scenario S2).
    fn strip_dimensions(&self, dimensions: &mut Dimensions) -> bool {
        let before = dimensions.tag_names.len();
        dimensions.tag_names.retain(|name| !self.tags.contains(name));
        dimensions.tag_names.len() != before
    }
}

impl<F: ForwardReceiver> Receiver for DeleteNode<F> {
    fn begin_batch(&mut self, mut begin: BatchBegin) -> Result<()> {
        self.strip_tags(&mut begin.tags);
        self.out.forward(Message::BeginBatch(begin))
    }

    fn batch_point(&mut self, mut point: BatchPoint) -> Result<()> {
        self.strip_tags(&mut point.tags);
        self.strip_fields(&mut point.fields);
        self.out.forward(Message::BatchPoint(point))
    }

    fn end_batch(&mut self, end: BatchEnd) -> Result<()> {
        self.out.forward(Message::EndBatch(end))
    }

    fn point(&mut self, mut point: Point) -> Result<()> {
        self.timer.start();
        let tags_changed = self.strip_tags(&mut point.tags);
        let dims_changed = self.strip_dimensions(&mut point.dimensions);
        if tags_changed || dims_changed {
            point.update_group();
        }
        self.strip_fields(&mut point.fields);
        if tags_changed || dims_changed {
            tracing::debug!(group = ?point.group, "recomputed group after deleting a dimension tag");
        }
        let result = self.out.forward(Message::Point(point));
        self.timer.stop();
        result
    }

    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        self.out.forward(Message::Barrier(barrier))
    }
}
