//! The wire-level message model carried on an edge.
//!
//! `Message` is a tagged union (a plain Rust `enum`) rather than a
//! polymorphic interface — see the "tagged unions over message
//! polymorphism" design note. Pattern-matching on it exhaustively is what
//! makes `ImpossibleType` unreachable from `Consumer::run` (consumer.rs).

use std::time::SystemTime;

use crate::dimensions::{group_id, Dimensions, GroupId};
use crate::value::{Fields, Tags};

/// A single time-series observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub name: String,
    pub tags: Tags,
    pub fields: Fields,
    pub time: SystemTime,
    pub group: GroupId,
    pub dimensions: Dimensions,
}

impl Point {
    /// Construct a point and compute its group-ID from `name`/`tags`/`dimensions`.
    pub fn new(name: impl Into<String>, tags: Tags, fields: Fields, time: SystemTime, dimensions: Dimensions) -> Self {
        let name = name.into();
        let group = group_id(&name, &tags, &dimensions);
        Point {
            name,
            tags,
            fields,
            time,
            group,
            dimensions,
        }
    }

    /// Recompute `group` from the current `name`/`tags`/`dimensions`.
    ///
    /// Must be called by any transform that mutates tags or dimensions
    /// before the point is forwarded (spec.md §3 invariants).
    pub fn update_group(&mut self) {
        self.group = group_id(&self.name, &self.tags, &self.dimensions);
    }

    pub fn group_info(&self) -> GroupInfo {
        GroupInfo {
            group: self.group,
            tags: self.tags.clone(),
            dimensions: self.dimensions.clone(),
        }
    }
}

/// The opening bracket of a batch: one per group, matched by exactly one
/// later `BatchEnd` on the same edge.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchBegin {
    pub name: String,
    pub group: GroupId,
    pub tags: Tags,
    pub dimensions: Dimensions,
    /// Advisory capacity hint for the points that will follow; not clamped
    /// (see Open Question 1 in SPEC_FULL.md / DESIGN.md).
    pub size_hint: usize,
}

impl BatchBegin {
    pub fn update_group(&mut self) {
        self.group = group_id(&self.name, &self.tags, &self.dimensions);
    }

    pub fn group_info(&self) -> GroupInfo {
        GroupInfo {
            group: self.group,
            tags: self.tags.clone(),
            dimensions: self.dimensions.clone(),
        }
    }
}

/// One observation inside a batch; carries its own tags (which may differ
/// from the batch's tags, e.g. before a group-by splits them out).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPoint {
    pub time: SystemTime,
    pub fields: Fields,
    pub tags: Tags,
}

/// The closing bracket of a batch: the upper time bound of its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchEnd {
    pub t_max: SystemTime,
}

/// An out-of-band watermark: no message with time earlier than `time` will
/// follow on this edge, across all groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barrier {
    pub time: SystemTime,
}

/// An entire batch materialized in memory: begin, all of its points, end.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedBatch {
    pub begin: BatchBegin,
    pub points: Vec<BatchPoint>,
    pub end: BatchEnd,
}

impl BufferedBatch {
    pub fn group_info(&self) -> GroupInfo {
        self.begin.group_info()
    }
}

/// The `{groupID, tags, dimensions}` exposed by every point-bearing message
/// variant, used by `GroupedConsumer` to demultiplex without having to
/// reach into variant-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupInfo {
    pub group: GroupId,
    pub tags: Tags,
    pub dimensions: Dimensions,
}

/// The discriminant exposed by every `Message` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Point,
    BeginBatch,
    BatchPoint,
    EndBatch,
    Barrier,
    BufferedBatch,
}

/// A message traveling on an edge.
///
/// Within an edge, messages obey the grammar
/// `( Point | Barrier | (BeginBatch BatchPoint* EndBatch) | BufferedBatch )*`
/// (spec.md §3 invariants) — a `BeginBatch` is always matched by exactly one
/// later `EndBatch`, and no other begin may interleave on the same edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Point(Point),
    BeginBatch(BatchBegin),
    BatchPoint(BatchPoint),
    EndBatch(BatchEnd),
    Barrier(Barrier),
    BufferedBatch(BufferedBatch),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Point(_) => MessageType::Point,
            Message::BeginBatch(_) => MessageType::BeginBatch,
            Message::BatchPoint(_) => MessageType::BatchPoint,
            Message::EndBatch(_) => MessageType::EndBatch,
            Message::Barrier(_) => MessageType::Barrier,
            Message::BufferedBatch(_) => MessageType::BufferedBatch,
        }
    }

    /// `GroupInfo` for the variants that carry one; `None` for `Barrier`,
    /// which applies across all groups on the edge.
    pub fn group_info(&self) -> Option<GroupInfo> {
        match self {
            Message::Point(p) => Some(p.group_info()),
            Message::BeginBatch(b) => Some(b.group_info()),
            Message::BufferedBatch(b) => Some(b.group_info()),
            Message::BatchPoint(_) | Message::EndBatch(_) | Message::Barrier(_) => None,
        }
    }
}
