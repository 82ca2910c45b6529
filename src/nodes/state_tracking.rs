//! Tracking how long, or how many consecutive points, a predicate has held
//! true for each group (spec.md §4.7, grounded on `state_tracking.go`).
//!
//! Driven through `GroupedConsumer` so each group gets its own tracker
//! instance — the Rust equivalent of `state_tracking.go`'s
//! `edge.NewGroupedConsumer(ins[0], s)`, rather than a single `Receiver`
//! hand-rolling a `HashMap<GroupId, ...>` itself.

use std::sync::Arc;
use std::time::SystemTime;

use crate::error::Result;
use crate::lambda::Predicate;
use crate::message::{BatchBegin, BatchEnd, BatchPoint, Barrier, GroupInfo, Message, Point};
use crate::node::NodeMetrics;
use crate::receiver::{ForwardReceiver, GroupedReceiver, Receiver};
use crate::value::Value;

/// Per-group tracker produced by `StateDurationNode`: adds a field holding
/// the number of seconds `predicate` has held true, resetting to `-1` the
/// moment it turns false.
pub struct StateDurationGroup<F> {
    predicate: Arc<dyn Predicate>,
    field_name: String,
    since: Option<SystemTime>,
    metrics: Arc<NodeMetrics>,
    out: F,
}

impl<F: ForwardReceiver> StateDurationGroup<F> {
    fn annotate(&mut self, time: SystemTime, fields: &mut crate::value::Fields, tags: &crate::value::Tags) -> bool {
        match self.predicate.eval(fields, tags) {
            Ok(true) => {
                let since = *self.since.get_or_insert(time);
                let duration = time.duration_since(since).unwrap_or_default().as_secs_f64();
                fields.insert(self.field_name.clone(), Value::Float(duration));
                true
            }
            Ok(false) => {
                self.since = None;
                fields.insert(self.field_name.clone(), Value::Float(-1.0));
                true
            }
            Err(err) => {
                self.metrics.record_eval_error(&err);
                false
            }
        }
    }
}

impl<F: ForwardReceiver> Receiver for StateDurationGroup<F> {
    fn begin_batch(&mut self, begin: BatchBegin) -> Result<()> {
        self.out.forward(Message::BeginBatch(begin))
    }

    fn batch_point(&mut self, mut point: BatchPoint) -> Result<()> {
        let time = point.time;
        if self.annotate(time, &mut point.fields, &point.tags) {
            self.out.forward(Message::BatchPoint(point))
        } else {
            Ok(())
        }
    }

    fn end_batch(&mut self, end: BatchEnd) -> Result<()> {
        self.out.forward(Message::EndBatch(end))
    }

    fn point(&mut self, mut point: Point) -> Result<()> {
        let time = point.time;
        if self.annotate(time, &mut point.fields, &point.tags) {
            self.out.forward(Message::Point(point))
        } else {
            Ok(())
        }
    }

    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        self.out.forward(Message::Barrier(barrier))
    }
}

/// Factory handed to `GroupedConsumer`: builds a fresh `StateDurationGroup`
/// the first time a group is seen.
pub struct StateDurationNode<F> {
    predicate: Arc<dyn Predicate>,
    field_name: String,
    metrics: Arc<NodeMetrics>,
    out: F,
}

impl<F: ForwardReceiver + Clone> StateDurationNode<F> {
    pub fn new(predicate: impl Predicate + 'static, field_name: impl Into<String>, out: F) -> Self {
        StateDurationNode {
            predicate: Arc::new(predicate),
            field_name: field_name.into(),
            metrics: Arc::new(NodeMetrics::new("state_duration")),
            out,
        }
    }

    pub fn eval_errors(&self) -> u64 {
        self.metrics.eval_errors()
    }
}

impl<F: ForwardReceiver + Clone> GroupedReceiver for StateDurationNode<F> {
    type Group = StateDurationGroup<F>;

    fn new_group(&mut self, _info: &GroupInfo) -> Result<Self::Group> {
        Ok(StateDurationGroup {
            predicate: self.predicate.clone(),
            field_name: self.field_name.clone(),
            since: None,
            metrics: self.metrics.clone(),
            out: self.out.clone(),
        })
    }
}

/// Per-group tracker produced by `StateCountNode`: adds a field holding the
/// number of consecutive points (inclusive) for which `predicate` has held
/// true, resetting to `-1` the moment it turns false.
pub struct StateCountGroup<F> {
    predicate: Arc<dyn Predicate>,
    field_name: String,
    count: i64,
    metrics: Arc<NodeMetrics>,
    out: F,
}

impl<F: ForwardReceiver> StateCountGroup<F> {
    fn annotate(&mut self, fields: &mut crate::value::Fields, tags: &crate::value::Tags) -> bool {
        match self.predicate.eval(fields, tags) {
            Ok(true) => {
                self.count += 1;
                fields.insert(self.field_name.clone(), Value::Int(self.count));
                true
            }
            Ok(false) => {
                self.count = 0;
                fields.insert(self.field_name.clone(), Value::Int(-1));
                true
            }
            Err(err) => {
                self.metrics.record_eval_error(&err);
                false
            }
        }
    }
}

impl<F: ForwardReceiver> Receiver for StateCountGroup<F> {
    fn begin_batch(&mut self, begin: BatchBegin) -> Result<()> {
        self.out.forward(Message::BeginBatch(begin))
    }

    fn batch_point(&mut self, mut point: BatchPoint) -> Result<()> {
        if self.annotate(&mut point.fields, &point.tags) {
            self.out.forward(Message::BatchPoint(point))
        } else {
            Ok(())
        }
    }

    fn end_batch(&mut self, end: BatchEnd) -> Result<()> {
        self.out.forward(Message::EndBatch(end))
    }

    fn point(&mut self, mut point: Point) -> Result<()> {
        if self.annotate(&mut point.fields, &point.tags) {
            self.out.forward(Message::Point(point))
        } else {
            Ok(())
        }
    }

    fn barrier(&mut self, barrier: Barrier) -> Result<()> {
        self.out.forward(Message::Barrier(barrier))
    }
}

pub struct StateCountNode<F> {
    predicate: Arc<dyn Predicate>,
    field_name: String,
    metrics: Arc<NodeMetrics>,
    out: F,
}

impl<F: ForwardReceiver + Clone> StateCountNode<F> {
    pub fn new(predicate: impl Predicate + 'static, field_name: impl Into<String>, out: F) -> Self {
        StateCountNode {
            predicate: Arc::new(predicate),
            field_name: field_name.into(),
            metrics: Arc::new(NodeMetrics::new("state_count")),
            out,
        }
    }

    pub fn eval_errors(&self) -> u64 {
        self.metrics.eval_errors()
    }
}

impl<F: ForwardReceiver + Clone> GroupedReceiver for StateCountNode<F> {
    type Group = StateCountGroup<F>;

    fn new_group(&mut self, _info: &GroupInfo) -> Result<Self::Group> {
        Ok(StateCountGroup {
            predicate: self.predicate.clone(),
            field_name: self.field_name.clone(),
            count: 0,
            metrics: self.metrics.clone(),
            out: self.out.clone(),
        })
    }
}
