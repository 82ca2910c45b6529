//! Demultiplexing an edge's messages into one `Receiver` per group.

use std::collections::HashMap;

use crate::consumer::Receiver;
use crate::dimensions::GroupId;
use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::message::{GroupInfo, Message};

/// Produces and tears down the per-group `Receiver` a node keeps for each
/// logical series it has seen.
pub trait GroupedReceiver {
    type Group: Receiver;

    fn new_group(&mut self, info: &GroupInfo) -> Result<Self::Group>;

    /// Called when a node decides a group is no longer active (e.g. a
    /// `GroupBy` node evicting a stale series). No message in the grammar
    /// triggers this on its own — a node calls `GroupedConsumer::delete_group`
    /// explicitly from its own bookkeeping.
    fn delete_group(&mut self, group: GroupId) -> Result<()> {
        let _ = group;
        Ok(())
    }
}

/// Drives an edge, routing each message to the `Receiver` owned by its
/// group, creating that receiver lazily on first sight.
///
/// Tracks `current` across a `BeginBatch...EndBatch` bracket so
/// `BatchPoint`/`EndBatch` (which carry no group of their own) land on the
/// same per-group receiver as the `BeginBatch` that opened the batch.
/// `Barrier` fans out to every known group and fails fast on the first
/// group that returns an error, leaving the remaining groups un-notified
/// (Open Question 3, resolved in DESIGN.md).
pub struct GroupedConsumer<G: GroupedReceiver> {
    edge: Edge,
    factory: G,
    groups: HashMap<GroupId, G::Group>,
    current: Option<GroupId>,
}

impl<G: GroupedReceiver> GroupedConsumer<G> {
    pub fn new(edge: Edge, factory: G) -> Self {
        GroupedConsumer {
            edge,
            factory,
            groups: HashMap::new(),
            current: None,
        }
    }

    pub fn delete_group(&mut self, group: GroupId) -> Result<()> {
        self.factory.delete_group(group)?;
        self.groups.remove(&group);
        Ok(())
    }

    fn group_mut(&mut self, info: &GroupInfo) -> Result<&mut G::Group> {
        if !self.groups.contains_key(&info.group) {
            let group = self.factory.new_group(info)?;
            self.groups.insert(info.group, group);
        }
        Ok(self.groups.get_mut(&info.group).expect("just inserted"))
    }

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
                Message::Point(p) => {
                    let info = p.group_info();
                    self.group_mut(&info)?.point(p)?;
                }
                Message::BeginBatch(b) => {
                    let info = b.group_info();
                    self.current = Some(info.group);
                    self.group_mut(&info)?.begin_batch(b)?;
                }
                Message::BatchPoint(p) => {
                    let group = self
                        .current
                        .ok_or_else(|| Error::InvalidConfig("batch point with no open batch".into()))?;
                    self.groups
                        .get_mut(&group)
                        .expect("current group exists")
                        .batch_point(p)?;
                }
                Message::EndBatch(e) => {
                    let group = self
                        .current
                        .take()
                        .ok_or_else(|| Error::InvalidConfig("end batch with no open batch".into()))?;
                    self.groups
                        .get_mut(&group)
                        .expect("current group exists")
                        .end_batch(e)?;
                }
                Message::Barrier(b) => {
                    for group in self.groups.values_mut() {
                        group.barrier(b)?;
                    }
                }
                Message::BufferedBatch(buffered) => {
                    let info = buffered.group_info();
                    let group = self.group_mut(&info)?;
                    group.begin_batch(buffered.begin)?;
                    for point in buffered.points {
                        group.batch_point(point)?;
                    }
                    group.end_batch(buffered.end)?;
                }
            }
        }
    }
}
