//! A transparent counting wrapper over an `Edge`.
//!
//! Implemented as explicit delegation — `StatsEdge` *holds* an `Edge`, it
//! does not "inherit" from one (the "composition over embedding" design
//! note: the original Go code embeds `edge.StatsEdge` inside `Edge`, which
//! is the pattern we're replacing).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::dimensions::{Dimensions, GroupId};
use crate::edge::{Edge, EdgeKind};
use crate::error::Result;
use crate::message::Message;
use crate::value::Tags;

/// Per-group collected/emitted counts, snapshotted alongside the tags and
/// dimensions of the group they describe.
#[derive(Debug, Clone)]
pub struct GroupStats {
    pub collected: u64,
    pub emitted: u64,
    pub tags: Tags,
    pub dimensions: Dimensions,
}

/// Whether a `StatsEdge` counts individual points, or whole batches
/// (counted once per `EndBatch`/`BufferedBatch`, sized by their point count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsFlavor {
    Stream,
    Batch,
}

#[derive(Default)]
struct BatchAccum {
    current: Option<(GroupId, Tags, Dimensions)>,
    size: u64,
}

pub struct StatsEdge {
    edge: Edge,
    flavor: StatsFlavor,
    collected: AtomicU64,
    emitted: AtomicU64,
    group_stats: RwLock<HashMap<GroupId, GroupStats>>,
    batch: Mutex<BatchAccum>,
}

impl StatsEdge {
    pub fn new(edge: Edge, flavor: StatsFlavor) -> Self {
        StatsEdge {
            edge,
            flavor,
            collected: AtomicU64::new(0),
            emitted: AtomicU64::new(0),
            group_stats: RwLock::new(HashMap::new()),
            batch: Mutex::new(BatchAccum::default()),
        }
    }

    pub fn stream(edge: Edge) -> Self {
        Self::new(edge, StatsFlavor::Stream)
    }

    pub fn batch(edge: Edge) -> Self {
        Self::new(edge, StatsFlavor::Batch)
    }

    pub fn kind(&self) -> EdgeKind {
        self.edge.kind()
    }

    pub fn collected(&self) -> u64 {
        self.collected.load(Ordering::Relaxed)
    }

    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Run `f` with the group-stats table under a read lock held for the
    /// entire call — `f` must not block (spec.md §5).
    pub fn read_group_stats<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&HashMap<GroupId, GroupStats>) -> R,
    {
        let guard = self.group_stats.read();
        f(&guard)
    }

    fn bump_collected(&self, group: GroupId, tags: &Tags, dimensions: &Dimensions, count: u64) {
        self.collected.fetch_add(count, Ordering::Relaxed);
        let mut groups = self.group_stats.write();
        let entry = groups.entry(group).or_insert_with(|| GroupStats {
            collected: 0,
            emitted: 0,
            tags: tags.clone(),
            dimensions: dimensions.clone(),
        });
        entry.collected += count;
    }

    fn bump_emitted(&self, group: Option<GroupId>) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        if let Some(group) = group {
            if let Some(entry) = self.group_stats.write().get_mut(&group) {
                entry.emitted += 1;
            }
        }
    }

    pub fn collect(&self, m: Message) -> Result<()> {
        match (&self.flavor, &m) {
            (StatsFlavor::Stream, Message::Point(p)) => {
                self.bump_collected(p.group, &p.tags, &p.dimensions, 1);
            }
            (StatsFlavor::Batch, Message::BeginBatch(b)) => {
                *self.batch.lock() = BatchAccum {
                    current: Some((b.group, b.tags.clone(), b.dimensions.clone())),
                    size: 0,
                };
            }
            (StatsFlavor::Batch, Message::BatchPoint(_)) => {
                self.batch.lock().size += 1;
            }
            (StatsFlavor::Batch, Message::EndBatch(_)) => {
                let accum = std::mem::take(&mut *self.batch.lock());
                if let Some((group, tags, dimensions)) = accum.current {
                    self.bump_collected(group, &tags, &dimensions, accum.size);
                }
            }
            (_, Message::BufferedBatch(b)) => {
                self.bump_collected(b.begin.group, &b.begin.tags, &b.begin.dimensions, b.points.len() as u64);
            }
            // Barriers and out-of-band messages are not counted (spec.md §4.2).
            _ => {}
        }
        self.edge.collect(m)
    }

    pub fn next(&self) -> (Option<Message>, bool) {
        let (m, ok) = self.edge.next();
        if let Some(m) = &m {
            match (&self.flavor, m) {
                (StatsFlavor::Stream, Message::Point(p)) => self.bump_emitted(Some(p.group)),
                (StatsFlavor::Batch, Message::EndBatch(_)) => self.bump_emitted(None),
                (_, Message::BufferedBatch(b)) => self.bump_emitted(Some(b.begin.group)),
                _ => {}
            }
        }
        (m, ok)
    }

    pub fn close(&self) -> Result<()> {
        self.edge.close()
    }

    pub fn abort(&self) {
        self.edge.abort()
    }

    pub fn inner(&self) -> &Edge {
        &self.edge
    }
}
