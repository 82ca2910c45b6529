//! The edge-and-consumer substrate of a time-series streaming dataflow
//! engine: a bounded, concurrent message channel (`Edge`) connecting
//! single-producer/single-consumer nodes, the dispatch and composition
//! layers built on top of it (`Consumer`, the `receiver` module), and a
//! handful of transform nodes implemented against that substrate.

pub mod consumer;
pub mod dimensions;
pub mod edge;
pub mod error;
pub mod lambda;
pub mod legacy;
pub mod message;
pub mod node;
pub mod nodes;
pub mod receiver;
pub mod value;

pub use consumer::{BufferedReceiver, Consumer, Receiver};
pub use dimensions::{group_id, Dimensions, GroupId};
pub use edge::{Edge, EdgeKind};
pub use edge::stats::{GroupStats, StatsEdge, StatsFlavor};
pub use error::{Error, Result};
pub use legacy::LegacyEdge;
pub use message::{BatchBegin, BatchEnd, BatchPoint, Barrier, BufferedBatch, GroupInfo, Message, MessageType, Point};
pub use value::{Fields, Tags, Value};
