//! The transform nodes: most implement `Receiver` (or `BufferedReceiver`)
//! directly on their input shape; the state-tracking nodes instead
//! implement `GroupedReceiver`, producing one per-group `Receiver` tracker
//! apiece. Every node forwards through a `ForwardReceiver` on its output
//! shape (spec.md §4.7).

pub mod default;
pub mod delete;
pub mod group_by;
pub mod noop;
pub mod sample;
pub mod state_tracking;

pub use default::DefaultNode;
pub use delete::DeleteNode;
pub use group_by::GroupByNode;
pub use noop::NoOpNode;
pub use sample::{SampleMode, SampleNode};
pub use state_tracking::{StateCountNode, StateDurationNode};
