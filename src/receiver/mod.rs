//! Receiver composition: the decorators nodes stack on top of their own
//! processing logic to get fan-out, timing, buffering, and per-group
//! dispatch for free (spec.md §4.4-§4.6).

pub mod buffering;
pub mod forward;
pub mod grouped;
pub mod timed;

pub use crate::consumer::{BufferedReceiver, Receiver};
pub use buffering::BufferingReceiver;
pub use forward::{ForwardReceiver, ForwardingReceiver};
pub use grouped::{GroupedConsumer, GroupedReceiver};
pub use timed::{NullTimer, Stopwatch, Timer, TimedForwardingReceiver};
