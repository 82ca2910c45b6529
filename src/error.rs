//! The error hierarchy shared by the edge, consumer, and transform nodes.

use thiserror::Error;

/// Errors produced anywhere in the edge-and-consumer substrate.
///
/// `EvalError` is the one variant a node is expected to catch locally
/// (increment a counter, log, drop the point) rather than propagate; every
/// other variant bubbles up through a receiver callback, terminates the
/// consumer loop, and is returned from the node's `run()` (spec.md §7).
#[derive(Debug, Error)]
pub enum Error {
    /// A producer attempted `collect` on an aborted edge.
    #[error("edge aborted")]
    Aborted,

    /// A message's discriminant disagreed with its payload.
    ///
    /// Structurally unreachable from `Consumer::run`, which matches
    /// `Message` exhaustively — kept so the legacy adapter and external
    /// callers have a named variant for "message kind I can't handle here".
    #[error("impossible type: expected {expected:?}, found {found:?}")]
    ImpossibleType {
        expected: crate::message::MessageType,
        found: crate::message::MessageType,
    },

    /// A node constructor rejected an ill-formed configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Lambda evaluation failed on a point. Recoverable: the owning node
    /// increments `eval_errors`, logs, and drops the point.
    #[error("lambda evaluation failed: {0}")]
    EvalError(String),

    /// A downstream `collect` failed while forwarding.
    #[error("downstream collect failed: {0}")]
    DownstreamError(Box<Error>),

    /// `close()` was called a second time on the same edge — a contract
    /// violation (spec.md §4.1: "idempotent after the first call is a
    /// contract violation"), distinct from `abort()`, which is idempotent.
    #[error("edge already closed")]
    AlreadyClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
