//! Fanning a node's output out to its child edges.

use crate::edge::Edge;
use crate::error::Result;
use crate::message::Message;

/// The sink a node's processing logic forwards its output messages to.
///
/// Separated from `Receiver` (consumer.rs) because a node's *input* shape
/// (how it's called) and *output* shape (where results go) vary
/// independently — a `GroupBy` node receives points but forwards buffered
/// batches, for instance.
pub trait ForwardReceiver {
    fn forward(&self, message: Message) -> Result<()>;
}

/// Fans a message out to every output edge of a node, in edge order,
/// stopping at the first failure (an edge collect fails only once its
/// edge has been aborted downstream).
///
/// `Clone` is cheap — `Edge` is itself an `Arc`-backed handle — which lets a
/// `GroupedReceiver` factory (state_tracking.rs) hand every per-group
/// tracker its own copy of the same output wiring.
#[derive(Clone)]
pub struct ForwardingReceiver {
    outs: Vec<Edge>,
}

impl ForwardingReceiver {
    pub fn new(outs: Vec<Edge>) -> Self {
        ForwardingReceiver { outs }
    }

    pub fn outs(&self) -> &[Edge] {
        &self.outs
    }
}

impl ForwardReceiver for ForwardingReceiver {
    fn forward(&self, message: Message) -> Result<()> {
        for out in &self.outs {
            out.collect(message.clone())
                .map_err(|err| crate::error::Error::DownstreamError(Box::new(err)))?;
        }
        Ok(())
    }
}
