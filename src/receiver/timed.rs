//! Per-node processing-time measurement, excluding time spent forwarding to
//! children (spec.md §9 design note: "a node's own processing time must not
//! include the time its children take to process what it forwards").

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::Result;
use crate::message::Message;
use crate::receiver::forward::ForwardReceiver;

/// A stopwatch a node starts once and pauses around every `forward` call.
pub trait Timer: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn pause(&self);
    fn resume(&self);
}

/// A timer that does nothing — used when a node isn't wired up with metrics
/// (tests, or a node kind the spec doesn't ask to be timed).
pub struct NullTimer;

impl Timer for NullTimer {
    fn start(&self) {}
    fn stop(&self) {}
    fn pause(&self) {}
    fn resume(&self) {}
}

struct StopwatchState {
    running_since: Option<Instant>,
    elapsed: Duration,
}

/// Accumulates wall-clock time between `start`/`stop` minus any
/// `pause`/`resume` bracket, and records the total to a named histogram on
/// `stop`.
pub struct Stopwatch {
    name: &'static str,
    state: Mutex<StopwatchState>,
}

impl Stopwatch {
    pub fn new(name: &'static str) -> Self {
        Stopwatch {
            name,
            state: Mutex::new(StopwatchState {
                running_since: None,
                elapsed: Duration::ZERO,
            }),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }
}

impl Timer for Stopwatch {
    fn start(&self) {
        let mut state = self.state.lock();
        state.elapsed = Duration::ZERO;
        state.running_since = Some(Instant::now());
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        if let Some(since) = state.running_since.take() {
            state.elapsed += since.elapsed();
        }
    }

    fn resume(&self) {
        let mut state = self.state.lock();
        state.running_since = Some(Instant::now());
    }

    fn stop(&self) {
        self.pause();
        let elapsed = self.state.lock().elapsed;
        metrics::histogram!(self.name).record(elapsed.as_secs_f64());
    }
}

/// Wraps a `ForwardReceiver`, pausing `timer` for the duration of each
/// `forward` call so downstream processing time isn't attributed to this
/// node.
pub struct TimedForwardingReceiver<F> {
    inner: F,
    timer: Arc<dyn Timer>,
}

impl<F: ForwardReceiver> TimedForwardingReceiver<F> {
    pub fn new(inner: F, timer: Arc<dyn Timer>) -> Self {
        TimedForwardingReceiver { inner, timer }
    }
}

impl<F: ForwardReceiver> ForwardReceiver for TimedForwardingReceiver<F> {
    fn forward(&self, message: Message) -> Result<()> {
        self.timer.pause();
        let result = self.inner.forward(message);
        self.timer.resume();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_resume_excludes_paused_interval() {
        let sw = Stopwatch::new("test_node_processing_seconds");
        sw.start();
        std::thread::sleep(Duration::from_millis(20));
        sw.pause();
        std::thread::sleep(Duration::from_millis(50));
        sw.resume();
        std::thread::sleep(Duration::from_millis(20));
        sw.stop();
        assert!(sw.elapsed() < Duration::from_millis(45));
    }
}
