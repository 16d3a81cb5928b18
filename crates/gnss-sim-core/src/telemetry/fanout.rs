//! Publish one frame to several sinks

use std::sync::Arc;

use super::{PublishError, TelemetryFrame, TelemetrySink};

/// Sink that forwards every frame to each of its members.
///
/// A frame counts as published when at least one member accepts it.
#[derive(Clone, Default)]
pub struct Fanout {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl Fanout {
    /// Empty fan-out; frames are rejected until a sink is added
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member sink
    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of member sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// No member sinks
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TelemetrySink for Fanout {
    fn publish(&self, frame: &TelemetryFrame) -> Result<(), PublishError> {
        let mut accepted = false;
        let mut last_error = None;
        for sink in &self.sinks {
            match sink.publish(frame) {
                Ok(()) => accepted = true,
                Err(e) => last_error = Some(e),
            }
        }

        if accepted {
            return Ok(());
        }
        Err(last_error.unwrap_or_else(|| PublishError::NoSubscribers(String::new())))
    }
}
