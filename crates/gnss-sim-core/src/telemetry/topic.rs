//! In-process pub/sub topic
//!
//! Frames are serialized once and fanned out to every subscriber as JSON
//! text. Slow subscribers lag and lose the oldest frames; the publisher is
//! never blocked.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::{PublishError, TelemetryFrame, TelemetrySink};

/// Topic name used when none is configured
pub const DEFAULT_TOPIC: &str = "gnss/data";

/// Default number of frames buffered per subscriber
pub const DEFAULT_CAPACITY: usize = 256;

/// A named broadcast topic carrying JSON telemetry
#[derive(Debug, Clone)]
pub struct TelemetryTopic {
    name: Arc<str>,
    sender: broadcast::Sender<Arc<str>>,
}

impl TelemetryTopic {
    /// Create a topic buffering `capacity` frames per subscriber
    pub fn new(name: impl Into<Arc<str>>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name: name.into(),
            sender,
        }
    }

    /// Topic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribe to frames published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TelemetryTopic {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC, DEFAULT_CAPACITY)
    }
}

impl TelemetrySink for TelemetryTopic {
    fn publish(&self, frame: &TelemetryFrame) -> Result<(), PublishError> {
        let payload: Arc<str> = frame.to_json()?.into();
        self.sender
            .send(payload)
            .map(|_| ())
            .map_err(|_| PublishError::NoSubscribers(self.name.to_string()))
    }
}
