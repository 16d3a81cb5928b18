//! Outbound Telemetry
//!
//! Telemetry frames and the sinks they are published to: an in-process
//! topic for local subscribers and an MQTT broker connection.

mod fanout;
mod mqtt;
mod topic;

pub use fanout::Fanout;
pub use mqtt::{MqttConnection, MqttSink};
pub use topic::{TelemetryTopic, DEFAULT_CAPACITY, DEFAULT_TOPIC};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors publishing a frame. None of these are retried.
#[derive(Error, Debug)]
pub enum PublishError {
    /// Nobody is listening on the topic
    #[error("No subscribers on topic '{0}'")]
    NoSubscribers(String),

    /// The frame could not be encoded
    #[error("Could not serialize telemetry: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The broker request queue refused the frame
    #[error("MQTT publish rejected: {0}")]
    Broker(String),
}

/// Pose published while driving live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFrame {
    /// Easting (m)
    pub x: f64,
    /// Northing (m)
    pub y: f64,
    /// Latitude, degrees
    pub lat: f64,
    /// Longitude, degrees
    pub lon: f64,
    /// Synthetic fix quality, 1-6
    pub quality: u8,
    /// Compass heading, degrees in [0, 360)
    pub heading: f64,
    /// m/s
    pub speed: f64,
}

/// A frame on the telemetry channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryFrame {
    /// Simulated pose
    Live(LiveFrame),
    /// Recorded fields, speed in m/s
    Replay(Map<String, Value>),
}

impl TelemetryFrame {
    /// Serialize to the JSON text sent to subscribers
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Destination for telemetry frames.
///
/// Publishing is fire-and-forget: implementations must not block or retry.
pub trait TelemetrySink: Send + Sync {
    /// Hand one frame to the destination
    fn publish(&self, frame: &TelemetryFrame) -> Result<(), PublishError>;
}
