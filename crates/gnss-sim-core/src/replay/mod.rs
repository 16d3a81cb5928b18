//! Session Replay
//!
//! Loads a recorded telemetry session and plays it back with the original
//! inter-sample timing.

mod recording;
mod source;

pub use recording::{Recording, RecordingError};
pub use source::{ReplaySource, ReplayStep, DEFAULT_LOOP_COOLDOWN};

use serde_json::{Map, Value};

use crate::unit_conversion::kmh_to_ms;

/// Name of the speed field in a recorded sample
pub const SPEED_FIELD: &str = "speed";

/// A single recorded telemetry reading
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySample {
    /// Elapsed-time key exactly as it appeared in the recording
    pub key: String,
    /// Parsed elapsed time in seconds
    pub elapsed: f64,
    /// Recorded speed in km/h
    pub speed_kmh: f64,
    /// All recorded fields in recording order, including `speed`
    pub fields: Map<String, Value>,
}

impl ReplaySample {
    /// Fields to publish: the recorded ones with `speed` converted to m/s.
    ///
    /// Works on a copy, so the loaded recording never changes.
    pub fn payload(&self) -> Map<String, Value> {
        let mut fields = self.fields.clone();
        fields.insert(SPEED_FIELD.to_string(), Value::from(kmh_to_ms(self.speed_kmh)));
        fields
    }
}
