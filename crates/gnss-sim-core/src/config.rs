//! Simulator configuration
//!
//! Stored as JSON. Every field has a default, so an empty object (or no file
//! at all) gives a working simulator parked at the reference start pose.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projection::{ProjectedCoord, ProjectionError};
use crate::telemetry::{DEFAULT_CAPACITY, DEFAULT_TOPIC};

/// Errors loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Malformed JSON or wrong field types
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The initial pose is not a valid projected coordinate
    #[error("Invalid initial pose: {0}")]
    Pose(#[from] ProjectionError),

    /// A value outside its allowed range
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Top-level simulator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Initial vehicle pose
    pub vehicle: VehicleConfig,
    /// Outbound telemetry
    pub telemetry: TelemetryConfig,
    /// Recorded session playback
    pub replay: ReplayConfig,
    /// Input gateway endpoints
    pub gateway: GatewayConfig,
    /// MQTT broker connection
    pub mqtt: MqttConfig,
    /// Log filter directive when RUST_LOG is unset
    pub log_level: Option<String>,
}

/// Initial vehicle pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Easting (m)
    pub initial_x: f64,
    /// Northing (m)
    pub initial_y: f64,
    /// Degrees, 0 = +x, counter-clockwise
    pub initial_heading: f64,
    /// Projection zone, 1-60
    pub zone: u8,
    /// Latitude band letter
    pub band: char,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            initial_x: 423_447.137_935_716_8,
            initial_y: 5_717_226.386_050_694,
            initial_heading: 0.0,
            zone: 34,
            band: 'U',
        }
    }
}

impl VehicleConfig {
    /// Initial position as a projected coordinate
    pub fn initial_coord(&self) -> ProjectedCoord {
        ProjectedCoord::new(self.initial_x, self.initial_y, self.zone, self.band)
    }
}

/// Outbound telemetry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Topic name frames are published under
    pub topic: String,
    /// Live-mode publish period in milliseconds
    pub tick_interval_ms: u64,
    /// Frames buffered per subscriber before it starts lagging
    pub channel_capacity: usize,
    /// Seed for the synthetic fix quality; random when unset
    pub quality_seed: Option<u64>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            tick_interval_ms: 100,
            channel_capacity: DEFAULT_CAPACITY,
            quality_seed: None,
        }
    }
}

impl TelemetryConfig {
    /// Live-mode publish period
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Recorded session playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Recording file; replay mode is unavailable without one
    pub recording: Option<PathBuf>,
    /// Pause before playback wraps around, in milliseconds
    pub loop_cooldown_ms: u64,
    /// Start publishing from the recording instead of live state
    pub start_in_replay: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            recording: None,
            loop_cooldown_ms: 3000,
            start_in_replay: false,
        }
    }
}

impl ReplayConfig {
    /// Pause before playback wraps around
    pub fn loop_cooldown(&self) -> Duration {
        Duration::from_millis(self.loop_cooldown_ms)
    }
}

/// Input gateway endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address accepting input and control lines
    pub input_addr: String,
    /// Address streaming telemetry to subscribers
    pub telemetry_addr: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            input_addr: "0.0.0.0:2222".to_string(),
            telemetry_addr: "0.0.0.0:2223".to_string(),
        }
    }
}

/// MQTT broker connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Publish frames to the broker
    pub enabled: bool,
    /// Broker host name or address
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Client identifier presented to the broker
    pub client_id: String,
    /// Keep-alive interval in seconds, 0 disables it
    pub keep_alive_secs: u64,
    /// Frames queued for the connection before new ones are dropped
    pub queue_capacity: usize,
    /// Pause between reconnect attempts, in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "localhost".to_string(),
            port: 1883,
            client_id: "gnss-sim".to_string(),
            keep_alive_secs: 5,
            queue_capacity: 64,
            reconnect_delay_ms: 1000,
        }
    }
}

impl MqttConfig {
    /// Keep-alive interval
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Pause between reconnect attempts
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl SimConfig {
    /// Load and validate a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate config JSON
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot constrain
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vehicle.initial_coord().validate()?;
        if !self.vehicle.initial_heading.is_finite() {
            return Err(ConfigError::Invalid(
                "vehicle.initial_heading must be finite".into(),
            ));
        }
        if self.telemetry.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.tick_interval_ms must be greater than 0".into(),
            ));
        }
        if self.telemetry.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.channel_capacity must be greater than 0".into(),
            ));
        }
        if self.telemetry.topic.is_empty() {
            return Err(ConfigError::Invalid("telemetry.topic must not be empty".into()));
        }
        if self.replay.start_in_replay && self.replay.recording.is_none() {
            return Err(ConfigError::Invalid(
                "replay.start_in_replay requires replay.recording".into(),
            ));
        }
        if self.mqtt.enabled {
            if self.mqtt.host.is_empty() {
                return Err(ConfigError::Invalid("mqtt.host must not be empty".into()));
            }
            if self.mqtt.port == 0 {
                return Err(ConfigError::Invalid("mqtt.port must not be 0".into()));
            }
            if self.mqtt.client_id.is_empty() {
                return Err(ConfigError::Invalid("mqtt.client_id must not be empty".into()));
            }
            if self.mqtt.queue_capacity == 0 {
                return Err(ConfigError::Invalid(
                    "mqtt.queue_capacity must be greater than 0".into(),
                ));
            }
        }
        Ok(())
    }
}
