//! # GNSS Sim Core Library
//!
//! Core functionality for the GNSS vehicle simulator.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - A planar kinematic model driven by key sets or analog sticks
//! - Looping, self-paced playback of recorded telemetry sessions
//! - A single-owner publishing task switching between live and replay
//! - UTM ↔ latitude/longitude projection
//! - JSON telemetry frames on an in-process topic and an MQTT broker
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gnss_sim_core::prelude::*;
//!
//! let config = SimConfig::default();
//! let topic = TelemetryTopic::default();
//! let mut frames = topic.subscribe();
//!
//! let (simulator, handle) = Simulator::from_config(
//!     &config,
//!     None,
//!     Arc::new(UtmProjection::new()),
//!     Arc::new(topic),
//! );
//! simulator.spawn();
//!
//! handle.send_keys(["w", "Shift"]).await?;
//! println!("{}", frames.recv().await?);
//! ```

pub mod config;
pub mod error;
pub mod kinematics;
pub mod projection;
pub mod replay;
pub mod simulator;
pub mod telemetry;
pub mod unit_conversion;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{MqttConfig, SimConfig, TelemetryConfig, VehicleConfig};
    pub use crate::error::SimError;
    pub use crate::kinematics::{AnalogInput, InputEvent, KeySet, VehicleState};
    pub use crate::projection::{GeoCoord, ProjectedCoord, Projection, UtmProjection};
    pub use crate::replay::{Recording, ReplaySource};
    pub use crate::simulator::{Mode, SimHandle, SimStatus, Simulator};
    pub use crate::telemetry::{
        Fanout, LiveFrame, MqttSink, TelemetryFrame, TelemetrySink, TelemetryTopic,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
