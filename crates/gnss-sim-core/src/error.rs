//! Simulator errors

use thiserror::Error;

use crate::config::ConfigError;
use crate::kinematics::InputError;
use crate::projection::ProjectionError;
use crate::replay::RecordingError;
use crate::telemetry::PublishError;

/// Errors surfaced by the simulator and its handle
#[derive(Error, Debug)]
pub enum SimError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Recording failed to load
    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),

    /// Coordinate conversion failed
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Frame could not be published
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Input event rejected before reaching the vehicle
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// Replay requested without a recording
    #[error("Replay mode requested but no recording is loaded")]
    ReplayUnavailable,

    /// The simulator task has exited
    #[error("Simulator is not running")]
    Stopped,
}
