//! Vehicle Kinematic Model
//!
//! Constant-step planar motion driven by discrete key sets or analog
//! dual-stick input. Every input kind reduces to a [`Motion`]: a heading
//! change followed by a signed step along the new heading.

mod input;
mod state;

pub use input::{AnalogInput, InputError, InputEvent, Key, KeySet, DEAD_ZONE};
pub use state::{VehicleSnapshot, VehicleState};

use crate::unit_conversion::wrap_degrees;

/// Heading change per tick while a turn key is held (degrees)
pub const KEY_TURN_STEP_DEG: f64 = 0.2;
/// Forward/backward step per key event
pub const KEY_STEP: f64 = 0.010;
/// Forward step with boost held
pub const KEY_BOOST_STEP: f64 = 0.03;
/// Reverse step; boost never applies in reverse
pub const KEY_REVERSE_STEP: f64 = 0.01;

/// Largest forward step from a fully deflected stick
pub const STICK_MAX_FORWARD_STEP: f64 = 0.1;
/// Step at full reverse deflection
pub const STICK_MIN_REVERSE_STEP: f64 = -0.03;
/// Heading change at full right stick deflection (degrees)
pub const STICK_MAX_TURN_STEP_DEG: f64 = 0.3;

/// Normalize a heading to `[0, 360)` degrees.
pub fn normalize_heading(heading: f64) -> f64 {
    wrap_degrees(heading)
}

/// Heading and position delta produced by one input event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    /// Degrees added to the heading before translating
    pub turn_deg: f64,
    /// Signed distance along the new heading (negative = reverse)
    pub step: f64,
}

/// Anything that can be turned into a [`Motion`].
pub trait MotionInput {
    /// Heading change and step for this input
    fn motion(&self) -> Motion;
}
