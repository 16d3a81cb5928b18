//! Vehicle state

use serde::Serialize;
use tokio::time::Instant;

use super::{normalize_heading, InputEvent, KeySet, MotionInput};
use crate::projection::ProjectedCoord;

/// Pose and derived speed of the simulated vehicle.
///
/// Owned by the simulator task; every mutation goes through [`apply`] or
/// [`update_speed`] so heading and position always change together.
///
/// [`apply`]: VehicleState::apply
/// [`update_speed`]: VehicleState::update_speed
#[derive(Debug, Clone)]
pub struct VehicleState {
    /// Easting (m)
    pub x: f64,
    /// Northing (m)
    pub y: f64,
    /// Degrees, 0 = +x, counter-clockwise
    pub heading: f64,
    /// m/s, derived once per live tick
    pub speed: f64,
    /// Projection zone of `(x, y)`
    pub zone: u8,
    /// Latitude band of `(x, y)`
    pub band: char,
    prev_x: f64,
    prev_y: f64,
    prev_sample_time: Instant,
    last_keys: KeySet,
}

/// Serializable snapshot of a [`VehicleState`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSnapshot {
    /// Easting (m)
    pub x: f64,
    /// Northing (m)
    pub y: f64,
    /// Degrees, model convention
    pub heading: f64,
    /// m/s
    pub speed: f64,
    /// Identifiers of the last key set
    pub last_keys: Vec<&'static str>,
}

impl VehicleState {
    /// Create a stationary vehicle at `(x, y)`
    pub fn new(x: f64, y: f64, zone: u8, band: char) -> Self {
        Self::with_heading(x, y, 0.0, zone, band)
    }

    /// Create a stationary vehicle with an initial heading
    pub fn with_heading(x: f64, y: f64, heading: f64, zone: u8, band: char) -> Self {
        Self {
            x,
            y,
            heading: normalize_heading(heading),
            speed: 0.0,
            zone,
            band,
            prev_x: x,
            prev_y: y,
            prev_sample_time: Instant::now(),
            last_keys: KeySet::default(),
        }
    }

    /// Apply one input event: turn first, then step along the new heading.
    ///
    /// An event that would leave the pose non-finite is dropped whole.
    pub fn apply(&mut self, event: &InputEvent) {
        let motion = event.motion();
        let heading = normalize_heading(self.heading + motion.turn_deg);
        let heading_rad = heading.to_radians();
        let x = self.x + motion.step * heading_rad.cos();
        let y = self.y + motion.step * heading_rad.sin();

        if !(heading.is_finite() && x.is_finite() && y.is_finite()) {
            tracing::warn!("Dropping input that yields a non-finite pose: {:?}", event);
            return;
        }

        if let InputEvent::DiscreteKeys(keys) = event {
            self.last_keys = *keys;
        }
        self.heading = heading;
        self.x = x;
        self.y = y;
    }

    /// Recompute speed from the displacement since the previous call.
    ///
    /// If no time has passed the previous speed is kept.
    pub fn update_speed(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.prev_sample_time).as_secs_f64();
        let distance = (self.x - self.prev_x).hypot(self.y - self.prev_y);

        if elapsed > 0.0 {
            self.speed = distance / elapsed;
        }

        self.prev_x = self.x;
        self.prev_y = self.y;
        self.prev_sample_time = now;
    }

    /// Current position as a projected coordinate (x → easting, y → northing)
    pub fn projected(&self) -> ProjectedCoord {
        ProjectedCoord::new(self.x, self.y, self.zone, self.band)
    }

    /// Keys from the most recent discrete key event
    pub fn last_keys(&self) -> KeySet {
        self.last_keys
    }

    /// Copy of the pose for status replies
    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            x: self.x,
            y: self.y,
            heading: self.heading,
            speed: self.speed,
            last_keys: self.last_keys.identifiers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::AnalogInput;
    use std::time::Duration;

    fn origin() -> VehicleState {
        VehicleState::new(0.0, 0.0, 34, 'U')
    }

    fn keys(ids: &[&str]) -> InputEvent {
        InputEvent::DiscreteKeys(KeySet::from_identifiers(ids))
    }

    #[test]
    fn test_forward_key_step() {
        let mut state = origin();
        state.apply(&keys(&["w"]));
        assert_eq!((state.x, state.y), (0.010, 0.0));
    }

    #[test]
    fn test_boost_key_step() {
        let mut state = origin();
        state.apply(&keys(&["w", "Shift"]));
        assert_eq!((state.x, state.y), (0.03, 0.0));
    }

    #[test]
    fn test_backward_key_step_ignores_boost() {
        let mut plain = origin();
        plain.apply(&keys(&["s"]));
        assert_eq!((plain.x, plain.y), (-0.01, 0.0));

        let mut boosted = origin();
        boosted.apply(&keys(&["s", "Shift"]));
        assert_eq!((boosted.x, boosted.y), (-0.01, 0.0));
    }

    #[test]
    fn test_forward_and_backward_moves_forward() {
        let mut state = origin();
        state.apply(&keys(&["w", "s"]));
        assert_eq!((state.x, state.y), (0.010, 0.0));
    }

    #[test]
    fn test_turn_applies_before_step() {
        let mut state = VehicleState::with_heading(0.0, 0.0, 89.8, 34, 'U');
        state.apply(&keys(&["w", "a"]));
        assert!((state.heading - 90.0).abs() < 1e-9);
        assert!(state.x.abs() < 1e-12);
        assert!((state.y - 0.010).abs() < 1e-12);
    }

    #[test]
    fn test_right_turn_wraps_below_zero() {
        let mut state = origin();
        state.apply(&keys(&["d"]));
        assert!((state.heading - 359.8).abs() < 1e-9);
        assert_eq!((state.x, state.y), (0.0, 0.0));
    }

    #[test]
    fn test_analog_dead_zone_keeps_position() {
        let mut state = origin();
        state.apply(&InputEvent::Analog(AnalogInput::new(0.0, 0.05, 0.0, 0.0, 0.0)));
        assert_eq!((state.x, state.y), (0.0, 0.0));
        assert_eq!(state.heading, 0.0);
    }

    #[test]
    fn test_analog_does_not_touch_last_keys() {
        let mut state = origin();
        state.apply(&keys(&["w"]));
        state.apply(&InputEvent::Analog(AnalogInput::new(0.0, 1.0, 0.0, 0.0, 0.0)));
        assert_eq!(state.last_keys().identifiers(), vec!["w"]);
    }

    #[test]
    fn test_non_finite_input_leaves_pose_unchanged() {
        let mut state = origin();
        state.apply(&keys(&["w"]));
        let before = (state.x, state.y, state.heading);

        state.apply(&InputEvent::Analog(AnalogInput::new(0.0, 1e308, 0.0, 0.0, 1e308)));
        state.apply(&InputEvent::Analog(AnalogInput::new(0.0, 0.5, f64::NAN, 0.0, 0.0)));

        assert_eq!((state.x, state.y, state.heading), before);
        state.apply(&keys(&["w"]));
        assert!((state.x - 0.02).abs() < 1e-12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_from_displacement() {
        let mut state = origin();
        let start = Instant::now();
        state.update_speed(start);
        for _ in 0..10 {
            state.apply(&keys(&["w"]));
        }
        state.update_speed(start + Duration::from_millis(100));
        // 0.1 m in 0.1 s
        assert!((state.speed - 1.0).abs() < 1e-9, "speed {}", state.speed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_elapsed_keeps_speed() {
        let mut state = origin();
        let start = Instant::now();
        state.update_speed(start);
        state.apply(&keys(&["w"]));
        state.update_speed(start + Duration::from_millis(10));
        let before = state.speed;
        assert!(before > 0.0);

        state.apply(&keys(&["w"]));
        state.update_speed(start + Duration::from_millis(10));
        assert_eq!(state.speed, before);
        assert!(state.speed.is_finite());
    }

    #[test]
    fn test_projected_axis_order() {
        let state = VehicleState::new(423_447.0, 5_717_226.0, 34, 'U');
        let p = state.projected();
        assert_eq!(p.easting, 423_447.0);
        assert_eq!(p.northing, 5_717_226.0);
        assert_eq!((p.zone, p.band), (34, 'U'));
    }
}
