//! Operator input events

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    Motion, MotionInput, KEY_BOOST_STEP, KEY_REVERSE_STEP, KEY_STEP, KEY_TURN_STEP_DEG,
    STICK_MAX_FORWARD_STEP, STICK_MAX_TURN_STEP_DEG, STICK_MIN_REVERSE_STEP,
};

/// Analog axes with a magnitude below this are treated as zero
pub const DEAD_ZONE: f64 = 0.1;

/// Rejected analog sample
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// An axis is NaN or infinite
    #[error("Axis {0} is not a finite number")]
    NonFinite(&'static str),

    /// An axis is outside its range (`-1..=1` for sticks, `0..=1` for the trigger)
    #[error("Axis {axis} out of range: {value}")]
    OutOfRange {
        /// Wire name of the axis
        axis: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Keys understood by the discrete key model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// `w`
    Forward,
    /// `s`
    Backward,
    /// `a`
    TurnLeft,
    /// `d`
    TurnRight,
    /// `Shift`
    Boost,
}

impl Key {
    /// Map a browser key identifier (`w`, `s`, `a`, `d`, `Shift`) to a key
    pub fn from_identifier(id: &str) -> Option<Self> {
        match id {
            "w" => Some(Key::Forward),
            "s" => Some(Key::Backward),
            "a" => Some(Key::TurnLeft),
            "d" => Some(Key::TurnRight),
            "Shift" => Some(Key::Boost),
            _ => None,
        }
    }

    /// The browser key identifier for this key
    pub fn identifier(&self) -> &'static str {
        match self {
            Key::Forward => "w",
            Key::Backward => "s",
            Key::TurnLeft => "a",
            Key::TurnRight => "d",
            Key::Boost => "Shift",
        }
    }
}

/// Set of keys held down during one key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeySet {
    /// Forward held
    pub forward: bool,
    /// Backward held
    pub backward: bool,
    /// Left turn held
    pub turn_left: bool,
    /// Right turn held
    pub turn_right: bool,
    /// Boost held
    pub boost: bool,
}

impl KeySet {
    /// Build a key set from identifiers; unknown identifiers are ignored
    pub fn from_identifiers<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .filter_map(|id| Key::from_identifier(id.as_ref()))
            .fold(Self::default(), |mut set, key| {
                set.insert(key);
                set
            })
    }

    /// Mark a key as held
    pub fn insert(&mut self, key: Key) {
        match key {
            Key::Forward => self.forward = true,
            Key::Backward => self.backward = true,
            Key::TurnLeft => self.turn_left = true,
            Key::TurnRight => self.turn_right = true,
            Key::Boost => self.boost = true,
        }
    }

    /// Whether a key is held
    pub fn contains(&self, key: Key) -> bool {
        match key {
            Key::Forward => self.forward,
            Key::Backward => self.backward,
            Key::TurnLeft => self.turn_left,
            Key::TurnRight => self.turn_right,
            Key::Boost => self.boost,
        }
    }

    /// No key held
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Held keys as browser identifiers, in a fixed order
    pub fn identifiers(&self) -> Vec<&'static str> {
        [
            Key::Forward,
            Key::Backward,
            Key::TurnLeft,
            Key::TurnRight,
            Key::Boost,
        ]
        .into_iter()
        .filter(|k| self.contains(*k))
        .map(|k| k.identifier())
        .collect()
    }
}

impl MotionInput for KeySet {
    fn motion(&self) -> Motion {
        let mut turn_deg = 0.0;
        if self.turn_left {
            turn_deg += KEY_TURN_STEP_DEG;
        }
        if self.turn_right {
            turn_deg -= KEY_TURN_STEP_DEG;
        }

        // Forward takes precedence when both directions are held
        let step = if self.forward {
            if self.boost {
                KEY_BOOST_STEP
            } else {
                KEY_STEP
            }
        } else if self.backward {
            -KEY_REVERSE_STEP
        } else {
            0.0
        };

        Motion { turn_deg, step }
    }
}

/// One analog controller sample.
///
/// Field names follow the gamepad client (`leftX`, `leftY`, ...). All five
/// fields are required; a sample missing any of them fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalogInput {
    /// Left stick horizontal, -1..1
    pub left_x: f64,
    /// Left stick vertical, -1..1 (positive = forward)
    pub left_y: f64,
    /// Right stick horizontal, -1..1 (positive = clockwise)
    pub right_x: f64,
    /// Right stick vertical, -1..1
    pub right_y: f64,
    /// Right trigger, 0..1
    pub rt: f64,
}

fn dead_zone(value: f64) -> f64 {
    if value.abs() < DEAD_ZONE {
        0.0
    } else {
        value
    }
}

fn check_axis(axis: &'static str, value: f64, min: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NonFinite(axis));
    }
    if !(min..=1.0).contains(&value) {
        return Err(InputError::OutOfRange { axis, value });
    }
    Ok(())
}

impl AnalogInput {
    /// Sample from raw axis values
    pub fn new(left_x: f64, left_y: f64, right_x: f64, right_y: f64, rt: f64) -> Self {
        Self {
            left_x,
            left_y,
            right_x,
            right_y,
            rt,
        }
    }

    /// Check every axis is finite and in range.
    ///
    /// Sticks must lie in `-1..=1` and the trigger in `0..=1`.
    pub fn validate(&self) -> Result<(), InputError> {
        check_axis("leftX", self.left_x, -1.0)?;
        check_axis("leftY", self.left_y, -1.0)?;
        check_axis("rightX", self.right_x, -1.0)?;
        check_axis("rightY", self.right_y, -1.0)?;
        check_axis("rt", self.rt, 0.0)
    }

    /// Copy with the dead-zone applied to the four stick axes.
    ///
    /// `left_x` and `right_y` are filtered too but carry no motion.
    pub fn filtered(&self) -> Self {
        Self {
            left_x: dead_zone(self.left_x),
            left_y: dead_zone(self.left_y),
            right_x: dead_zone(self.right_x),
            right_y: dead_zone(self.right_y),
            rt: self.rt,
        }
    }

    /// Forward step for a filtered sample
    fn forward_step(&self) -> f64 {
        // A centred stick must not creep backwards at the reverse step
        if self.left_y == 0.0 {
            return 0.0;
        }
        let mut step = self.left_y * (STICK_MAX_FORWARD_STEP - STICK_MIN_REVERSE_STEP)
            + STICK_MIN_REVERSE_STEP;
        if self.rt > 0.0 {
            step *= 1.0 + self.rt;
        }
        step
    }
}

impl MotionInput for AnalogInput {
    fn motion(&self) -> Motion {
        let f = self.filtered();
        Motion {
            turn_deg: -(f.right_x * STICK_MAX_TURN_STEP_DEG),
            step: f.forward_step(),
        }
    }
}

/// An operator input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Keys held during one key event
    DiscreteKeys(KeySet),
    /// One controller sample
    Analog(AnalogInput),
}

impl InputEvent {
    /// Reject analog samples with non-finite or out-of-range axes
    pub fn validate(&self) -> Result<(), InputError> {
        match self {
            InputEvent::DiscreteKeys(_) => Ok(()),
            InputEvent::Analog(input) => input.validate(),
        }
    }
}

impl MotionInput for InputEvent {
    fn motion(&self) -> Motion {
        match self {
            InputEvent::DiscreteKeys(keys) => keys.motion(),
            InputEvent::Analog(input) => input.motion(),
        }
    }
}

impl From<KeySet> for InputEvent {
    fn from(keys: KeySet) -> Self {
        InputEvent::DiscreteKeys(keys)
    }
}

impl From<AnalogInput> for InputEvent {
    fn from(input: AnalogInput) -> Self {
        InputEvent::Analog(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_set_from_identifiers() {
        let keys = KeySet::from_identifiers(["w", "Shift", "x", "A"]);
        assert!(keys.forward);
        assert!(keys.boost);
        assert!(!keys.turn_left, "identifiers are case sensitive");
        assert_eq!(keys.identifiers(), vec!["w", "Shift"]);
    }

    #[test]
    fn test_key_turns_cancel() {
        let m = KeySet::from_identifiers(["a", "d"]).motion();
        assert_eq!(m.turn_deg, 0.0);
        assert_eq!(m.step, 0.0);
    }

    #[test]
    fn test_reverse_ignores_boost() {
        let m = KeySet::from_identifiers(["s", "Shift"]).motion();
        assert_eq!(m.step, -KEY_REVERSE_STEP);
    }

    #[test]
    fn test_forward_wins_over_backward() {
        let both = KeySet::from_identifiers(["w", "s"]).motion();
        let forward = KeySet::from_identifiers(["w"]).motion();
        assert_eq!(both, forward);
    }

    #[test]
    fn test_dead_zone_filters_all_axes() {
        let f = AnalogInput::new(0.09, -0.05, 0.099, -0.09, 0.05).filtered();
        assert_eq!(f, AnalogInput::new(0.0, 0.0, 0.0, 0.0, 0.05));

        let kept = AnalogInput::new(0.1, -0.1, 0.5, 1.0, 0.0).filtered();
        assert_eq!(kept, AnalogInput::new(0.1, -0.1, 0.5, 1.0, 0.0));
    }

    #[test]
    fn test_stick_inside_dead_zone_does_not_move() {
        let m = AnalogInput::new(0.0, 0.05, 0.0, 0.0, 0.0).motion();
        assert_eq!(m.step, 0.0);
    }

    #[test]
    fn test_full_stick_reaches_max_step() {
        let m = AnalogInput::new(0.0, 1.0, 0.0, 0.0, 0.0).motion();
        assert!((m.step - STICK_MAX_FORWARD_STEP).abs() < 1e-12);
        assert_eq!(m.turn_deg, 0.0);
    }

    #[test]
    fn test_trigger_boosts_step() {
        let m = AnalogInput::new(0.0, 1.0, 0.0, 0.0, 1.0).motion();
        assert!((m.step - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_full_reverse_stick() {
        // -1 * 0.13 - 0.03
        let m = AnalogInput::new(0.0, -1.0, 0.0, 0.0, 0.0).motion();
        assert!((m.step - (-0.16)).abs() < 1e-12);
    }

    #[test]
    fn test_right_stick_turns_clockwise() {
        let m = AnalogInput::new(0.0, 0.0, 1.0, 0.0, 0.0).motion();
        assert!((m.turn_deg + STICK_MAX_TURN_STEP_DEG).abs() < 1e-12);
    }

    #[test]
    fn test_unused_axes_carry_no_motion() {
        let m = AnalogInput::new(1.0, 0.0, 0.0, 1.0, 0.0).motion();
        assert_eq!(m, Motion::default());
    }

    #[test]
    fn test_validate_accepts_full_deflection() {
        assert_eq!(AnalogInput::new(-1.0, 1.0, 1.0, -1.0, 1.0).validate(), Ok(()));
        assert_eq!(AnalogInput::new(0.0, 0.0, 0.0, 0.0, 0.0).validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_huge_axis() {
        assert_eq!(
            AnalogInput::new(0.0, 1e308, 0.0, 0.0, 0.0).validate(),
            Err(InputError::OutOfRange {
                axis: "leftY",
                value: 1e308
            })
        );
        assert_eq!(
            AnalogInput::new(0.0, 0.0, -1.5, 0.0, 0.0).validate(),
            Err(InputError::OutOfRange {
                axis: "rightX",
                value: -1.5
            })
        );
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert_eq!(
            AnalogInput::new(f64::NAN, 0.0, 0.0, 0.0, 0.0).validate(),
            Err(InputError::NonFinite("leftX"))
        );
        assert_eq!(
            AnalogInput::new(0.0, 0.0, 0.0, f64::INFINITY, 0.0).validate(),
            Err(InputError::NonFinite("rightY"))
        );
    }

    #[test]
    fn test_validate_trigger_range() {
        assert!(AnalogInput::new(0.0, 0.5, 0.0, 0.0, -0.1).validate().is_err());
        assert!(AnalogInput::new(0.0, 0.5, 0.0, 0.0, 1.01).validate().is_err());
    }

    #[test]
    fn test_key_events_always_valid() {
        let event = InputEvent::DiscreteKeys(KeySet::from_identifiers(["w", "a"]));
        assert_eq!(event.validate(), Ok(()));
        let bad = InputEvent::Analog(AnalogInput::new(0.0, 2.0, 0.0, 0.0, 0.0));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_analog_deserialize_requires_all_fields() {
        let ok: AnalogInput = serde_json::from_str(
            r#"{"leftX":0.0,"leftY":0.5,"rightX":-0.2,"rightY":0.0,"rt":0.0}"#,
        )
        .unwrap();
        assert_eq!(ok.left_y, 0.5);

        let missing = serde_json::from_str::<AnalogInput>(r#"{"leftX":0.0,"leftY":0.5}"#);
        assert!(missing.is_err());
    }
}
