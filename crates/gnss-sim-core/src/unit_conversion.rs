//! Unit Conversion Functions
//!
//! Speed conversions used by telemetry:
//! - Speed: km/h ↔ m/s (recordings store km/h, telemetry publishes m/s)
//! - Angle: heading in the model frame ↔ compass heading

/// km/h per m/s
const KMH_PER_MS: f64 = 3.6;

/// Convert km/h to m/s
pub fn kmh_to_ms(kmh: f64) -> f64 {
    kmh / KMH_PER_MS
}

/// Convert m/s to km/h
pub fn ms_to_kmh(ms: f64) -> f64 {
    ms * KMH_PER_MS
}

/// Reduce an angle in degrees to `[0, 360)`.
///
/// `rem_euclid` can round up to exactly 360.0 for tiny negative inputs, so
/// that case is folded back to zero.
pub fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Convert a model heading (0° = +x, counter-clockwise) into the compass
/// convention published to consumers (0° = north, clockwise).
pub fn model_to_compass_heading(heading: f64) -> f64 {
    wrap_degrees(-heading + 180.0 - 90.0)
}
