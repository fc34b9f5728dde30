//! Canonical per-second rate tables for the central plant.

use crate::model::FanSpeed;

/// Money charged per serving second at a given fan speed.
pub fn fee_rate(speed: FanSpeed) -> f64 {
    match speed {
        FanSpeed::High => 1.0 / 60.0,
        FanSpeed::Mid => 1.0 / 120.0,
        FanSpeed::Low => 1.0 / 180.0,
    }
}

/// Degrees moved toward the target per serving second at a given fan speed.
pub fn temp_rate(speed: FanSpeed) -> f64 {
    match speed {
        FanSpeed::High => 0.6 / 60.0,
        FanSpeed::Mid => 0.5 / 60.0,
        FanSpeed::Low => 0.4 / 60.0,
    }
}

/// Passive drift toward ambient, degrees per second (0.5 °C per minute).
pub const RETURN_RATE: f64 = 0.5 / 60.0;

/// Band inside which a temperature counts as settled.
pub const TEMP_EPSILON: f64 = 0.01;

/// An idle room that drifts further than this from its target re-enters
/// scheduling automatically.
pub const REACTIVATE_DELTA: f64 = 1.0;
