use serde::Deserialize;

use room::model::FanSpeed;

/// One control request against a room's AC. Present fields apply in
/// declaration order: the power edge first, then the target, then the
/// fan speed.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ControlCommand {
    pub power_on: Option<bool>,
    pub target_temp: Option<f64>,
    pub fan_speed: Option<FanSpeed>,
}

impl ControlCommand {
    pub fn power(on: bool) -> Self {
        Self {
            power_on: Some(on),
            ..Self::default()
        }
    }

    pub fn target(temp: f64) -> Self {
        Self {
            target_temp: Some(temp),
            ..Self::default()
        }
    }

    pub fn speed(speed: FanSpeed) -> Self {
        Self {
            fan_speed: Some(speed),
            ..Self::default()
        }
    }
}

/// Guest registration data for `check_in`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub room_id: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub tenant_phone: Option<String>,
    /// Nights billed so far; normally 0 at check-in and incremented on
    /// each manual power-off cycle.
    #[serde(default)]
    pub stay_days: u32,
}
