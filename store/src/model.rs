use chrono::{DateTime, Utc};

use room::model::{FanSpeed, Room};

/// One row of the append-only check-in log. The store manages the
/// `check_out_time`/`status` columns itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInRecord {
    pub room_id: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub tenant_phone: Option<String>,
    pub check_in_time: DateTime<Utc>,
    pub stay_days: u32,
}

/// Snapshot of a room's volatile HVAC state, upserted by room id.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomStateRow {
    pub room_id: String,
    pub power_on: bool,
    pub fan_speed: FanSpeed,
    pub target_temp: f64,
    pub current_temp: f64,
    pub total_fee: f64,
    pub duration: u64,
}

impl From<&Room> for RoomStateRow {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id.clone(),
            power_on: room.power_on,
            fan_speed: room.fan_speed,
            target_temp: room.target_temp,
            current_temp: room.current_temp,
            total_fee: room.total_fee,
            duration: room.duration,
        }
    }
}
