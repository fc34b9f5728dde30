//! Read-only views handed to the operator and guest interfaces.

use serde::Serialize;

use room::model::{FanSpeed, Room, SessionRecord, SpeedStats};

/// Full per-room state, plus the wait-set membership flag the room itself
/// does not know about.
#[derive(Debug, Clone, Serialize)]
pub struct RoomStatus {
    pub room_id: String,
    pub room_type: String,
    pub nightly_price: f64,
    pub deposit: f64,
    pub is_free: bool,
    pub power_on: bool,
    pub is_active: bool,
    pub is_waiting: bool,
    pub fan_speed: FanSpeed,
    pub initial_temp: f64,
    pub current_temp: f64,
    pub target_temp: f64,
    pub total_fee: f64,
    pub duration: u64,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
    pub stay_days: u32,
}

impl RoomStatus {
    pub fn from_room(room: &Room, is_waiting: bool) -> Self {
        Self {
            room_id: room.id.clone(),
            room_type: room.room_type.clone(),
            nightly_price: room.nightly_price,
            deposit: room.deposit,
            is_free: room.is_free,
            power_on: room.power_on,
            is_active: room.is_active,
            is_waiting,
            fan_speed: room.fan_speed,
            initial_temp: room.initial_temp,
            current_temp: room.current_temp,
            target_temp: room.target_temp,
            total_fee: room.total_fee,
            duration: room.duration,
            tenant_id: room.tenant.as_ref().map(|t| t.id.clone()),
            tenant_name: room.tenant.as_ref().map(|t| t.name.clone()),
            tenant_phone: room.tenant.as_ref().and_then(|t| t.phone.clone()),
            stay_days: room.stay_days,
        }
    }
}

/// Listing row for the floor overview.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub room_type: String,
    pub nightly_price: f64,
    pub deposit: f64,
    pub is_free: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FloorView {
    pub level: u8,
    pub rooms: Vec<RoomSummary>,
}

/// Charges accrued by the current stay.
#[derive(Debug, Clone, Serialize)]
pub struct BillSummary {
    pub room_id: String,
    pub room_type: String,
    pub stay_days: u32,
    pub stay_fee: f64,
    pub ac_fee: f64,
    pub ac_minutes: u64,
}

/// One logged AC segment, shaped for export.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub start_time: String,
    pub end_time: String,
    pub duration: i64,
    pub fan_speed: FanSpeed,
    pub fee: f64,
    pub total_fee_snapshot: f64,
}

impl From<SessionRecord> for SessionView {
    fn from(rec: SessionRecord) -> Self {
        Self {
            start_time: rec.start_time.to_rfc3339(),
            end_time: rec.end_time.to_rfc3339(),
            duration: rec.duration,
            fan_speed: rec.fan_speed,
            fee: rec.fee,
            total_fee_snapshot: rec.total_fee_snapshot,
        }
    }
}

/// The data behind the detailed AC bill export.
#[derive(Debug, Clone, Serialize)]
pub struct AcDetail {
    pub room_id: String,
    pub total_fee: f64,
    pub dispatch_count: u32,
    pub speed_stats: SpeedStats,
    pub sessions: Vec<SessionView>,
}
