//! Per-room state: thermal simulation, billing meters, tenancy.
//!
//! A `Room` is pure data with a deterministic one-second `tick`. It never
//! talks to the scheduler or the store; the control plane owns those
//! interactions and flips `is_active` from outside.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rates::{self, RETURN_RATE, TEMP_EPSILON};

/// Discrete fan level. Drives both the fee rate and the temperature rate,
/// and doubles as the scheduling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FanSpeed {
    Low,
    Mid,
    High,
}

impl FanSpeed {
    /// Scheduling priority: High outranks Mid outranks Low.
    pub fn priority(self) -> u8 {
        match self {
            FanSpeed::High => 3,
            FanSpeed::Mid => 2,
            FanSpeed::Low => 1,
        }
    }

    pub const ALL: [FanSpeed; 3] = [FanSpeed::High, FanSpeed::Mid, FanSpeed::Low];
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FanSpeed::Low => "Low",
            FanSpeed::Mid => "Mid",
            FanSpeed::High => "High",
        };
        f.write_str(s)
    }
}

impl FromStr for FanSpeed {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(FanSpeed::Low),
            "Mid" => Ok(FanSpeed::Mid),
            "High" => Ok(FanSpeed::High),
            other => Err(anyhow::anyhow!("Invalid FanSpeed value: {}", other)),
        }
    }
}

/// Serving time and money accumulated at one fan speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SpeedStat {
    pub duration: u64,
    pub fee: f64,
}

/// Per-speed breakdown of the room's AC usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpeedStats {
    pub high: SpeedStat,
    pub mid: SpeedStat,
    pub low: SpeedStat,
}

impl SpeedStats {
    pub fn get(&self, speed: FanSpeed) -> SpeedStat {
        match speed {
            FanSpeed::High => self.high,
            FanSpeed::Mid => self.mid,
            FanSpeed::Low => self.low,
        }
    }

    fn get_mut(&mut self, speed: FanSpeed) -> &mut SpeedStat {
        match speed {
            FanSpeed::High => &mut self.high,
            FanSpeed::Mid => &mut self.mid,
            FanSpeed::Low => &mut self.low,
        }
    }

    pub fn total_fee(&self) -> f64 {
        self.high.fee + self.mid.fee + self.low.fee
    }

    pub fn total_duration(&self) -> u64 {
        self.high.duration + self.mid.duration + self.low.duration
    }
}

/// Registered guest of an occupied room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
}

/// The open billing segment: where it started and the fee meter at that
/// point. Closed into a `SessionRecord` on power-off, speed change, or
/// check-out.
#[derive(Debug, Clone, Copy)]
pub struct SessionCursor {
    pub opened_at: DateTime<Utc>,
    /// Logical clock reading when the segment opened; duration is measured
    /// on this clock so simulated seconds count the same as real ones.
    pub opened_tick: u64,
    pub fee_at_open: f64,
}

/// One closed billing segment, ready for the session log.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub room_id: String,
    pub request_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    pub fan_speed: FanSpeed,
    pub fee: f64,
    pub total_fee_snapshot: f64,
}

/// One hotel room: static inventory data plus the volatile HVAC, billing,
/// and tenancy state.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub floor: u8,
    pub room_type: String,
    pub nightly_price: f64,
    pub deposit: f64,

    pub is_free: bool,

    pub power_on: bool,
    /// True exactly while the room sits in the plant's service set.
    pub is_active: bool,
    pub fan_speed: FanSpeed,
    /// Ambient the room drifts back to when unserved.
    pub initial_temp: f64,
    pub current_temp: f64,
    pub target_temp: f64,

    pub total_fee: f64,
    /// Cumulative serving seconds.
    pub duration: u64,
    pub speed_stats: SpeedStats,
    /// Times this room entered the wait set.
    pub dispatch_count: u32,

    pub tenant: Option<Tenant>,
    pub stay_days: u32,

    pub session: Option<SessionCursor>,
}

impl Room {
    pub fn new(
        id: impl Into<String>,
        floor: u8,
        room_type: impl Into<String>,
        nightly_price: f64,
        deposit: f64,
        initial_temp: f64,
    ) -> Self {
        Self {
            id: id.into(),
            floor,
            room_type: room_type.into(),
            nightly_price,
            deposit,
            is_free: true,
            power_on: false,
            is_active: false,
            fan_speed: FanSpeed::Mid,
            initial_temp,
            current_temp: initial_temp,
            target_temp: 25.0,
            total_fee: 0.0,
            duration: 0,
            speed_stats: SpeedStats::default(),
            dispatch_count: 0,
            tenant: None,
            stay_days: 0,
            session: None,
        }
    }

    /// Integrate one simulated second.
    ///
    /// Serving rooms move toward the target and accrue fee; everything else
    /// drifts back toward ambient.
    pub fn tick(&mut self) {
        if !self.power_on {
            self.drift();
            return;
        }

        if self.is_active {
            let rate = rates::fee_rate(self.fan_speed);
            self.total_fee += rate;
            self.duration += 1;

            let stat = self.speed_stats.get_mut(self.fan_speed);
            stat.duration += 1;
            stat.fee += rate;

            let step = rates::temp_rate(self.fan_speed);
            if self.current_temp > self.target_temp {
                self.current_temp -= step;
            } else {
                self.current_temp += step;
            }
        } else {
            self.drift();
        }
    }

    fn drift(&mut self) {
        let diff = self.current_temp - self.initial_temp;
        if diff.abs() > TEMP_EPSILON {
            if diff > 0.0 {
                self.current_temp -= RETURN_RATE;
            } else {
                self.current_temp += RETURN_RATE;
            }
        }
    }

    /// Signed distance from the target temperature.
    pub fn delta_from_target(&self) -> f64 {
        self.current_temp - self.target_temp
    }

    /// True once the room is inside the settle band of its target.
    pub fn target_reached(&self) -> bool {
        self.delta_from_target().abs() < TEMP_EPSILON
    }

    /// Start a billing segment at the current fee meter.
    pub fn open_session(&mut self, now: DateTime<Utc>, tick: u64) {
        self.session = Some(SessionCursor {
            opened_at: now,
            opened_tick: tick,
            fee_at_open: self.total_fee,
        });
    }

    /// Close the open billing segment, if any, attributing the fee accrued
    /// since it opened. Records the room's *current* fan speed, so callers
    /// changing speed must close before mutating it.
    pub fn close_session(&mut self, now: DateTime<Utc>, tick: u64) -> Option<SessionRecord> {
        let cursor = self.session.take()?;
        Some(SessionRecord {
            room_id: self.id.clone(),
            request_time: cursor.opened_at,
            start_time: cursor.opened_at,
            end_time: now,
            duration: tick.saturating_sub(cursor.opened_tick) as i64,
            fan_speed: self.fan_speed,
            fee: self.total_fee - cursor.fee_at_open,
            total_fee_snapshot: self.total_fee,
        })
    }
}
