//! Shared types used by the scheduler subsystem.

use room::model::FanSpeed;
use serde::Serialize;

/// Configuration knobs for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Rooms the plant can serve at once.
    pub service_slots: usize,

    /// Seconds a waiter sits in the wait set before it may displace the
    /// longest-serving room (the time-slice length).
    pub wait_budget: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            service_slots: 3,
            wait_budget: 120,
        }
    }
}

/// A room currently receiving service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceEntry {
    pub room_id: String,
    pub fan_speed: FanSpeed,
    /// Logical tick at which the room most recently entered service.
    /// Reset on every re-admission, preserved by in-place speed updates.
    pub start_time: u64,
}

/// A room waiting for a slot.
#[derive(Debug, Clone, Serialize)]
pub struct WaitEntry {
    pub room_id: String,
    pub fan_speed: FanSpeed,
    /// Seconds left before this waiter may force a rotation.
    pub wait_budget: u32,
}

/// Membership change produced by a scheduler operation.
///
/// The scheduler never touches room state itself; the owner applies these
/// to the rooms it holds (`is_active` flips, dispatch counting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The room entered the service set.
    EnteredService { room_id: String },
    /// The room entered the wait set.
    EnteredWait { room_id: String },
    /// The room left both sets.
    Released { room_id: String },
}
