pub mod model;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{CheckInRecord, RoomStateRow};
use room::model::SessionRecord;

/// Durable storage behind the control plane: the tenant log, periodic
/// room-state snapshots, and the append-only AC session log.
///
/// During operation every call is best-effort from the caller's point of
/// view; a persistence failure must never abort a scheduling decision.
/// Startup restore is the exception and fails hard.
#[async_trait]
pub trait HotelStore: Send + Sync {
    /// The latest active check-in per room, for startup restore.
    async fn active_check_ins(&self) -> anyhow::Result<Vec<CheckInRecord>>;

    /// Append a new active check-in, retiring any previous active row for
    /// the same room first.
    async fn add_check_in(&self, rec: &CheckInRecord) -> anyhow::Result<()>;

    /// Mark the room's active check-in as checked out at `at`.
    async fn mark_checked_out(&self, room_id: &str, at: DateTime<Utc>) -> anyhow::Result<()>;

    /// Write through a stay-day change on the room's active check-in.
    async fn update_stay_days(&self, room_id: &str, days: u32) -> anyhow::Result<()>;

    /// Insert or update the room's volatile-state snapshot.
    async fn upsert_room_state(&self, row: &RoomStateRow) -> anyhow::Result<()>;

    /// All persisted room-state snapshots, for startup restore.
    async fn load_room_states(&self) -> anyhow::Result<Vec<RoomStateRow>>;

    /// Append one closed AC session segment.
    async fn log_ac_session(&self, rec: &SessionRecord) -> anyhow::Result<()>;

    /// All logged segments for a room, earliest start first. Read for the
    /// detailed bill export.
    async fn sessions_for_room(&self, room_id: &str) -> anyhow::Result<Vec<SessionRecord>>;
}
