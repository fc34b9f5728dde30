//! SQLite-backed implementation of the `HotelStore` trait.
//!
//! Responsible for durable persistence of the control plane so that:
//!
//!  - active stays survive restarts
//!  - AC meters (fee, duration, temperatures) are restored on startup
//!  - every closed billing segment is kept for the detailed bill export
//!
//! Schema is created on connect; all timestamps are stored as RFC 3339
//! text.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::HotelStore;
use crate::model::{CheckInRecord, RoomStateRow};
use room::model::{FanSpeed, SessionRecord};

pub struct SqliteHotelStore {
    pool: SqlitePool,
}

impl SqliteHotelStore {
    /// Open (creating if missing) the database at `url` and ensure the
    /// schema exists.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // One connection: an in-memory database exists per connection, and
        // the single-writer core never needs more.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS check_ins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id TEXT NOT NULL,
                tenant_id TEXT NOT NULL,
                tenant_name TEXT NOT NULL,
                tenant_phone TEXT,
                check_in_time TEXT NOT NULL,
                check_out_time TEXT,
                stay_days INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'active'
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS room_states (
                room_id TEXT PRIMARY KEY,
                power_on INTEGER NOT NULL DEFAULT 0,
                fan_speed TEXT NOT NULL DEFAULT 'Mid',
                target_temp REAL NOT NULL DEFAULT 25.0,
                current_temp REAL NOT NULL DEFAULT 28.0,
                total_fee REAL NOT NULL DEFAULT 0.0,
                duration INTEGER NOT NULL DEFAULT 0
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ac_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id TEXT NOT NULL,
                request_time TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                duration INTEGER NOT NULL,
                fan_speed TEXT NOT NULL,
                fee REAL NOT NULL,
                total_fee_snapshot REAL NOT NULL
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn parse_ts(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

#[async_trait]
impl HotelStore for SqliteHotelStore {
    async fn active_check_ins(&self) -> anyhow::Result<Vec<CheckInRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT room_id, tenant_id, tenant_name, tenant_phone, check_in_time, stay_days
            FROM check_ins
            WHERE status = 'active'
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let check_in_time: String = row.get("check_in_time");
            out.push(CheckInRecord {
                room_id: row.get("room_id"),
                tenant_id: row.get("tenant_id"),
                tenant_name: row.get("tenant_name"),
                tenant_phone: row.get("tenant_phone"),
                check_in_time: parse_ts(&check_in_time)?,
                stay_days: row.get::<i64, _>("stay_days") as u32,
            });
        }

        Ok(out)
    }

    async fn add_check_in(&self, rec: &CheckInRecord) -> anyhow::Result<()> {
        // Retire any stale active row first so restore always finds at most
        // one active stay per room.
        sqlx::query(
            r#"
            UPDATE check_ins
            SET status = 'checked_out', check_out_time = ?
            WHERE room_id = ? AND status = 'active'
        "#,
        )
        .bind(rec.check_in_time.to_rfc3339())
        .bind(&rec.room_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO check_ins (room_id, tenant_id, tenant_name, tenant_phone, check_in_time, stay_days, status)
            VALUES (?, ?, ?, ?, ?, ?, 'active')
        "#,
        )
        .bind(&rec.room_id)
        .bind(&rec.tenant_id)
        .bind(&rec.tenant_name)
        .bind(&rec.tenant_phone)
        .bind(rec.check_in_time.to_rfc3339())
        .bind(rec.stay_days as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_checked_out(&self, room_id: &str, at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE check_ins
            SET status = 'checked_out', check_out_time = ?
            WHERE room_id = ? AND status = 'active'
        "#,
        )
        .bind(at.to_rfc3339())
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_stay_days(&self, room_id: &str, days: u32) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE check_ins
            SET stay_days = ?
            WHERE room_id = ? AND status = 'active'
        "#,
        )
        .bind(days as i64)
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_room_state(&self, state: &RoomStateRow) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO room_states (room_id, power_on, fan_speed, target_temp, current_temp, total_fee, duration)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(room_id) DO UPDATE SET
                power_on = excluded.power_on,
                fan_speed = excluded.fan_speed,
                target_temp = excluded.target_temp,
                current_temp = excluded.current_temp,
                total_fee = excluded.total_fee,
                duration = excluded.duration;
        "#,
        )
        .bind(&state.room_id)
        .bind(state.power_on as i64)
        .bind(state.fan_speed.to_string())
        .bind(state.target_temp)
        .bind(state.current_temp)
        .bind(state.total_fee)
        .bind(state.duration as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_room_states(&self) -> anyhow::Result<Vec<RoomStateRow>> {
        let rows = sqlx::query("SELECT * FROM room_states")
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let speed_str: String = row.get("fan_speed");
            let fan_speed = FanSpeed::from_str(&speed_str)
                .map_err(|e| anyhow::anyhow!("Invalid fan speed '{}': {}", speed_str, e))?;

            out.push(RoomStateRow {
                room_id: row.get("room_id"),
                power_on: row.get::<i64, _>("power_on") != 0,
                fan_speed,
                target_temp: row.get("target_temp"),
                current_temp: row.get("current_temp"),
                total_fee: row.get("total_fee"),
                duration: row.get::<i64, _>("duration") as u64,
            });
        }

        Ok(out)
    }

    async fn log_ac_session(&self, rec: &SessionRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ac_sessions (room_id, request_time, start_time, end_time, duration, fan_speed, fee, total_fee_snapshot)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&rec.room_id)
        .bind(rec.request_time.to_rfc3339())
        .bind(rec.start_time.to_rfc3339())
        .bind(rec.end_time.to_rfc3339())
        .bind(rec.duration)
        .bind(rec.fan_speed.to_string())
        .bind(rec.fee)
        .bind(rec.total_fee_snapshot)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn sessions_for_room(&self, room_id: &str) -> anyhow::Result<Vec<SessionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT room_id, request_time, start_time, end_time, duration, fan_speed, fee, total_fee_snapshot
            FROM ac_sessions
            WHERE room_id = ?
            ORDER BY start_time ASC, id ASC
        "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let request_time: String = row.get("request_time");
            let start_time: String = row.get("start_time");
            let end_time: String = row.get("end_time");
            let speed_str: String = row.get("fan_speed");
            let fan_speed = FanSpeed::from_str(&speed_str)
                .map_err(|e| anyhow::anyhow!("Invalid fan speed '{}': {}", speed_str, e))?;

            out.push(SessionRecord {
                room_id: row.get("room_id"),
                request_time: parse_ts(&request_time)?,
                start_time: parse_ts(&start_time)?,
                end_time: parse_ts(&end_time)?,
                duration: row.get("duration"),
                fan_speed,
                fee: row.get("fee"),
                total_fee_snapshot: row.get("total_fee_snapshot"),
            });
        }

        Ok(out)
    }
}
