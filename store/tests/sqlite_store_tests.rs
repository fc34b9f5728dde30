//! Round-trip tests for the SQLite store: schema creation, upsert
//! semantics, active-row bookkeeping, and session-log ordering.

use chrono::{Duration, Utc};

use room::model::{FanSpeed, SessionRecord};
use store::HotelStore;
use store::model::{CheckInRecord, RoomStateRow};
use store::sqlite::SqliteHotelStore;

async fn fresh_store() -> SqliteHotelStore {
    SqliteHotelStore::new("sqlite::memory:")
        .await
        .expect("in-memory store")
}

fn sample_check_in(room_id: &str) -> CheckInRecord {
    CheckInRecord {
        room_id: room_id.into(),
        tenant_id: "110101199001011234".into(),
        tenant_name: "Li Hua".into(),
        tenant_phone: Some("13800138000".into()),
        check_in_time: Utc::now(),
        stay_days: 0,
    }
}

fn sample_state(room_id: &str) -> RoomStateRow {
    RoomStateRow {
        room_id: room_id.into(),
        power_on: true,
        fan_speed: FanSpeed::High,
        target_temp: 22.0,
        current_temp: 29.4,
        total_fee: 3.25,
        duration: 195,
    }
}

#[tokio::test]
async fn check_in_round_trips() -> anyhow::Result<()> {
    let store = fresh_store().await;

    let rec = sample_check_in("101");
    store.add_check_in(&rec).await?;

    let active = store.active_check_ins().await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0], rec);

    Ok(())
}

#[tokio::test]
async fn new_check_in_retires_previous_active_row() -> anyhow::Result<()> {
    let store = fresh_store().await;

    let first = sample_check_in("101");
    store.add_check_in(&first).await?;

    let mut second = sample_check_in("101");
    second.tenant_name = "Wang Fang".into();
    store.add_check_in(&second).await?;

    let active = store.active_check_ins().await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].tenant_name, "Wang Fang");

    Ok(())
}

#[tokio::test]
async fn check_out_clears_active_row() -> anyhow::Result<()> {
    let store = fresh_store().await;

    store.add_check_in(&sample_check_in("101")).await?;
    store.add_check_in(&sample_check_in("203")).await?;

    store.mark_checked_out("101", Utc::now()).await?;

    let active = store.active_check_ins().await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].room_id, "203");

    Ok(())
}

#[tokio::test]
async fn stay_days_write_through_updates_active_row() -> anyhow::Result<()> {
    let store = fresh_store().await;

    store.add_check_in(&sample_check_in("101")).await?;
    store.update_stay_days("101", 2).await?;

    let active = store.active_check_ins().await?;
    assert_eq!(active[0].stay_days, 2);

    Ok(())
}

#[tokio::test]
async fn room_state_upsert_inserts_then_updates() -> anyhow::Result<()> {
    let store = fresh_store().await;

    let mut row = sample_state("101");
    store.upsert_room_state(&row).await?;

    row.power_on = false;
    row.total_fee = 4.5;
    row.duration = 270;
    store.upsert_room_state(&row).await?;

    let loaded = store.load_room_states().await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], row);

    Ok(())
}

#[tokio::test]
async fn room_states_load_per_room() -> anyhow::Result<()> {
    let store = fresh_store().await;

    store.upsert_room_state(&sample_state("101")).await?;
    store.upsert_room_state(&sample_state("102")).await?;

    let mut loaded = store.load_room_states().await?;
    loaded.sort_by(|a, b| a.room_id.cmp(&b.room_id));
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].room_id, "101");
    assert_eq!(loaded[1].room_id, "102");

    Ok(())
}

#[tokio::test]
async fn session_log_appends_and_reads_in_start_order() -> anyhow::Result<()> {
    let store = fresh_store().await;
    let t0 = Utc::now();

    let early = SessionRecord {
        room_id: "101".into(),
        request_time: t0,
        start_time: t0,
        end_time: t0 + Duration::seconds(30),
        duration: 30,
        fan_speed: FanSpeed::Mid,
        fee: 0.25,
        total_fee_snapshot: 0.25,
    };
    let late = SessionRecord {
        room_id: "101".into(),
        request_time: t0 + Duration::seconds(30),
        start_time: t0 + Duration::seconds(30),
        end_time: t0 + Duration::seconds(60),
        duration: 30,
        fan_speed: FanSpeed::High,
        fee: 0.5,
        total_fee_snapshot: 0.75,
    };
    let other_room = SessionRecord {
        room_id: "102".into(),
        ..early.clone()
    };

    // Insert out of order; reads must come back by start time.
    store.log_ac_session(&late).await?;
    store.log_ac_session(&early).await?;
    store.log_ac_session(&other_room).await?;

    let sessions = store.sessions_for_room("101").await?;
    assert_eq!(sessions, vec![early, late]);

    Ok(())
}
