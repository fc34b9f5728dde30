//! End-to-end control-plane scenarios: façade commands, the per-tick
//! driver ordering, session segmentation, and the plant-wide invariants.


use std::sync::Arc;

use control::command::{CheckInRequest, ControlCommand};
use control::config::PlantConfig;
use control::error::ControlError;
use control::hotel::Hotel;
use mock_store::InMemoryStore;
use room::model::FanSpeed;

fn guest(room_id: &str) -> CheckInRequest {
    CheckInRequest {
        room_id: room_id.into(),
        tenant_id: "440301199001011234".into(),
        tenant_name: "Zhang Wei".into(),
        tenant_phone: Some("13800138000".into()),
        stay_days: 0,
    }
}

async fn occupied_hotel(rooms: &[&str]) -> (Hotel, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::default());
    let mut hotel = Hotel::restore(&PlantConfig::default(), store.clone())
        .await
        .expect("restore from empty store");
    for id in rooms {
        hotel.check_in(guest(id)).await.expect("check in");
    }
    (hotel, store)
}

fn assert_invariants(hotel: &Hotel) {
    let sched = hotel.scheduler();

    assert!(sched.service_entries().len() <= 3, "service set over capacity");
    if !sched.wait_entries().is_empty() {
        assert_eq!(
            sched.service_entries().len(),
            3,
            "waiters exist while a slot is free"
        );
    }

    for room in hotel.rooms() {
        let serving = sched.is_serving(&room.id);
        let waiting = sched.is_waiting(&room.id);

        assert!(!(serving && waiting), "room {} in both sets", room.id);
        assert_eq!(
            room.is_active, serving,
            "room {} is_active disagrees with service set",
            room.id
        );
        if !room.power_on {
            assert!(!serving && !waiting, "powered-off room {} scheduled", room.id);
        }
        if room.is_free {
            assert!(!room.power_on, "free room {} powered on", room.id);
        }

        assert_eq!(room.speed_stats.total_duration(), room.duration);
        assert!((room.speed_stats.total_fee() - room.total_fee).abs() < 1e-6);
    }
}

#[tokio::test]
async fn control_rejects_unknown_room() {
    let (mut hotel, _) = occupied_hotel(&[]).await;

    let err = hotel
        .control("999", ControlCommand::power(true))
        .await
        .unwrap_err();

    assert!(matches!(err, ControlError::UnknownRoom(_)));
}

#[tokio::test]
async fn control_rejects_free_room() {
    let (mut hotel, _) = occupied_hotel(&[]).await;

    let err = hotel
        .control("101", ControlCommand::power(true))
        .await
        .unwrap_err();

    assert!(matches!(err, ControlError::RoomNotOccupied(_)));
}

#[tokio::test]
async fn control_rejects_non_numeric_target() {
    let (mut hotel, _) = occupied_hotel(&["101"]).await;

    let err = hotel
        .control("101", ControlCommand::target(f64::NAN))
        .await
        .unwrap_err();

    assert!(matches!(err, ControlError::InvalidArgument(_)));
}

#[tokio::test]
async fn check_in_requires_tenant_identity() {
    let (mut hotel, _) = occupied_hotel(&[]).await;

    let mut req = guest("101");
    req.tenant_name = String::new();

    let err = hotel.check_in(req).await.unwrap_err();
    assert!(matches!(err, ControlError::InvalidArgument(_)));
}

#[tokio::test]
async fn power_on_starts_service_and_meters_fee() {
    let (mut hotel, _) = occupied_hotel(&["101"]).await;

    let status = hotel
        .control("101", ControlCommand::power(true))
        .await
        .unwrap();
    assert!(status.is_active);

    for _ in 0..30 {
        hotel.step();
    }

    let room = hotel.room("101").unwrap();
    // Default Mid speed: 30 s at 1/120 per second.
    assert!((room.total_fee - 0.25).abs() < 1e-9);
    assert_eq!(room.duration, 30);
    assert_invariants(&hotel);
}

#[tokio::test]
async fn target_reached_frees_slot_for_waiter_in_same_pass() {
    let (mut hotel, _) = occupied_hotel(&["101", "102", "103", "104"]).await;

    // 101 gets a nearby target so it finishes quickly at High.
    hotel
        .control(
            "101",
            ControlCommand {
                power_on: Some(true),
                target_temp: Some(31.5),
                fan_speed: Some(FanSpeed::High),
            },
        )
        .await
        .unwrap();
    hotel.control("102", ControlCommand::power(true)).await.unwrap();
    hotel.control("103", ControlCommand::power(true)).await.unwrap();
    hotel.control("104", ControlCommand::power(true)).await.unwrap();

    assert!(hotel.status("104").unwrap().is_waiting);

    let mut released_at = None;
    for step in 1..=80u64 {
        hotel.step();
        assert_invariants(&hotel);

        if !hotel.room("101").unwrap().is_active {
            released_at = Some(step);
            // The freed slot went to the waiter within the same pass.
            assert!(hotel.room("104").unwrap().is_active);
            break;
        }
    }

    let released_at = released_at.expect("101 never reached its target");
    assert!((45..=55).contains(&released_at), "released at {released_at}");

    // Once released, the fee meter stops.
    let fee_at_release = hotel.room("101").unwrap().total_fee;
    for _ in 0..10 {
        hotel.step();
    }
    assert_eq!(hotel.room("101").unwrap().total_fee, fee_at_release);
    assert_eq!(hotel.scheduler().service_entries().len(), 3);
    assert!(hotel.scheduler().wait_entries().is_empty());
}

#[tokio::test]
async fn idle_room_reactivates_after_drifting_past_one_degree() {
    let (mut hotel, _) = occupied_hotel(&["105"]).await;

    // Ambient 35.0; cool to 33.0 then let it drift back.
    hotel
        .control(
            "105",
            ControlCommand {
                power_on: Some(true),
                target_temp: Some(33.0),
                fan_speed: Some(FanSpeed::High),
            },
        )
        .await
        .unwrap();

    let mut steps = 0;
    while hotel.room("105").unwrap().is_active {
        hotel.step();
        steps += 1;
        assert!(steps <= 260, "never reached target");
    }
    assert!((hotel.room("105").unwrap().current_temp - 33.0).abs() < 0.05);

    // No further commands: drift alone must bring it back.
    let mut drift_steps = 0;
    while !hotel.room("105").unwrap().is_active {
        hotel.step();
        drift_steps += 1;
        assert!(drift_steps <= 200, "never reactivated");
        assert_invariants(&hotel);
    }

    assert!(drift_steps >= 120, "reactivated after only {drift_steps} steps");
    assert!(hotel.room("105").unwrap().current_temp > 34.0 - 0.01);
}

#[tokio::test]
async fn speed_change_splits_billing_segments() {
    let (mut hotel, store) = occupied_hotel(&["101"]).await;

    hotel.control("101", ControlCommand::power(true)).await.unwrap();
    for _ in 0..30 {
        hotel.step();
    }

    hotel
        .control("101", ControlCommand::speed(FanSpeed::High))
        .await
        .unwrap();
    for _ in 0..30 {
        hotel.step();
    }

    hotel.control("101", ControlCommand::power(false)).await.unwrap();

    let sessions = store.sessions.lock().await;
    assert_eq!(sessions.len(), 2);

    assert_eq!(sessions[0].fan_speed, FanSpeed::Mid);
    assert_eq!(sessions[0].duration, 30);
    assert!((sessions[0].fee - 0.25).abs() < 1e-9);
    assert!((sessions[0].total_fee_snapshot - 0.25).abs() < 1e-9);

    assert_eq!(sessions[1].fan_speed, FanSpeed::High);
    assert_eq!(sessions[1].duration, 30);
    assert!((sessions[1].fee - 0.5).abs() < 1e-9);
    assert!((sessions[1].total_fee_snapshot - 0.75).abs() < 1e-9);

    let room = hotel.room("101").unwrap();
    assert_eq!(room.speed_stats.mid.duration, 30);
    assert_eq!(room.speed_stats.high.duration, 30);
    assert!((room.total_fee - 0.75).abs() < 1e-9);

    // The manual off edge billed one night.
    assert_eq!(room.stay_days, 1);
    assert_eq!(store.active.lock().await["101"].stay_days, 1);
}

#[tokio::test]
async fn check_out_terminates_service_and_flushes_state() {
    let (mut hotel, store) = occupied_hotel(&["101"]).await;

    hotel.control("101", ControlCommand::power(true)).await.unwrap();
    for _ in 0..10 {
        hotel.step();
    }

    hotel.check_out("101").await.unwrap();

    let room = hotel.room("101").unwrap();
    assert!(room.is_free);
    assert!(!room.power_on);
    assert!(!room.is_active);
    assert!(room.tenant.is_none());
    assert_eq!(room.stay_days, 0);
    assert!(!hotel.scheduler().is_serving("101"));
    assert_invariants(&hotel);

    // The open session closed into the log and the final state flushed.
    let sessions = store.sessions.lock().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration, 10);

    assert!(store.active.lock().await.is_empty());
    assert_eq!(*store.checked_out.lock().await, vec!["101".to_string()]);

    let states = store.room_states.lock().await;
    let row = &states["101"];
    assert!(!row.power_on);
    assert!((row.total_fee - 10.0 / 120.0).abs() < 1e-9);
}

#[tokio::test]
async fn snapshot_restore_snapshot_is_stable() {
    let store = Arc::new(InMemoryStore::default());
    let cfg = PlantConfig::default();

    {
        let mut hotel = Hotel::restore(&cfg, store.clone()).await.unwrap();
        hotel.check_in(guest("101")).await.unwrap();
        hotel.control("101", ControlCommand::power(true)).await.unwrap();
        for _ in 0..30 {
            hotel.step();
        }
        hotel.flush_snapshots().await;
    }

    let before = store.room_states.lock().await["101"].clone();

    let restored = Hotel::restore(&cfg, store.clone()).await.unwrap();
    let room = restored.room("101").unwrap();
    assert!(!room.is_free);
    assert_eq!(room.tenant.as_ref().unwrap().name, "Zhang Wei");
    assert!(room.power_on);
    assert_eq!(room.duration, before.duration);
    assert!((room.total_fee - before.total_fee).abs() < 1e-12);
    // Membership is transient: a restored room waits for the first tick.
    assert!(!room.is_active);

    restored.flush_snapshots().await;
    let after = store.room_states.lock().await["101"].clone();
    assert_eq!(before, after);
}

#[tokio::test]
async fn bill_combines_stay_and_ac_charges() {
    let (mut hotel, _) = occupied_hotel(&["101"]).await;

    hotel.control("101", ControlCommand::power(true)).await.unwrap();
    for _ in 0..60 {
        hotel.step();
    }
    hotel.control("101", ControlCommand::power(false)).await.unwrap();

    let bill = hotel.bill("101").unwrap();
    assert_eq!(bill.stay_days, 1);
    // Demo profile prices room 101 at 100.0 per night.
    assert!((bill.stay_fee - 100.0).abs() < 1e-9);
    assert!((bill.ac_fee - 0.5).abs() < 1e-9);
    assert_eq!(bill.ac_minutes, 1);

    let err = hotel.bill("201").unwrap_err();
    assert!(matches!(err, ControlError::RoomNotOccupied(_)));
}

#[tokio::test]
async fn ac_detail_reports_dispatches_and_sessions() {
    let (mut hotel, _) = occupied_hotel(&["101", "102", "103", "104"]).await;

    for id in ["101", "102", "103", "104"] {
        hotel.control(id, ControlCommand::power(true)).await.unwrap();
    }

    // 104 overflowed into the wait set once.
    let detail = hotel.ac_detail("104").await.unwrap();
    assert_eq!(detail.dispatch_count, 1);

    hotel.control("104", ControlCommand::power(false)).await.unwrap();
    let detail = hotel.ac_detail("104").await.unwrap();
    assert_eq!(detail.sessions.len(), 1);
}

#[tokio::test]
async fn status_reports_wait_set_membership() {
    let (mut hotel, _) = occupied_hotel(&["101", "102", "103", "104"]).await;

    for id in ["101", "102", "103", "104"] {
        hotel.control(id, ControlCommand::power(true)).await.unwrap();
    }

    let status = hotel.status("104").unwrap();
    assert!(status.power_on);
    assert!(!status.is_active);
    assert!(status.is_waiting);

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["is_waiting"], serde_json::Value::Bool(true));
    assert_eq!(json["room_id"], "104");
}

#[tokio::test]
async fn floor_listing_groups_rooms_in_id_order() {
    let (hotel, _) = occupied_hotel(&[]).await;

    let floors = hotel.list_floors();
    assert_eq!(floors.len(), 4);
    assert_eq!(floors[0].level, 1);
    assert_eq!(floors[0].rooms.len(), 10);
    assert_eq!(floors[0].rooms[0].room_id, "101");
    assert_eq!(floors[3].rooms[9].room_id, "410");
}

/// A compressed version of the acceptance timeline: five rooms, twenty-five
/// minutes of mixed power/target/speed traffic, invariants checked after
/// every command and every simulated second.
#[tokio::test]
async fn scripted_timeline_preserves_invariants() {
    let (mut hotel, _) = occupied_hotel(&["101", "102", "103", "104", "105"]).await;

    let script: &[(u64, &str, ControlCommand)] = &[
        (0, "101", ControlCommand::power(true)),
        (1, "101", ControlCommand::target(18.0)),
        (1, "102", ControlCommand::power(true)),
        (1, "105", ControlCommand::power(true)),
        (2, "103", ControlCommand::power(true)),
        (3, "102", ControlCommand::target(19.0)),
        (3, "104", ControlCommand::power(true)),
        (4, "105", ControlCommand::target(22.0)),
        (5, "101", ControlCommand::speed(FanSpeed::High)),
        (6, "102", ControlCommand::power(false)),
        (7, "102", ControlCommand::power(true)),
        (7, "105", ControlCommand::speed(FanSpeed::High)),
        (9, "101", ControlCommand::target(22.0)),
        (9, "104", ControlCommand::target(18.0)),
        (9, "104", ControlCommand::speed(FanSpeed::High)),
        (11, "102", ControlCommand::target(22.0)),
        (12, "105", ControlCommand::speed(FanSpeed::Low)),
        (14, "101", ControlCommand::power(false)),
        (14, "103", ControlCommand::target(24.0)),
        (14, "103", ControlCommand::speed(FanSpeed::Low)),
        (15, "105", ControlCommand::target(20.0)),
        (15, "105", ControlCommand::speed(FanSpeed::High)),
        (16, "102", ControlCommand::power(false)),
        (18, "101", ControlCommand::power(true)),
        (19, "102", ControlCommand::power(true)),
        (22, "103", ControlCommand::power(false)),
        (23, "105", ControlCommand::power(false)),
        (24, "101", ControlCommand::power(false)),
        (25, "102", ControlCommand::power(false)),
        (25, "104", ControlCommand::power(false)),
    ];

    for minute in 0..=25u64 {
        for (at, room_id, cmd) in script {
            if *at == minute {
                hotel.control(room_id, *cmd).await.unwrap();
                assert_invariants(&hotel);
            }
        }
        for _ in 0..60 {
            hotel.step();
            assert_invariants(&hotel);
        }
    }

    // Everything was switched off by the end of the timeline.
    assert!(hotel.scheduler().service_entries().is_empty());
    assert!(hotel.scheduler().wait_entries().is_empty());
    for id in ["101", "102", "103", "104", "105"] {
        let room = hotel.room(id).unwrap();
        assert!(!room.power_on);
        assert!(room.total_fee > 0.0);
        assert!(room.stay_days > 0);
    }
}
