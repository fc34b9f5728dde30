//! Driver-task behavior: mode switching, deterministic stepping, and the
//! shutdown flush.


use std::sync::Arc;

use tokio::sync::Mutex;

use control::command::{CheckInRequest, ControlCommand};
use control::config::PlantConfig;
use control::driver::Driver;
use control::error::ControlError;
use control::hotel::Hotel;
use mock_store::InMemoryStore;

async fn plant() -> (Arc<Mutex<Hotel>>, Arc<InMemoryStore>, PlantConfig) {
    let store = Arc::new(InMemoryStore::default());
    let cfg = PlantConfig::default();
    let hotel = Hotel::restore(&cfg, store.clone()).await.expect("restore");
    (Arc::new(Mutex::new(hotel)), store, cfg)
}

#[tokio::test]
async fn advance_is_rejected_in_realtime_mode() {
    let (hotel, _, cfg) = plant().await;
    let (driver, handle) = Driver::new(hotel, &cfg);
    tokio::spawn(driver.run());

    let err = handle.advance(10).await.unwrap_err();
    assert!(matches!(err, ControlError::NotInSimulation));
}

#[tokio::test]
async fn simulation_mode_steps_exactly_on_demand() {
    let (hotel, _, cfg) = plant().await;
    let (driver, handle) = Driver::new(hotel.clone(), &cfg);

    // Switch before the loop starts so no real-time tick sneaks in.
    handle.start_simulation().await;
    tokio::spawn(driver.run());

    handle.advance(60).await.unwrap();
    assert_eq!(hotel.lock().await.clock(), 60);

    handle.advance(45).await.unwrap();
    assert_eq!(hotel.lock().await.clock(), 105);
}

#[tokio::test]
async fn stop_simulation_resumes_realtime_gating() {
    let (hotel, _, cfg) = plant().await;
    let (driver, handle) = Driver::new(hotel, &cfg);

    handle.start_simulation().await;
    tokio::spawn(driver.run());

    handle.advance(5).await.unwrap();
    handle.stop_simulation().await;

    let err = handle.advance(5).await.unwrap_err();
    assert!(matches!(err, ControlError::NotInSimulation));
}

#[tokio::test]
async fn shutdown_flushes_outstanding_snapshots() {
    let (hotel, store, cfg) = plant().await;
    let (driver, handle) = Driver::new(hotel.clone(), &cfg);

    handle.start_simulation().await;
    tokio::spawn(driver.run());

    {
        let mut hotel = hotel.lock().await;
        hotel
            .check_in(CheckInRequest {
                room_id: "101".into(),
                tenant_id: "440301199001011234".into(),
                tenant_name: "Zhang Wei".into(),
                tenant_phone: None,
                stay_days: 0,
            })
            .await
            .unwrap();
        hotel
            .control("101", ControlCommand::power(true))
            .await
            .unwrap();
    }
    handle.advance(30).await.unwrap();

    handle.shutdown().await;

    let states = store.room_states.lock().await;
    let row = &states["101"];
    assert!(row.power_on);
    assert_eq!(row.duration, 30);

    // The loop is gone; further stepping is refused.
    drop(states);
    let err = handle.advance(1).await.unwrap_err();
    assert!(matches!(err, ControlError::NotInSimulation));
}
