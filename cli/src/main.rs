mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;

use cli::{Cli, build_config};
use common::logger::{LogFormat, init_logger};
use control::driver::Driver;
use control::hotel::Hotel;
use store::HotelStore;
use store::sqlite::SqliteHotelStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logger("ac-control", format);

    let cfg = build_config(&args);

    tracing::info!(database_url = %cfg.database_url, "starting central AC control plane");

    let store: Arc<dyn HotelStore> = Arc::new(SqliteHotelStore::new(&cfg.database_url).await?);
    let hotel = Arc::new(Mutex::new(Hotel::restore(&cfg, store).await?));

    let (driver, handle) = Driver::new(hotel.clone(), &cfg);
    tokio::spawn(driver.run());

    tracing::info!(
        service_slots = cfg.service_slots,
        wait_budget = cfg.wait_budget,
        "plant running; waiting for shutdown signal"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    handle.shutdown().await;

    Ok(())
}
