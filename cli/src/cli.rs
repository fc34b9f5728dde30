use clap::Parser;

use control::config::PlantConfig;

#[derive(Debug, Parser)]
#[clap(name = "ac-control", version)]
pub struct Cli {
    /// SQLite database holding check-ins, room states, and session logs.
    /// Overrides DATABASE_URL.
    #[clap(long)]
    pub database_url: Option<String>,

    /// Rooms the plant serves simultaneously
    #[clap(long, default_value_t = 3)]
    pub service_slots: usize,

    /// Seconds a waiter holds before it may force a rotation
    #[clap(long, default_value_t = 120)]
    pub wait_budget: u32,

    /// Emit logs as JSON instead of human-readable text
    #[clap(long)]
    pub json_logs: bool,
}

/// Fold CLI overrides on top of the env-derived defaults.
pub fn build_config(cli: &Cli) -> PlantConfig {
    let mut cfg = PlantConfig::from_env();
    if let Some(url) = &cli.database_url {
        cfg.database_url = url.clone();
    }
    cfg.service_slots = cli.service_slots;
    cfg.wait_budget = cli.wait_budget;
    cfg
}
