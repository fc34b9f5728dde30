use std::time::Duration;

#[derive(Clone, Debug)]
pub struct PlantConfig {
    /// Database connection string.
    pub database_url: String,

    /// Rooms the central plant can serve at once.
    ///
    /// This is the only capacity in the system; everything beyond it
    /// queues in the wait set.
    pub service_slots: usize,

    /// Seconds a waiter holds before it may force a time-slice rotation.
    ///
    /// Equal-priority requests round-robin on this cadence; a shorter
    /// budget spreads service thinner, a longer one reduces churn.
    pub wait_budget: u32,

    /// Real-time ticks between periodic room-state snapshots.
    ///
    /// Only rooms that are powered on or have accrued fees are written,
    /// bounding write volume on an idle plant.
    pub snapshot_every: u64,

    /// Wall-clock length of one simulated second in real-time mode.
    pub tick_interval: Duration,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://hotel.db".to_string(),
            service_slots: 3,
            wait_budget: 120,
            snapshot_every: 5,
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl PlantConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = std::env::var("DATABASE_URL") {
            cfg.database_url = url;
        }
        cfg
    }
}
