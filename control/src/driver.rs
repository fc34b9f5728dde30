//! The 1 Hz tick driver.
//!
//! Owns the plant's cadence: in real-time mode, one simulated second per
//! wall-clock second plus a periodic snapshot; in simulation mode the loop
//! idles and callers step the clock explicitly through `advance`. The
//! cadence is the driver's own property, not the embedding framework's.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::info;

use crate::config::PlantConfig;
use crate::error::ControlError;
use crate::hotel::Hotel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Realtime,
    Simulation,
}

enum DriverMsg {
    SetMode(Mode),
    Advance {
        steps: u32,
        done: oneshot::Sender<Result<(), ControlError>>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Cloneable handle used by the façade and the embedding process.
#[derive(Clone)]
pub struct DriverHandle {
    tx: mpsc::Sender<DriverMsg>,
}

impl DriverHandle {
    /// Suspend the real-time loop; the clock only moves via `advance`.
    pub async fn start_simulation(&self) {
        let _ = self.tx.send(DriverMsg::SetMode(Mode::Simulation)).await;
    }

    /// Resume the real-time loop.
    pub async fn stop_simulation(&self) {
        let _ = self.tx.send(DriverMsg::SetMode(Mode::Realtime)).await;
    }

    /// Run `steps` deterministic seconds synchronously. Only valid while
    /// the real-time loop is suspended; a stopped driver is equally
    /// unsteppable.
    pub async fn advance(&self, steps: u32) -> Result<(), ControlError> {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .tx
            .send(DriverMsg::Advance {
                steps,
                done: done_tx,
            })
            .await
            .is_err()
        {
            return Err(ControlError::NotInSimulation);
        }
        done_rx.await.unwrap_or(Err(ControlError::NotInSimulation))
    }

    /// Stop the loop after flushing final snapshots.
    pub async fn shutdown(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .tx
            .send(DriverMsg::Shutdown { done: done_tx })
            .await
            .is_ok()
        {
            let _ = done_rx.await;
        }
    }
}

pub struct Driver {
    hotel: Arc<Mutex<Hotel>>,
    rx: mpsc::Receiver<DriverMsg>,
    tick_interval: Duration,
    snapshot_every: u64,
}

impl Driver {
    pub fn new(hotel: Arc<Mutex<Hotel>>, cfg: &PlantConfig) -> (Self, DriverHandle) {
        let (tx, rx) = mpsc::channel(16);
        (
            Self {
                hotel,
                rx,
                tick_interval: cfg.tick_interval,
                snapshot_every: cfg.snapshot_every.max(1),
            },
            DriverHandle { tx },
        )
    }

    pub async fn run(mut self) {
        let mut mode = Mode::Realtime;
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut ticks_since_snapshot = 0u64;

        loop {
            tokio::select! {
                // Control messages win over the tick, so mode changes and
                // shutdown land before the next simulated second.
                biased;

                msg = self.rx.recv() => {
                    match msg {
                        Some(DriverMsg::SetMode(new_mode)) => {
                            if mode != new_mode {
                                info!(?new_mode, "driver mode changed");
                                interval.reset();
                            }
                            mode = new_mode;
                        }
                        Some(DriverMsg::Advance { steps, done }) => {
                            let result = if mode == Mode::Simulation {
                                let mut hotel = self.hotel.lock().await;
                                for _ in 0..steps {
                                    hotel.step();
                                }
                                Ok(())
                            } else {
                                Err(ControlError::NotInSimulation)
                            };
                            let _ = done.send(result);
                        }
                        Some(DriverMsg::Shutdown { done }) => {
                            let hotel = self.hotel.lock().await;
                            hotel.flush_snapshots().await;
                            let _ = done.send(());
                            info!("driver stopped");
                            return;
                        }
                        None => return,
                    }
                }
                _ = interval.tick(), if mode == Mode::Realtime => {
                    let mut hotel = self.hotel.lock().await;
                    hotel.step();

                    ticks_since_snapshot += 1;
                    if ticks_since_snapshot >= self.snapshot_every {
                        ticks_since_snapshot = 0;
                        hotel.flush_snapshots().await;
                    }
                }
            }
        }
    }
}
