//! Background reload checks.
//!
//! # Responsibilities
//! - Run the supervisor's check on a fixed tick, off the request path
//!
//! # Design Decisions
//! - The tick is finer than the check interval; the supervisor's time gate still decides
//!   when the source is actually probed
//! - Stops on the shutdown broadcast

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::reload::{CheckOutcome, ReloadSupervisor};

/// Tick used to drive the supervisor.
pub const POLL_TICK: Duration = Duration::from_secs(1);

pub struct ReloadPoller {
    supervisor: Arc<ReloadSupervisor>,
    tick: Duration,
}

impl ReloadPoller {
    pub fn new(supervisor: Arc<ReloadSupervisor>) -> Self {
        Self::with_tick(supervisor, POLL_TICK)
    }

    pub fn with_tick(supervisor: Arc<ReloadSupervisor>, tick: Duration) -> Self {
        Self { supervisor, tick }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.supervisor.reload_enabled() {
            tracing::info!("Configuration reload disabled");
            return;
        }

        tracing::info!(tick_ms = self.tick.as_millis() as u64, "Reload poller starting");
        let mut ticker = time::interval(self.tick);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let supervisor = self.supervisor.clone();
                    // Loading reads the file; keep it off the async workers.
                    match tokio::task::spawn_blocking(move || supervisor.check()).await {
                        Ok(CheckOutcome::Reloaded { generation, rules }) => {
                            tracing::debug!(generation, rules, "Background reload applied");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "Reload check task failed"),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reload poller received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
