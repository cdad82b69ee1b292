//! # Keepalive
//!
//! Periodic heartbeat to the outgoing mesh. Failed sends prune dead links
//! through the normal dispatch path.

use super::dispatcher::DispatchReport;
use super::manager::ConnectionManager;
use crate::domain::{GossipError, HEARTBEAT};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Heartbeat timer.
pub struct Keepalive {
    manager: Arc<ConnectionManager>,
    period: Duration,
}

impl Keepalive {
    /// Heartbeat every `period`.
    pub fn new(manager: Arc<ConnectionManager>, period: Duration) -> Self {
        Self { manager, period }
    }

    /// Send one heartbeat.
    pub fn tick(&self) -> Result<DispatchReport, GossipError> {
        self.manager.broadcast_text(HEARTBEAT)
    }

    /// Heartbeat until `shutdown` fires. The first beat is one period in.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick() {
                        Ok(report) => debug!(delivered = report.delivered, pruned = report.pruned, "Heartbeat"),
                        Err(e) => warn!(error = %e, "Heartbeat not sent"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("Keepalive stopping");
                    return;
                }
            }
        }
    }
}
