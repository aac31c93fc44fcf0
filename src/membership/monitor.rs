//! Liveness Monitor
//!
//! Demotes nodes that have gone quiet. Promotion never happens here: only
//! the listener marks a node Online, on receipt of its announcement.
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config_error;
use crate::directory::{join_file_list, Directory};
use crate::error::Result;
use crate::node::NodeId;

pub const DEFAULT_LIVENESS_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 5;

#[derive(Clone, Debug)]
pub struct LivenessMonitor {
    node_id: NodeId,
    directory: Directory,
    timeout: chrono::Duration,
    interval: Duration,
}

impl LivenessMonitor {
    pub fn new(
        node_id: NodeId,
        directory: Directory,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Self> {
        let timeout = chrono::Duration::from_std(timeout)
            .map_err(|e| config_error!("Liveness timeout out of range: {}", e))?;
        if interval.is_zero() {
            return Err(config_error!("Monitor interval must be positive"));
        }
        Ok(Self {
            node_id,
            directory,
            timeout,
            interval,
        })
    }

    /// One scan of the directory as of `now`; returns nodes that went Offline
    pub fn pass(&self, now: DateTime<Utc>) -> Vec<NodeId> {
        let demoted = self.directory.demote_stale(self.node_id, now, self.timeout);
        for node_id in &demoted {
            info!(
                "[Node<{}>] Node {} timed out after {}s of silence, now Offline",
                self.node_id,
                node_id,
                self.timeout.num_seconds()
            );
        }
        demoted
    }

    fn report(&self) {
        let view: Vec<String> = self
            .directory
            .snapshot()
            .iter()
            .map(|record| {
                format!(
                    "{}={}[{}]",
                    record.id,
                    record.status,
                    join_file_list(&record.files)
                )
            })
            .collect();
        info!("[Node<{}>] Membership: {}", self.node_id, view.join(" "));
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            "[Node<{}>] Liveness monitor started: {}s timeout, {}s interval",
            self.node_id,
            self.timeout.num_seconds(),
            self.interval.as_secs()
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.pass(Utc::now());
                    self.report();
                }
            }
        }
        info!("[Node<{}>] Liveness monitor stopped", self.node_id);
    }
}
