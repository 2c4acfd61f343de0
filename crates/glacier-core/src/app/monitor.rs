//! FleetMonitor - 全 vault の未完了インベントリジョブを監視
//!
//! # 動作
//! 1. 最初のスナップショットを取る（空ならすぐ返す）
//! 2. `poll_interval` だけ待ってスナップショットを取り直す
//! 3. 集合として比較し、違いが出たら新しいスナップショットを返す
//!
//! 比較には status message などの揮発しやすいフィールドも含める。
//! そのため完了以外の変化でもループは終わる。

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::GlacierClient;
use crate::classifier;
use crate::domain::{GlacierError, Job, JobAction, JobId, JobStatus, VaultName};

/// Watched projection of an incomplete inventory job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WatchedJob {
    pub vault_name: VaultName,
    pub job_id: JobId,
    pub action: JobAction,
    pub status: JobStatus,
    pub status_message: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
}

impl From<&Job> for WatchedJob {
    fn from(job: &Job) -> Self {
        Self {
            vault_name: job.vault_name.clone(),
            job_id: job.job_id.clone(),
            action: job.action.clone(),
            status: job.status,
            status_message: job.status_message.clone(),
            creation_date: job.creation_date,
        }
    }
}

/// Every incomplete inventory job across the account, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetSnapshot {
    pub jobs: Vec<WatchedJob>,
}

impl FleetSnapshot {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Order-insensitive comparison.
    pub fn same_jobs(&self, other: &FleetSnapshot) -> bool {
        let ours: HashSet<&WatchedJob> = self.jobs.iter().collect();
        let theirs: HashSet<&WatchedJob> = other.jobs.iter().collect();
        ours == theirs
    }

    fn for_vault<'a>(&'a self, vault: &'a VaultName) -> impl Iterator<Item = &'a WatchedJob> {
        self.jobs.iter().filter(move |job| &job.vault_name == vault)
    }
}

/// Why `watch` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorStop {
    /// The first snapshot had no incomplete inventory job.
    NothingToWatch,
    Changed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorReport {
    /// Snapshot that ended the watch (the last one taken when cancelled).
    pub snapshot: FleetSnapshot,
    pub stop: MonitorStop,
    /// Number of snapshots taken, the first one included.
    pub polls: u32,
}

pub struct FleetMonitor {
    client: GlacierClient,
    poll_interval: Duration,
}

impl FleetMonitor {
    pub fn new(client: GlacierClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Take one snapshot.
    ///
    /// A vault whose jobs cannot be listed keeps its entries from `previous`
    /// so a transient error is not a change. Without `previous` there is no
    /// baseline and the error is returned, as is a failure to list vaults.
    pub async fn take_snapshot(
        &self,
        previous: Option<&FleetSnapshot>,
    ) -> Result<FleetSnapshot, GlacierError> {
        let vaults = self.client.list_vaults().await?;
        let mut jobs = Vec::new();

        for vault in &vaults {
            match self.client.list_jobs(&vault.name).await {
                Ok(listed) => jobs.extend(
                    listed
                        .iter()
                        .filter(|job| classifier::is_incomplete_inventory(job))
                        .map(|job| {
                            let mut watched = WatchedJob::from(job);
                            watched.vault_name = vault.name.clone();
                            watched
                        }),
                ),
                Err(err) => {
                    // 基準がないと「変化なし」を判定できない
                    let Some(previous) = previous else {
                        return Err(err);
                    };
                    warn!(vault = %vault.name, error = %err, "skipping vault for this poll");
                    jobs.extend(previous.for_vault(&vault.name).cloned());
                }
            }
        }

        Ok(FleetSnapshot { jobs })
    }

    /// Poll until the set of incomplete inventory jobs changes.
    pub async fn watch(&self, cancel: &CancellationToken) -> Result<MonitorReport, GlacierError> {
        let mut current = self.take_snapshot(None).await?;
        let mut polls: u32 = 1;

        if current.is_empty() {
            info!("no inventory jobs in progress");
            return Ok(MonitorReport {
                snapshot: current,
                stop: MonitorStop::NothingToWatch,
                polls,
            });
        }
        info!(jobs = current.len(), "watching inventory jobs");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(polls, "fleet monitor cancelled");
                    return Ok(MonitorReport {
                        snapshot: current,
                        stop: MonitorStop::Cancelled,
                        polls,
                    });
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let next = self.take_snapshot(Some(&current)).await?;
            polls += 1;

            if !next.same_jobs(&current) {
                info!(polls, jobs = next.len(), "inventory jobs changed");
                return Ok(MonitorReport {
                    snapshot: next,
                    stop: MonitorStop::Changed,
                    polls,
                });
            }
            debug!(polls, "no change");
            current = next;
        }
    }
}
