//! VaultDeletionOrchestrator - vault 削除の手順を束ねる
//!
//! # 手順
//! 1. best_effort_precheck: 未完了のインベントリジョブがあれば待って消費
//! 2. delete_vault: 空でなければ Blocked（警告のみ）
//!
//! precheck の失敗はログに残して先へ進む（fail-open）。
//! 結果は `Precheck` として報告に残る。

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::client::GlacierClient;
use super::deleter::{BulkArchiveDeleter, DeleteSummary};
use super::waiter::{Consumption, JobWaiter};
use crate::classifier;
use crate::domain::{GlacierError, Job, JobId, VaultName};
use crate::ports::DeleteProgress;

const NOT_EMPTY_GUIDANCE: &str = "Glacier refreshes vault contents about once a day. \
    Wait 24 hours after deleting archives, or retrieve a new inventory and delete what it lists, then retry.";

/// What happened before the vault delete was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Precheck {
    NoPendingInventory,
    /// A pending inventory job finished and its archives went through the deleter.
    Consumed { job_id: JobId, summary: DeleteSummary },
    JobFailed(Job),
    Cancelled,
    /// The check itself failed; the vault delete is attempted anyway.
    Failed(String),
}

impl Precheck {
    pub fn summary(&self) -> Option<&DeleteSummary> {
        match self {
            Precheck::Consumed { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VaultDeletion {
    Deleted,
    Blocked { guidance: String },
    /// Cancelled before the vault delete was sent.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultDeletionReport {
    pub vault: VaultName,
    pub precheck: Precheck,
    pub disposition: VaultDeletion,
}

impl VaultDeletionReport {
    pub fn is_deleted(&self) -> bool {
        self.disposition == VaultDeletion::Deleted
    }
}

pub struct VaultDeletionOrchestrator {
    client: GlacierClient,
    deleter: Arc<BulkArchiveDeleter>,
    waiter: Arc<JobWaiter>,
}

impl VaultDeletionOrchestrator {
    pub fn new(
        client: GlacierClient,
        deleter: Arc<BulkArchiveDeleter>,
        waiter: Arc<JobWaiter>,
    ) -> Self {
        Self {
            client,
            deleter,
            waiter,
        }
    }

    /// Wait for and consume the first incomplete inventory job, if any.
    ///
    /// Never fails: errors become `Precheck::Failed`.
    pub async fn best_effort_precheck(
        &self,
        vault: &VaultName,
        progress: &dyn DeleteProgress,
        cancel: &CancellationToken,
    ) -> Precheck {
        let jobs = match self.client.list_jobs(vault).await {
            Ok(jobs) => jobs,
            Err(err) => {
                warn!(%vault, error = %err, "precheck failed, continuing with vault delete");
                return Precheck::Failed(err.to_string());
            }
        };

        let Some(pending) = classifier::find_first_incomplete_inventory(&jobs) else {
            return Precheck::NoPendingInventory;
        };
        info!(%vault, job_id = %pending.job_id, "inventory job pending, waiting before delete");

        match self
            .waiter
            .wait_and_consume(vault, &pending.job_id, progress, cancel)
            .await
        {
            Ok(Consumption::Consumed { job, summary }) => Precheck::Consumed {
                job_id: job.job_id,
                summary,
            },
            Ok(Consumption::JobFailed(job)) => Precheck::JobFailed(job),
            Ok(Consumption::Cancelled) => Precheck::Cancelled,
            Err(err) => {
                warn!(%vault, error = %err, "precheck failed, continuing with vault delete");
                Precheck::Failed(err.to_string())
            }
        }
    }

    /// Precheck, then delete the vault.
    ///
    /// `VaultNotEmpty` is reported as `Blocked`; any other delete error is returned.
    /// Cancellation during the precheck skips the delete; the report keeps
    /// whatever the precheck got done.
    pub async fn delete_vault(
        &self,
        vault: &VaultName,
        progress: &dyn DeleteProgress,
        cancel: &CancellationToken,
    ) -> Result<VaultDeletionReport, GlacierError> {
        let precheck = self.best_effort_precheck(vault, progress, cancel).await;
        if precheck == Precheck::Cancelled || cancel.is_cancelled() {
            if let Some(summary) = precheck.summary() {
                warn!(
                    %vault,
                    attempted = summary.attempted,
                    succeeded = summary.succeeded,
                    "cancelled, vault not deleted"
                );
            } else {
                warn!(%vault, "cancelled, vault not deleted");
            }
            return Ok(VaultDeletionReport {
                vault: vault.clone(),
                precheck,
                disposition: VaultDeletion::Cancelled,
            });
        }
        if let Some(summary) = precheck.summary()
            && summary.has_failures()
        {
            warn!(%vault, failed = summary.failed, "some archives were not deleted, trying the vault anyway");
        }

        let disposition = match self.client.delete_vault(vault).await {
            Ok(()) => {
                info!(%vault, "vault deleted");
                VaultDeletion::Deleted
            }
            Err(GlacierError::VaultNotEmpty { .. }) => {
                warn!(%vault, guidance = NOT_EMPTY_GUIDANCE, "vault not empty");
                VaultDeletion::Blocked {
                    guidance: NOT_EMPTY_GUIDANCE.to_string(),
                }
            }
            Err(err) => return Err(err),
        };

        Ok(VaultDeletionReport {
            vault: vault.clone(),
            precheck,
            disposition,
        })
    }

    /// Delete every archive listed by an already succeeded inventory job.
    pub async fn delete_inventory(
        &self,
        vault: &VaultName,
        job_id: &JobId,
        progress: &dyn DeleteProgress,
        cancel: &CancellationToken,
    ) -> Result<DeleteSummary, GlacierError> {
        let job = self.client.describe_job(vault, job_id).await?;
        self.deleter.delete_inventory(&job, progress, cancel).await
    }
}
