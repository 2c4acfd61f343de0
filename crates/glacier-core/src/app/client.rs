//! GlacierClient - サービスハンドル
//!
//! 合成ルート（AppBuilder）で 1 度だけ作り、各コンポーネントに注入します。
//! `Clone` は `Arc` の複製なので、削除ワーカー間で安全に共有できます。
//!
//! ここでの失敗はすべてログに残してから呼び出し元へ返します。

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::classifier;
use crate::domain::{ArchiveId, GlacierError, Inventory, Job, JobId, Vault, VaultName};
use crate::ports::GlacierService;

#[derive(Clone)]
pub struct GlacierClient {
    service: Arc<dyn GlacierService>,
}

impl GlacierClient {
    pub fn new(service: Arc<dyn GlacierService>) -> Self {
        Self { service }
    }

    pub async fn list_vaults(&self) -> Result<Vec<Vault>, GlacierError> {
        self.service.list_vaults().await.inspect_err(|err| {
            error!(error = %err, "failed to list vaults");
        })
    }

    pub async fn list_jobs(&self, vault: &VaultName) -> Result<Vec<Job>, GlacierError> {
        self.service.list_jobs(vault).await.inspect_err(|err| {
            error!(%vault, error = %err, "failed to list jobs");
        })
    }

    /// Start an inventory retrieval. Glacier usually needs several hours.
    pub async fn retrieve_inventory(&self, vault: &VaultName) -> Result<JobId, GlacierError> {
        match self.service.initiate_inventory_job(vault).await {
            Ok(job_id) => {
                info!(%vault, %job_id, "initiated inventory retrieval");
                Ok(job_id)
            }
            Err(err) => {
                error!(%vault, error = %err, "failed to initiate inventory retrieval");
                Err(err)
            }
        }
    }

    pub async fn describe_job(&self, vault: &VaultName, job_id: &JobId) -> Result<Job, GlacierError> {
        self.service.describe_job(vault, job_id).await.inspect_err(|err| {
            error!(%vault, %job_id, error = %err, "failed to describe job");
        })
    }

    /// Download and parse the inventory of a succeeded job.
    ///
    /// Refuses jobs that are not completed and succeeded.
    pub async fn fetch_inventory(&self, job: &Job) -> Result<Inventory, GlacierError> {
        if !classifier::is_succeeded(job) {
            return Err(GlacierError::InventoryNotReady {
                job_id: job.job_id.clone(),
                completed: job.completed,
                status: job.status,
            });
        }

        info!(vault = %job.vault_name, job_id = %job.job_id, "downloading inventory");
        let body = self
            .service
            .get_job_output(&job.vault_name, &job.job_id)
            .await
            .inspect_err(|err| {
                error!(job_id = %job.job_id, error = %err, "failed to get job output");
            })?;

        Inventory::from_slice(&body).inspect_err(|err| {
            error!(job_id = %job.job_id, error = %err, "inventory body is not valid");
        })
    }

    pub async fn delete_archive(
        &self,
        vault: &VaultName,
        archive_id: &ArchiveId,
    ) -> Result<(), GlacierError> {
        self.service
            .delete_archive(vault, archive_id)
            .await
            .inspect_err(|err| {
                debug!(%vault, %archive_id, error = %err, "failed to delete archive");
            })
    }

    /// `VaultNotEmpty` is returned as is and not logged here; the caller decides.
    pub async fn delete_vault(&self, vault: &VaultName) -> Result<(), GlacierError> {
        match self.service.delete_vault(vault).await {
            Ok(()) => {
                info!(%vault, "deleted vault");
                Ok(())
            }
            Err(err @ GlacierError::VaultNotEmpty { .. }) => Err(err),
            Err(err) => {
                error!(%vault, error = %err, "failed to delete vault");
                Err(err)
            }
        }
    }
}
