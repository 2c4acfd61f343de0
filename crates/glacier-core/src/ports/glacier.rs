//! GlacierService port - リモートの Glacier サービス
//!
//! コアが必要とする操作だけを定義します（ワイヤ形式は実装側の責務）。
//!
//! # 実装
//! - **AwsGlacierService**: aws-sdk-glacier（本番用）
//! - **InMemoryGlacier**: テスト・デモ用

use async_trait::async_trait;

use crate::domain::{ArchiveId, GlacierError, Job, JobId, Vault, VaultName};

/// GlacierService は Glacier へのアクセスを抽象化
///
/// # Thread Safety
/// - `Send + Sync` を要求（削除ワーカーが同じハンドルを共有する）
#[async_trait]
pub trait GlacierService: Send + Sync {
    async fn list_vaults(&self) -> Result<Vec<Vault>, GlacierError>;

    /// Jobs in the order the service returns them.
    async fn list_jobs(&self, vault: &VaultName) -> Result<Vec<Job>, GlacierError>;

    /// Start an inventory-retrieval job (JSON format).
    async fn initiate_inventory_job(&self, vault: &VaultName) -> Result<JobId, GlacierError>;

    /// Raw output body of a finished job.
    async fn get_job_output(&self, vault: &VaultName, job_id: &JobId)
    -> Result<Vec<u8>, GlacierError>;

    async fn delete_archive(
        &self,
        vault: &VaultName,
        archive_id: &ArchiveId,
    ) -> Result<(), GlacierError>;

    /// Fails with `GlacierError::VaultNotEmpty` when Glacier still sees archives.
    async fn delete_vault(&self, vault: &VaultName) -> Result<(), GlacierError>;

    async fn describe_job(&self, vault: &VaultName, job_id: &JobId) -> Result<Job, GlacierError>;
}
