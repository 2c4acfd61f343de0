//! BulkArchiveDeleter - インベントリ内の全アーカイブを並列に削除
//!
//! # フロー
//! 1. archive id をキュー（`Mutex<VecDeque>`）に積む
//! 2. `min(max_parallelism, 件数)` 本のワーカーを起動
//! 3. 各ワーカーはキューから 1 件取り出して削除、結果を channel に送る
//! 4. 呼び出し側は完了順に結果を受け取り、進捗を通知する
//! 5. 全ワーカーを join してから summary を返す
//!
//! 1 件の失敗は記録するだけで、他のワーカーも一括処理全体も止めない。

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::client::GlacierClient;
use crate::domain::{ArchiveId, GlacierError, Job, VaultName};
use crate::ports::DeleteProgress;

/// A failed archive deletion, kept so callers can retry specific ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveFailure {
    pub archive_id: ArchiveId,
    pub message: String,
}

/// Result of one bulk delete.
///
/// `attempted == succeeded + failed`. Less than the input length only when
/// the run was cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ArchiveFailure>,
}

impl DeleteSummary {
    fn record(&mut self, deletion: &ArchiveDeletion) {
        self.attempted += 1;
        match &deletion.result {
            Ok(()) => self.succeeded += 1,
            Err(err) => {
                self.failed += 1;
                self.failures.push(ArchiveFailure {
                    archive_id: deletion.archive_id.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// One finished attempt, sent from a worker to the collector.
struct ArchiveDeletion {
    archive_id: ArchiveId,
    result: Result<(), GlacierError>,
}

pub struct BulkArchiveDeleter {
    client: GlacierClient,
    max_parallelism: usize,
}

impl BulkArchiveDeleter {
    pub fn new(client: GlacierClient, max_parallelism: usize) -> Self {
        Self {
            client,
            max_parallelism: max_parallelism.max(1),
        }
    }

    pub fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    /// Delete every archive in `archive_ids`.
    ///
    /// Never fails: per-archive errors end up in the summary. Once `cancel`
    /// fires, workers stop taking new ids; deletes already in flight finish.
    pub async fn delete_all_archives(
        &self,
        vault: &VaultName,
        archive_ids: Vec<ArchiveId>,
        progress: &dyn DeleteProgress,
        cancel: &CancellationToken,
    ) -> DeleteSummary {
        let total = archive_ids.len();
        let mut summary = DeleteSummary::default();
        if total == 0 {
            return summary;
        }

        let workers = self.max_parallelism.min(total);
        info!(%vault, total, workers, "deleting archives");

        let (tx, mut rx) = mpsc::channel(workers);
        let group = WorkerGroup::spawn(
            workers,
            Arc::new(vault.clone()),
            self.client.clone(),
            Arc::new(Mutex::new(VecDeque::from(archive_ids))),
            tx,
            cancel.clone(),
        );

        // Completion order, not submission order.
        while let Some(deletion) = rx.recv().await {
            summary.record(&deletion);
            progress.on_attempt(
                &deletion.archive_id,
                deletion.result.is_ok(),
                summary.attempted,
                total,
            );
        }

        group.join().await;
        progress.on_finish();

        if summary.has_failures() {
            warn!(
                %vault,
                attempted = summary.attempted,
                failed = summary.failed,
                "some archives could not be deleted"
            );
        } else {
            info!(%vault, deleted = summary.succeeded, "archives deleted");
        }
        if summary.attempted < total {
            warn!(%vault, skipped = total - summary.attempted, "bulk delete cancelled");
        }
        summary
    }
}

impl BulkArchiveDeleter {
    /// Download the inventory of a succeeded job and delete everything in it.
    pub async fn delete_inventory(
        &self,
        job: &Job,
        progress: &dyn DeleteProgress,
        cancel: &CancellationToken,
    ) -> Result<DeleteSummary, GlacierError> {
        let inventory = self.client.fetch_inventory(job).await?;
        info!(
            vault = %job.vault_name,
            job_id = %job.job_id,
            vault_arn = inventory.vault_arn.as_deref().unwrap_or("-"),
            inventory_date = inventory.inventory_date.as_deref().unwrap_or("-"),
            archives = inventory.len(),
            bytes = inventory.total_size(),
            "inventory downloaded"
        );
        Ok(self
            .delete_all_archives(&job.vault_name, inventory.archive_ids(), progress, cancel)
            .await)
    }
}

/// Worker group handle.
/// - 全ワーカーは同じキューと送信側 channel を共有する
/// - `join()` で全ワーカーの終了を待てる
struct WorkerGroup {
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    fn spawn(
        n: usize,
        vault: Arc<VaultName>,
        client: GlacierClient,
        queue: Arc<Mutex<VecDeque<ArchiveId>>>,
        tx: mpsc::Sender<ArchiveDeletion>,
        cancel: CancellationToken,
    ) -> Self {
        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let vault = Arc::clone(&vault);
            let client = client.clone();
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let cancel = cancel.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, vault, client, queue, tx, cancel).await;
            });
            joins.push(join);
        }
        // `tx` drops here; the channel closes once every worker is done.
        Self { joins }
    }

    async fn join(self) {
        for join in self.joins {
            if let Err(e) = join.await {
                error!(error = %e, "archive delete worker aborted");
            }
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    vault: Arc<VaultName>,
    client: GlacierClient,
    queue: Arc<Mutex<VecDeque<ArchiveId>>>,
    tx: mpsc::Sender<ArchiveDeletion>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }

        // ロックは pop の間だけ。削除の await を跨がない
        let Some(archive_id) = queue.lock().await.pop_front() else {
            break;
        };

        let result = client.delete_archive(&vault, &archive_id).await;
        if tx.send(ArchiveDeletion { archive_id, result }).await.is_err() {
            error!(worker_id, "result channel closed");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use super::*;
    use crate::domain::Vault;
    use crate::impls::{Call, InMemoryGlacier};
    use crate::ports::NoopProgress;
    use rstest::rstest;

    #[derive(Default)]
    struct RecordingProgress {
        seen: StdMutex<Vec<(usize, usize)>>,
        finished: StdMutex<usize>,
    }

    impl DeleteProgress for RecordingProgress {
        fn on_attempt(&self, _archive_id: &ArchiveId, _ok: bool, done: usize, total: usize) {
            self.seen.lock().unwrap().push((done, total));
        }

        fn on_finish(&self) {
            *self.finished.lock().unwrap() += 1;
        }
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("a-{i}")).collect()
    }

    fn archive_ids(n: usize) -> Vec<ArchiveId> {
        ids(n).into_iter().map(ArchiveId::new).collect()
    }

    fn glacier(n: usize) -> InMemoryGlacier {
        InMemoryGlacier::new()
            .with_vault(Vault::new("photos"))
            .with_inventory("photos", "job-1", ids(n))
    }

    fn setup(n: usize) -> (Arc<InMemoryGlacier>, Vec<ArchiveId>) {
        (Arc::new(glacier(n)), archive_ids(n))
    }

    #[rstest]
    #[case(1, 1)]
    #[case(25, 4)]
    #[case(40, 16)]
    #[tokio::test]
    async fn deletes_every_archive_once(#[case] n: usize, #[case] parallelism: usize) {
        let (glacier, archive_ids) = setup(n);
        let deleter = BulkArchiveDeleter::new(GlacierClient::new(glacier.clone()), parallelism);
        let progress = RecordingProgress::default();

        let summary = deleter
            .delete_all_archives(
                &VaultName::new("photos"),
                archive_ids,
                &progress,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(summary.attempted, n);
        assert_eq!(summary.succeeded + summary.failed, n);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            glacier.count_calls(|c| matches!(c, Call::DeleteArchive(_))).await,
            n
        );
        assert_eq!(glacier.remaining_archives("photos").await, 0);

        let seen = progress.seen.lock().unwrap().clone();
        let expected: Vec<(usize, usize)> = (1..=n).map(|done| (done, n)).collect();
        assert_eq!(seen, expected);
        assert_eq!(*progress.finished.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let (glacier, _) = setup(0);
        let deleter = BulkArchiveDeleter::new(GlacierClient::new(glacier.clone()), 8);
        let progress = RecordingProgress::default();

        let summary = deleter
            .delete_all_archives(
                &VaultName::new("photos"),
                Vec::new(),
                &progress,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(summary, DeleteSummary::default());
        assert!(glacier.calls().await.is_empty());
        assert!(progress.seen.lock().unwrap().is_empty());
    }

    #[rstest]
    #[case(7)]
    #[case(8)]
    #[tokio::test]
    async fn odd_index_failures_are_isolated(#[case] n: usize) {
        let mut scripted = glacier(n);
        for (i, id) in ids(n).into_iter().enumerate() {
            if i % 2 == 1 {
                scripted = scripted.failing_archive(id);
            }
        }
        let glacier = Arc::new(scripted);
        let deleter = BulkArchiveDeleter::new(GlacierClient::new(glacier.clone()), 3);

        let summary = deleter
            .delete_all_archives(
                &VaultName::new("photos"),
                archive_ids(n),
                &NoopProgress,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(summary.succeeded, n.div_ceil(2));
        assert_eq!(summary.failed, n / 2);
        assert_eq!(summary.failures.len(), n / 2);
        assert!(
            summary
                .failures
                .iter()
                .all(|f| f.message.contains("InvalidParameterValueException"))
        );
        assert_eq!(
            glacier.count_calls(|c| matches!(c, Call::DeleteArchive(_))).await,
            n
        );
    }

    #[tokio::test(start_paused = true)]
    async fn parallelism_is_bounded_by_config() {
        let glacier = Arc::new(glacier(12).with_archive_delay(Duration::from_millis(100)));
        let deleter = BulkArchiveDeleter::new(GlacierClient::new(glacier.clone()), 3);

        let summary = deleter
            .delete_all_archives(
                &VaultName::new("photos"),
                archive_ids(12),
                &NoopProgress,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(summary.succeeded, 12);
        assert_eq!(glacier.max_in_flight(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn parallelism_is_bounded_by_remaining_work() {
        let glacier = Arc::new(glacier(2).with_archive_delay(Duration::from_millis(100)));
        let deleter = BulkArchiveDeleter::new(GlacierClient::new(glacier.clone()), 16);

        deleter
            .delete_all_archives(
                &VaultName::new("photos"),
                archive_ids(2),
                &NoopProgress,
                &CancellationToken::new(),
            )
            .await;

        assert!(glacier.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn delete_inventory_consumes_job_output() {
        let (glacier, _) = setup(6);
        let client = GlacierClient::new(glacier.clone());
        let deleter = BulkArchiveDeleter::new(client.clone(), 4);

        let job = client.list_jobs(&VaultName::new("photos")).await.unwrap().remove(0);
        let summary = deleter
            .delete_inventory(&job, &NoopProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 6);
        assert_eq!(glacier.remaining_archives("photos").await, 0);
    }

    #[tokio::test]
    async fn delete_inventory_refuses_running_job() {
        let (glacier, _) = setup(3);
        let deleter = BulkArchiveDeleter::new(GlacierClient::new(glacier.clone()), 4);

        let err = deleter
            .delete_inventory(
                &Job::inventory("photos", "job-2"),
                &NoopProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GlacierError::InventoryNotReady { .. }));
        assert_eq!(glacier.remaining_archives("photos").await, 3);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_delete() {
        let (glacier, archive_ids) = setup(5);
        let deleter = BulkArchiveDeleter::new(GlacierClient::new(glacier.clone()), 2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = deleter
            .delete_all_archives(&VaultName::new("photos"), archive_ids, &NoopProgress, &cancel)
            .await;

        assert_eq!(summary.attempted, 0);
        assert!(glacier.calls().await.is_empty());
        assert_eq!(glacier.remaining_archives("photos").await, 5);
    }
}
