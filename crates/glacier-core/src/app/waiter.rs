//! JobWaiter - 1 つのジョブが終わるまでポーリング
//!
//! # 状態遷移
//! - Polling -> Succeeded | Failed | Error | Cancelled
//!
//! InProgress の間は `poll_interval` だけ sleep して再取得する。
//! sleep はキャンセルと競合させる（ビジーループはしない）。

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::GlacierClient;
use super::deleter::{BulkArchiveDeleter, DeleteSummary};
use crate::classifier;
use crate::domain::{GlacierError, Job, JobId, JobStatus, VaultName};
use crate::ports::DeleteProgress;

/// Terminal state of a wait. Transport errors come back as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Succeeded(Job),
    Failed(Job),
    Cancelled,
}

/// Result of `wait_and_consume`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumption {
    /// The job succeeded and its inventory went through the bulk deleter.
    Consumed { job: Job, summary: DeleteSummary },
    /// The job failed; nothing was deleted.
    JobFailed(Job),
    Cancelled,
}

pub struct JobWaiter {
    client: GlacierClient,
    deleter: Arc<BulkArchiveDeleter>,
    poll_interval: Duration,
}

impl JobWaiter {
    pub fn new(
        client: GlacierClient,
        deleter: Arc<BulkArchiveDeleter>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            deleter,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `describe_job` until the job leaves `InProgress`.
    pub async fn wait_for_job(
        &self,
        vault: &VaultName,
        job_id: &JobId,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, GlacierError> {
        let mut polls: u32 = 0;
        loop {
            let job = self.client.describe_job(vault, job_id).await?;
            polls += 1;

            if classifier::is_succeeded(&job) {
                info!(%vault, %job_id, polls, "job succeeded");
                return Ok(WaitOutcome::Succeeded(job));
            }
            if job.status == JobStatus::Failed {
                warn!(
                    %vault,
                    %job_id,
                    polls,
                    message = job.status_message.as_deref().unwrap_or(""),
                    "job failed"
                );
                return Ok(WaitOutcome::Failed(job));
            }

            debug!(%vault, %job_id, polls, "job still in progress");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(%vault, %job_id, polls, "stopped waiting for job");
                    return Ok(WaitOutcome::Cancelled);
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Wait for the job, then feed a successful inventory to the bulk deleter.
    ///
    /// A failed job or a polling error never triggers deletion.
    pub async fn wait_and_consume(
        &self,
        vault: &VaultName,
        job_id: &JobId,
        progress: &dyn DeleteProgress,
        cancel: &CancellationToken,
    ) -> Result<Consumption, GlacierError> {
        info!(%vault, %job_id, interval_secs = self.poll_interval.as_secs(), "waiting for inventory job");
        match self.wait_for_job(vault, job_id, cancel).await? {
            WaitOutcome::Succeeded(job) => {
                let summary = self.deleter.delete_inventory(&job, progress, cancel).await?;
                Ok(Consumption::Consumed { job, summary })
            }
            WaitOutcome::Failed(job) => Ok(Consumption::JobFailed(job)),
            WaitOutcome::Cancelled => Ok(Consumption::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Vault;
    use crate::impls::{Call, InMemoryGlacier};
    use crate::ports::NoopProgress;
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn waiter(glacier: &Arc<InMemoryGlacier>) -> JobWaiter {
        let client = GlacierClient::new(glacier.clone());
        let deleter = Arc::new(BulkArchiveDeleter::new(client.clone(), 4));
        JobWaiter::new(client, deleter, INTERVAL)
    }

    fn running() -> Job {
        Job::inventory("photos", "job-1")
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_succeeded_then_consumes_once() {
        let glacier = Arc::new(
            InMemoryGlacier::new()
                .with_vault(Vault::new("photos"))
                .with_inventory("photos", "job-1", ["a-1", "a-2", "a-3"])
                .with_job_states(
                    "job-1",
                    [Ok(running()), Ok(running()), Ok(running().succeeded(300))],
                ),
        );
        let waiter = waiter(&glacier);
        let start = Instant::now();

        let outcome = waiter
            .wait_and_consume(
                &VaultName::new("photos"),
                &JobId::new("job-1"),
                &NoopProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(start.elapsed() >= INTERVAL * 2);
        assert_eq!(
            glacier.count_calls(|c| matches!(c, Call::DescribeJob(_))).await,
            3
        );
        assert_eq!(
            glacier.count_calls(|c| matches!(c, Call::GetJobOutput(_))).await,
            1
        );
        match outcome {
            Consumption::Consumed { summary, .. } => assert_eq!(summary.succeeded, 3),
            other => panic!("expected Consumed, got {other:?}"),
        }
        assert_eq!(glacier.remaining_archives("photos").await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_never_consumes() {
        let glacier = Arc::new(
            InMemoryGlacier::new()
                .with_vault(Vault::new("photos"))
                .with_inventory("photos", "job-1", ["a-1"])
                .with_job_states("job-1", [Ok(running()), Ok(running().failed("expired"))]),
        );
        let waiter = waiter(&glacier);

        let outcome = waiter
            .wait_and_consume(
                &VaultName::new("photos"),
                &JobId::new("job-1"),
                &NoopProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, Consumption::JobFailed(_)));
        assert_eq!(
            glacier.count_calls(|c| matches!(c, Call::GetJobOutput(_) | Call::DeleteArchive(_))).await,
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn polling_error_stops_without_consuming() {
        let glacier = Arc::new(
            InMemoryGlacier::new()
                .with_vault(Vault::new("photos"))
                .with_inventory("photos", "job-1", ["a-1"])
                .with_job_states(
                    "job-1",
                    [Ok(running()), Err("ServiceUnavailableException".to_string())],
                ),
        );
        let waiter = waiter(&glacier);

        let err = waiter
            .wait_and_consume(
                &VaultName::new("photos"),
                &JobId::new("job-1"),
                &NoopProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GlacierError::Service { operation: "DescribeJob", .. }));
        assert_eq!(glacier.remaining_archives("photos").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_sleep() {
        let glacier = Arc::new(InMemoryGlacier::new().with_job_states("job-1", [Ok(running())]));
        let waiter = waiter(&glacier);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(150)).await;
            trigger.cancel();
        });

        let outcome = waiter
            .wait_for_job(&VaultName::new("photos"), &JobId::new("job-1"), &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Cancelled);
        // polls at t=0, 60, 120; cancelled during the third sleep
        assert_eq!(
            glacier.count_calls(|c| matches!(c, Call::DescribeJob(_))).await,
            3
        );
    }

    #[tokio::test]
    async fn already_finished_job_returns_without_sleeping() {
        let glacier = Arc::new(
            InMemoryGlacier::new().with_job_states("job-1", [Ok(running().succeeded(1))]),
        );
        let waiter = waiter(&glacier);

        let outcome = waiter
            .wait_for_job(
                &VaultName::new("photos"),
                &JobId::new("job-1"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, WaitOutcome::Succeeded(_)));
    }
}
