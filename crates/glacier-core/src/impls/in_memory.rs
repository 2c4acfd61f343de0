//! InMemoryGlacier - テスト・デモ用の Glacier
//!
//! # 学習ポイント
//! - 状態は `tokio::sync::Mutex` 1 つに集約（await を跨いでロックしない）
//! - 呼び出し履歴（`Call`）を記録してテストから検証できる
//! - ジョブ状態のシーケンスを台本（script）として再生できる

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::domain::{ArchiveId, GlacierError, Job, JobId, Vault, VaultName};
use crate::ports::GlacierService;

/// One recorded call against the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListVaults,
    ListJobs(VaultName),
    InitiateInventoryJob(VaultName),
    GetJobOutput(JobId),
    DeleteArchive(ArchiveId),
    DeleteVault(VaultName),
    DescribeJob(JobId),
}

/// A scripted answer. `Err` carries the service error message.
pub type Scripted<T> = Result<T, String>;

#[derive(Default)]
struct State {
    vaults: Vec<Vault>,
    jobs: HashMap<VaultName, Vec<Job>>,
    archives: HashMap<VaultName, HashSet<ArchiveId>>,
    outputs: HashMap<JobId, Vec<u8>>,

    /// Successive answers for `list_jobs`; the last one repeats.
    job_listings: HashMap<VaultName, VecDeque<Scripted<Vec<Job>>>>,

    /// Successive answers for `describe_job`; the last one repeats.
    job_states: HashMap<JobId, VecDeque<Scripted<Job>>>,

    failing_archives: HashSet<ArchiveId>,
    failing_operations: HashMap<&'static str, String>,
    calls: Vec<Call>,
}

impl State {
    fn record(&mut self, call: Call) {
        self.calls.push(call);
    }

    fn check(&self, operation: &'static str) -> Result<(), GlacierError> {
        match self.failing_operations.get(operation) {
            Some(message) => Err(GlacierError::service(operation, message)),
            None => Ok(()),
        }
    }
}

fn next_scripted<T: Clone>(script: &mut VecDeque<Scripted<T>>) -> Option<Scripted<T>> {
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

/// In-process Glacier used by tests and `--demo`.
///
/// ```ignore
/// let glacier = InMemoryGlacier::new()
///     .with_vault(Vault::new("photos"))
///     .with_inventory("photos", "job-1", ["a-1", "a-2"]);
/// ```
#[derive(Default)]
pub struct InMemoryGlacier {
    state: Mutex<State>,
    archive_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryGlacier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vault(mut self, vault: Vault) -> Self {
        let state = self.state.get_mut();
        state.archives.entry(vault.name.clone()).or_default();
        state.vaults.push(vault);
        self
    }

    /// Append a job to the vault's static listing.
    pub fn with_job(mut self, job: Job) -> Self {
        let state = self.state.get_mut();
        state.jobs.entry(job.vault_name.clone()).or_default().push(job);
        self
    }

    /// Register archives and a succeeded inventory job listing them.
    pub fn with_inventory<I, A>(mut self, vault: &str, job_id: &str, archive_ids: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ArchiveId>,
    {
        let vault = VaultName::new(vault);
        let job_id = JobId::new(job_id);
        let archive_ids: Vec<ArchiveId> = archive_ids.into_iter().map(Into::into).collect();

        let entries: Vec<serde_json::Value> = archive_ids
            .iter()
            .map(|id| serde_json::json!({ "ArchiveId": id, "Size": 1024 }))
            .collect();
        let body = serde_json::json!({
            "VaultARN": format!("arn:aws:glacier:local:000000000000:vaults/{vault}"),
            "InventoryDate": "2024-01-01T00:00:00Z",
            "ArchiveList": entries,
        });

        let state = self.state.get_mut();
        state
            .archives
            .entry(vault.clone())
            .or_default()
            .extend(archive_ids.iter().cloned());
        state.outputs.insert(job_id.clone(), body.to_string().into_bytes());
        let size = state.outputs[&job_id].len() as u64;
        state
            .jobs
            .entry(vault.clone())
            .or_default()
            .push(Job::inventory(vault, job_id).succeeded(size));
        self
    }

    /// Raw output body for a job (e.g. a malformed inventory).
    pub fn with_job_output(mut self, job_id: &str, body: impl Into<Vec<u8>>) -> Self {
        self.state
            .get_mut()
            .outputs
            .insert(JobId::new(job_id), body.into());
        self
    }

    /// Script successive `describe_job` answers. The last one repeats forever.
    pub fn with_job_states<I>(mut self, job_id: &str, states: I) -> Self
    where
        I: IntoIterator<Item = Scripted<Job>>,
    {
        self.state
            .get_mut()
            .job_states
            .insert(JobId::new(job_id), states.into_iter().collect());
        self
    }

    /// Script successive `list_jobs` answers for a vault. The last one repeats forever.
    pub fn with_job_listings<I>(mut self, vault: &str, listings: I) -> Self
    where
        I: IntoIterator<Item = Scripted<Vec<Job>>>,
    {
        self.state
            .get_mut()
            .job_listings
            .insert(VaultName::new(vault), listings.into_iter().collect());
        self
    }

    /// Deleting this archive fails with a service error.
    pub fn failing_archive(mut self, archive_id: impl Into<ArchiveId>) -> Self {
        self.state
            .get_mut()
            .failing_archives
            .insert(archive_id.into());
        self
    }

    /// Every call to `operation` (e.g. `"ListJobs"`) fails with `message`.
    pub fn failing_operation(mut self, operation: &'static str, message: &str) -> Self {
        self.state
            .get_mut()
            .failing_operations
            .insert(operation, message.to_string());
        self
    }

    /// Each `delete_archive` sleeps this long before answering.
    pub fn with_archive_delay(mut self, delay: Duration) -> Self {
        self.archive_delay = delay;
        self
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    pub async fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().await.calls.iter().filter(|&c| pred(c)).count()
    }

    /// Archives still stored in a vault.
    pub async fn remaining_archives(&self, vault: &str) -> usize {
        self.state
            .lock()
            .await
            .archives
            .get(&VaultName::new(vault))
            .map_or(0, HashSet::len)
    }

    /// Highest number of concurrent `delete_archive` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GlacierService for InMemoryGlacier {
    async fn list_vaults(&self) -> Result<Vec<Vault>, GlacierError> {
        let mut state = self.state.lock().await;
        state.record(Call::ListVaults);
        state.check("ListVaults")?;
        Ok(state.vaults.clone())
    }

    async fn list_jobs(&self, vault: &VaultName) -> Result<Vec<Job>, GlacierError> {
        let mut state = self.state.lock().await;
        state.record(Call::ListJobs(vault.clone()));
        state.check("ListJobs")?;

        if let Some(script) = state.job_listings.get_mut(vault)
            && let Some(answer) = next_scripted(script)
        {
            return answer.map_err(|message| GlacierError::service("ListJobs", message));
        }

        if !state.vaults.iter().any(|v| &v.name == vault) {
            return Err(GlacierError::service(
                "ListJobs",
                format!("ResourceNotFoundException: vault {vault} does not exist"),
            ));
        }
        Ok(state.jobs.get(vault).cloned().unwrap_or_default())
    }

    async fn initiate_inventory_job(&self, vault: &VaultName) -> Result<JobId, GlacierError> {
        let mut state = self.state.lock().await;
        state.record(Call::InitiateInventoryJob(vault.clone()));
        state.check("InitiateJob")?;

        let job_id = JobId::new(Ulid::new().to_string());
        let job = Job::inventory(vault.clone(), job_id.clone()).with_creation_date(chrono::Utc::now());
        state.jobs.entry(vault.clone()).or_default().push(job);
        Ok(job_id)
    }

    async fn get_job_output(
        &self,
        _vault: &VaultName,
        job_id: &JobId,
    ) -> Result<Vec<u8>, GlacierError> {
        let mut state = self.state.lock().await;
        state.record(Call::GetJobOutput(job_id.clone()));
        state.check("GetJobOutput")?;

        state.outputs.get(job_id).cloned().ok_or_else(|| {
            GlacierError::service(
                "GetJobOutput",
                format!("ResourceNotFoundException: {} {job_id} has no output", job_id.kind()),
            )
        })
    }

    async fn delete_archive(
        &self,
        vault: &VaultName,
        archive_id: &ArchiveId,
    ) -> Result<(), GlacierError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.archive_delay.is_zero() {
            tokio::time::sleep(self.archive_delay).await;
        }

        let result = {
            let mut state = self.state.lock().await;
            state.record(Call::DeleteArchive(archive_id.clone()));
            if let Err(err) = state.check("DeleteArchive") {
                Err(err)
            } else if state.failing_archives.contains(archive_id) {
                Err(GlacierError::service(
                    "DeleteArchive",
                    format!("InvalidParameterValueException: archive {archive_id} refused"),
                ))
            } else {
                let removed = state
                    .archives
                    .get_mut(vault)
                    .is_some_and(|archives| archives.remove(archive_id));
                if removed {
                    Ok(())
                } else {
                    Err(GlacierError::service(
                        "DeleteArchive",
                        format!("ResourceNotFoundException: {} {archive_id} not found", archive_id.kind()),
                    ))
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn delete_vault(&self, vault: &VaultName) -> Result<(), GlacierError> {
        let mut state = self.state.lock().await;
        state.record(Call::DeleteVault(vault.clone()));
        state.check("DeleteVault")?;

        if state.archives.get(vault).is_some_and(|a| !a.is_empty()) {
            return Err(GlacierError::VaultNotEmpty {
                vault: vault.clone(),
            });
        }
        let before = state.vaults.len();
        state.vaults.retain(|v| &v.name != vault);
        if state.vaults.len() == before {
            return Err(GlacierError::service(
                "DeleteVault",
                format!("ResourceNotFoundException: vault {vault} does not exist"),
            ));
        }
        state.jobs.remove(vault);
        state.archives.remove(vault);
        Ok(())
    }

    async fn describe_job(&self, vault: &VaultName, job_id: &JobId) -> Result<Job, GlacierError> {
        let mut state = self.state.lock().await;
        state.record(Call::DescribeJob(job_id.clone()));
        state.check("DescribeJob")?;

        if let Some(script) = state.job_states.get_mut(job_id)
            && let Some(answer) = next_scripted(script)
        {
            return answer.map_err(|message| GlacierError::service("DescribeJob", message));
        }

        state
            .jobs
            .get(vault)
            .and_then(|jobs| jobs.iter().find(|j| &j.job_id == job_id))
            .cloned()
            .ok_or_else(|| {
                GlacierError::service(
                    "DescribeJob",
                    format!("ResourceNotFoundException: {} {job_id} not found", job_id.kind()),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_vault_refuses_while_archives_remain() {
        let glacier = InMemoryGlacier::new()
            .with_vault(Vault::new("photos"))
            .with_inventory("photos", "job-1", ["a-1"]);
        let vault = VaultName::new("photos");

        let err = glacier.delete_vault(&vault).await.unwrap_err();
        assert!(matches!(err, GlacierError::VaultNotEmpty { .. }));

        glacier
            .delete_archive(&vault, &ArchiveId::new("a-1"))
            .await
            .unwrap();
        glacier.delete_vault(&vault).await.unwrap();
        assert!(glacier.list_vaults().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let glacier = InMemoryGlacier::new()
            .with_vault(Vault::new("photos"))
            .with_inventory("photos", "job-1", ["a-1"]);
        let vault = VaultName::new("photos");
        let archive = ArchiveId::new("a-1");

        glacier.delete_archive(&vault, &archive).await.unwrap();
        let err = glacier.delete_archive(&vault, &archive).await.unwrap_err();
        assert!(err.to_string().contains("ResourceNotFoundException"));
    }

    #[tokio::test]
    async fn scripted_states_replay_and_last_repeats() {
        let job = Job::inventory("photos", "job-1");
        let glacier = InMemoryGlacier::new().with_job_states(
            "job-1",
            [Ok(job.clone()), Ok(job.clone().succeeded(10))],
        );
        let vault = VaultName::new("photos");
        let id = JobId::new("job-1");

        assert!(!glacier.describe_job(&vault, &id).await.unwrap().completed);
        assert!(glacier.describe_job(&vault, &id).await.unwrap().completed);
        assert!(glacier.describe_job(&vault, &id).await.unwrap().completed);
        assert_eq!(glacier.count_calls(|c| matches!(c, Call::DescribeJob(_))).await, 3);
    }

    #[tokio::test]
    async fn initiated_jobs_show_up_in_listing() {
        let glacier = InMemoryGlacier::new().with_vault(Vault::new("photos"));
        let vault = VaultName::new("photos");

        let job_id = glacier.initiate_inventory_job(&vault).await.unwrap();
        let jobs = glacier.list_jobs(&vault).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, job_id);
        assert!(!jobs[0].completed);
    }

    #[tokio::test]
    async fn failing_operation_applies_to_every_call() {
        let glacier = InMemoryGlacier::new()
            .with_vault(Vault::new("photos"))
            .failing_operation("ListVaults", "throttled");

        let err = glacier.list_vaults().await.unwrap_err();
        assert_eq!(err.to_string(), "ListVaults failed: throttled");
    }
}
