//! Job record as reported by `ListJobs` / `DescribeJob`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{JobId, VaultName};

/// What a job does.
///
/// Only inventory retrieval is interpreted; everything else passes through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobAction {
    InventoryRetrieval,
    Other(String),
}

impl JobAction {
    pub fn from_code(code: &str) -> Self {
        match code {
            "InventoryRetrieval" => JobAction::InventoryRetrieval,
            other => JobAction::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobAction::InventoryRetrieval => "InventoryRetrieval",
            JobAction::Other(code) => code,
        }
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job status code.
///
/// State transitions:
/// - InProgress -> Succeeded
/// - InProgress -> Failed
///
/// Never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "InProgress" => Some(JobStatus::InProgress),
            "Succeeded" => Some(JobStatus::Succeeded),
            "Failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::InProgress => "InProgress",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read projection of a Glacier job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub vault_name: VaultName,
    pub action: JobAction,
    pub completed: bool,
    pub status: JobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    pub creation_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,

    /// Only present once an inventory job has succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_size_in_bytes: Option<u64>,
}

impl Job {
    /// A freshly initiated inventory-retrieval job.
    pub fn inventory(vault_name: impl Into<VaultName>, job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            vault_name: vault_name.into(),
            action: JobAction::InventoryRetrieval,
            completed: false,
            status: JobStatus::InProgress,
            status_message: None,
            creation_date: None,
            completion_date: None,
            inventory_size_in_bytes: None,
        }
    }

    pub fn with_action(mut self, action: JobAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_creation_date(mut self, creation_date: DateTime<Utc>) -> Self {
        self.creation_date = Some(creation_date);
        self
    }

    /// Same job, moved to `Succeeded`.
    pub fn succeeded(mut self, inventory_size_in_bytes: u64) -> Self {
        self.completed = true;
        self.status = JobStatus::Succeeded;
        self.status_message = Some("Succeeded".to_string());
        self.inventory_size_in_bytes = Some(inventory_size_in_bytes);
        self
    }

    /// Same job, moved to `Failed`.
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.completed = true;
        self.status = JobStatus::Failed;
        self.status_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("InventoryRetrieval", JobAction::InventoryRetrieval)]
    #[case("ArchiveRetrieval", JobAction::Other("ArchiveRetrieval".to_string()))]
    #[case("Select", JobAction::Other("Select".to_string()))]
    fn action_codes_map(#[case] code: &str, #[case] expected: JobAction) {
        let action = JobAction::from_code(code);
        assert_eq!(action, expected);
        assert_eq!(action.as_str(), code);
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        assert_eq!(JobStatus::from_code("Succeeded"), Some(JobStatus::Succeeded));
        assert_eq!(JobStatus::from_code("Exploded"), None);
    }

    #[test]
    fn terminal_transitions() {
        let job = Job::inventory("photos", "job-1");
        assert!(!job.completed);
        assert_eq!(job.status, JobStatus::InProgress);

        let done = job.clone().succeeded(2048);
        assert!(done.completed);
        assert_eq!(done.status, JobStatus::Succeeded);
        assert_eq!(done.inventory_size_in_bytes, Some(2048));

        let failed = job.failed("vault locked");
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.status_message.as_deref(), Some("vault locked"));
    }
}
