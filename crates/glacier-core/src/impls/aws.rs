//! AwsGlacierService - aws-sdk-glacier による GlacierService 実装
//!
//! - account id は常に `-`（認証情報のアカウント）
//! - ListVaults / ListJobs は marker を辿って全件取得
//! - DeleteVault の `InvalidParameterValueException` は VaultNotEmpty に分類

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_glacier::Client;
use aws_sdk_glacier::config::Region;
use aws_sdk_glacier::error::{DisplayErrorContext, SdkError};
use aws_sdk_glacier::operation::delete_vault::DeleteVaultError;
use aws_sdk_glacier::types::{DescribeVaultOutput, GlacierJobDescription, JobParameters};

use crate::config::GlacierConfig;
use crate::domain::{
    ArchiveId, GlacierError, Job, JobAction, JobId, JobStatus, Vault, VaultName, parse_timestamp,
};
use crate::ports::GlacierService;

const ACCOUNT_ID: &str = "-";
const JOB_TYPE_INVENTORY_RETRIEVAL: &str = "inventory-retrieval";
const JOB_FORMAT_JSON: &str = "JSON";

pub struct AwsGlacierService {
    client: Client,
}

impl AwsGlacierService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build the SDK client for the configured region and profile.
    ///
    /// Credentials come from the default provider chain of that profile.
    pub async fn connect(config: &GlacierConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .profile_name(config.profile.clone())
            .load()
            .await;
        Self::new(Client::new(&sdk_config))
    }
}

fn sdk_error(operation: &'static str, err: impl std::error::Error) -> GlacierError {
    GlacierError::service(operation, DisplayErrorContext(&err))
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn vault_from_sdk(vault: &DescribeVaultOutput) -> Option<Vault> {
    let name = vault.vault_name()?;
    Some(Vault {
        name: VaultName::new(name),
        size_in_bytes: to_u64(vault.size_in_bytes()),
        number_of_archives: to_u64(vault.number_of_archives()),
        creation_date: vault.creation_date().and_then(parse_timestamp),
        last_inventory_date: vault.last_inventory_date().and_then(parse_timestamp),
    })
}

/// Fields shared by `GlacierJobDescription` and `DescribeJobOutput`.
struct JobFields<'a> {
    job_id: Option<&'a str>,
    action: Option<&'a str>,
    completed: bool,
    status_code: Option<&'a str>,
    status_message: Option<&'a str>,
    creation_date: Option<&'a str>,
    completion_date: Option<&'a str>,
    inventory_size_in_bytes: Option<i64>,
}

impl JobFields<'_> {
    fn into_job(self, vault: &VaultName) -> Option<Job> {
        let job_id = self.job_id?;
        // A job without a status code is still running from our point of view.
        let status = self
            .status_code
            .and_then(JobStatus::from_code)
            .unwrap_or(JobStatus::InProgress);
        Some(Job {
            job_id: JobId::new(job_id),
            vault_name: vault.clone(),
            action: JobAction::from_code(self.action.unwrap_or_default()),
            completed: self.completed,
            status,
            status_message: self.status_message.map(str::to_string),
            creation_date: self.creation_date.and_then(parse_timestamp),
            completion_date: self.completion_date.and_then(parse_timestamp),
            inventory_size_in_bytes: self.inventory_size_in_bytes.map(to_u64),
        })
    }
}

/// Glacier answers `InvalidParameterValueException` when the vault still
/// holds archives or was written to since the last inventory.
fn classify_delete_vault<R>(vault: &VaultName, err: SdkError<DeleteVaultError, R>) -> GlacierError
where
    R: std::fmt::Debug,
{
    if err
        .as_service_error()
        .is_some_and(|e| e.is_invalid_parameter_value_exception())
    {
        GlacierError::VaultNotEmpty {
            vault: vault.clone(),
        }
    } else {
        sdk_error("DeleteVault", err)
    }
}

fn job_from_sdk(vault: &VaultName, job: &GlacierJobDescription) -> Option<Job> {
    JobFields {
        job_id: job.job_id(),
        action: job.action().map(|a| a.as_str()),
        completed: job.completed(),
        status_code: job.status_code().map(|s| s.as_str()),
        status_message: job.status_message(),
        creation_date: job.creation_date(),
        completion_date: job.completion_date(),
        inventory_size_in_bytes: job.inventory_size_in_bytes(),
    }
    .into_job(vault)
}

#[async_trait]
impl GlacierService for AwsGlacierService {
    async fn list_vaults(&self) -> Result<Vec<Vault>, GlacierError> {
        let mut vaults = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let out = self
                .client
                .list_vaults()
                .account_id(ACCOUNT_ID)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListVaults", e))?;

            vaults.extend(out.vault_list().iter().filter_map(vault_from_sdk));

            match out.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(vaults)
    }

    async fn list_jobs(&self, vault: &VaultName) -> Result<Vec<Job>, GlacierError> {
        let mut jobs = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let out = self
                .client
                .list_jobs()
                .account_id(ACCOUNT_ID)
                .vault_name(vault.as_str())
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListJobs", e))?;

            jobs.extend(out.job_list().iter().filter_map(|j| job_from_sdk(vault, j)));

            match out.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(jobs)
    }

    async fn initiate_inventory_job(&self, vault: &VaultName) -> Result<JobId, GlacierError> {
        let params = JobParameters::builder()
            .format(JOB_FORMAT_JSON)
            .r#type(JOB_TYPE_INVENTORY_RETRIEVAL)
            .description(format!("glacier-sweep-retrieve-inventory-{vault}"))
            .build();

        let out = self
            .client
            .initiate_job()
            .account_id(ACCOUNT_ID)
            .vault_name(vault.as_str())
            .job_parameters(params)
            .send()
            .await
            .map_err(|e| sdk_error("InitiateJob", e))?;

        out.job_id()
            .map(JobId::new)
            .ok_or_else(|| GlacierError::service("InitiateJob", "response carried no job id"))
    }

    async fn get_job_output(
        &self,
        vault: &VaultName,
        job_id: &JobId,
    ) -> Result<Vec<u8>, GlacierError> {
        let out = self
            .client
            .get_job_output()
            .account_id(ACCOUNT_ID)
            .vault_name(vault.as_str())
            .job_id(job_id.as_str())
            .send()
            .await
            .map_err(|e| sdk_error("GetJobOutput", e))?;

        let body = out
            .body
            .collect()
            .await
            .map_err(|e| sdk_error("GetJobOutput", e))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn delete_archive(
        &self,
        vault: &VaultName,
        archive_id: &ArchiveId,
    ) -> Result<(), GlacierError> {
        self.client
            .delete_archive()
            .account_id(ACCOUNT_ID)
            .vault_name(vault.as_str())
            .archive_id(archive_id.as_str())
            .send()
            .await
            .map_err(|e| sdk_error("DeleteArchive", e))?;
        Ok(())
    }

    async fn delete_vault(&self, vault: &VaultName) -> Result<(), GlacierError> {
        self.client
            .delete_vault()
            .account_id(ACCOUNT_ID)
            .vault_name(vault.as_str())
            .send()
            .await
            .map_err(|err| classify_delete_vault(vault, err))?;
        Ok(())
    }

    async fn describe_job(&self, vault: &VaultName, job_id: &JobId) -> Result<Job, GlacierError> {
        let out = self
            .client
            .describe_job()
            .account_id(ACCOUNT_ID)
            .vault_name(vault.as_str())
            .job_id(job_id.as_str())
            .send()
            .await
            .map_err(|e| sdk_error("DescribeJob", e))?;

        JobFields {
            job_id: out.job_id(),
            action: out.action().map(|a| a.as_str()),
            completed: out.completed(),
            status_code: out.status_code().map(|s| s.as_str()),
            status_message: out.status_message(),
            creation_date: out.creation_date(),
            completion_date: out.completion_date(),
            inventory_size_in_bytes: out.inventory_size_in_bytes(),
        }
        .into_job(vault)
        .ok_or_else(|| GlacierError::service("DescribeJob", "response carried no job id"))
    }
}
