//! Errors - エラー型と分類

use thiserror::Error;

use super::ids::{JobId, VaultName};
use super::job::JobStatus;

/// ErrorKind はエラーの運用上の分類
///
/// - Configuration: 起動前に検出される設定不備（致命的）
/// - Service: Glacier 呼び出しの失敗（呼び出し元に伝搬）
/// - Business: 分類済みの業務エラー（警告に格下げ）
/// - Cancelled: キャンセルされた
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Service,
    Business,
    Cancelled,
}

/// Missing or malformed configuration. Reported once; the process exits.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "AWS profile is not set. Configure the aws cli and `export AWS_PROFILE=<PROFILE>` or pass --profile."
    )]
    MissingProfile,

    #[error(
        "AWS region is not set. `export AWS_REGION=<REGION>` or pass --region (e.g. export AWS_REGION=eu-central-1)."
    )]
    MissingRegion,

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum GlacierError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    #[error("vault {vault} is not empty or its inventory is not up to date")]
    VaultNotEmpty { vault: VaultName },

    #[error("job {job_id} has no consumable inventory (completed={completed}, status={status})")]
    InventoryNotReady {
        job_id: JobId,
        completed: bool,
        status: JobStatus,
    },

    #[error("inventory body could not be decoded: {0}")]
    InventoryDecode(#[from] serde_json::Error),

    #[error("operation cancelled")]
    Cancelled,
}

impl GlacierError {
    pub fn service(operation: &'static str, err: impl std::fmt::Display) -> Self {
        GlacierError::Service {
            operation,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GlacierError::Config(_) => ErrorKind::Configuration,
            GlacierError::Service { .. } | GlacierError::InventoryDecode(_) => ErrorKind::Service,
            GlacierError::VaultNotEmpty { .. } | GlacierError::InventoryNotReady { .. } => {
                ErrorKind::Business
            }
            GlacierError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Recoverable errors print a warning and let the interactive flow continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Business | ErrorKind::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_error_kinds() {
        let err = GlacierError::service("ListVaults", "connection reset");
        assert_eq!(err.kind(), ErrorKind::Service);
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "ListVaults failed: connection reset");

        let err = GlacierError::VaultNotEmpty {
            vault: VaultName::new("photos"),
        };
        assert_eq!(err.kind(), ErrorKind::Business);
        assert!(err.is_recoverable());

        let err: GlacierError = ConfigError::MissingRegion.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("AWS_REGION"));
    }
}
