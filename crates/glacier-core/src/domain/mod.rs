//! Domain model (vaults, jobs, inventories, errors, ...).

pub mod action;
pub mod errors;
pub mod ids;
pub mod inventory;
pub mod job;
pub mod vault;

pub use self::action::VaultAction;
pub use self::errors::{ConfigError, ErrorKind, GlacierError};
pub use self::ids::{ArchiveId, JobId, VaultName};
pub use self::inventory::{Inventory, InventoryEntry};
pub use self::job::{Job, JobAction, JobStatus};
pub use self::vault::{Vault, parse_timestamp};
