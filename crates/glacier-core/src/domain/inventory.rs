//! Inventory: the body of a succeeded inventory-retrieval job.
//!
//! Glacier の JSON 形式:
//! ```json
//! {
//!   "VaultARN": "arn:aws:glacier:eu-central-1:012345678901:vaults/photos",
//!   "InventoryDate": "2024-01-01T12:00:00Z",
//!   "ArchiveList": [
//!     { "ArchiveId": "...", "ArchiveDescription": "...", "CreationDate": "...",
//!       "Size": 2140123, "SHA256TreeHash": "..." }
//!   ]
//! }
//! ```
//! 取得は削除 1 回につき 1 回だけ。保存はしない。

use serde::Deserialize;

use super::errors::GlacierError;
use super::ids::ArchiveId;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Inventory {
    #[serde(rename = "VaultARN", default)]
    pub vault_arn: Option<String>,

    #[serde(default)]
    pub inventory_date: Option<String>,

    pub archive_list: Vec<InventoryEntry>,
}

/// One archive in the inventory. Only `ArchiveId` is required for deletion;
/// description, creation date and tree hash are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InventoryEntry {
    pub archive_id: ArchiveId,

    #[serde(default)]
    pub size: Option<u64>,
}

impl Inventory {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GlacierError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Archive ids in inventory order.
    pub fn archive_ids(&self) -> Vec<ArchiveId> {
        self.archive_list
            .iter()
            .map(|entry| entry.archive_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.archive_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive_list.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.archive_list.iter().filter_map(|entry| entry.size).sum()
    }
}
