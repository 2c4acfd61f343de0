//! Actions a user can pick for a selected vault.

use std::fmt;

use super::ids::JobId;
use super::job::Job;
use crate::classifier;

/// One menu entry.
///
/// `DeleteInventory` carries the job whose inventory gets consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultAction {
    DeleteInventory { job_id: JobId },
    RetrieveInventory,
    DeleteVault,
    Back,
    Exit,
}

impl VaultAction {
    /// Label shown in the menu. Job ids are cut to 25 characters.
    pub fn label(&self) -> String {
        match self {
            VaultAction::DeleteInventory { job_id } => {
                format!("Delete Inventory: {}", job_id.short(25))
            }
            VaultAction::RetrieveInventory => "Retrieve Inventory".to_string(),
            VaultAction::DeleteVault => "Delete Vault".to_string(),
            VaultAction::Back => "BACK".to_string(),
            VaultAction::Exit => "EXIT".to_string(),
        }
    }

    /// Menu for a vault: one delete entry per succeeded inventory job, in
    /// listing order, then the fixed entries.
    pub fn menu_for(jobs: &[Job]) -> Vec<VaultAction> {
        classifier::succeeded_inventories(jobs)
            .map(|job| VaultAction::DeleteInventory {
                job_id: job.job_id.clone(),
            })
            .chain([
                VaultAction::RetrieveInventory,
                VaultAction::DeleteVault,
                VaultAction::Back,
                VaultAction::Exit,
            ])
            .collect()
    }

    /// Does this action end the session?
    pub fn is_exit(&self) -> bool {
        matches!(self, VaultAction::Exit)
    }
}

impl fmt::Display for VaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
