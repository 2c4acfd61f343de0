//! Job classifier: pure predicates over job records.
//!
//! No sorting anywhere. The order Glacier returns jobs in is authoritative.

use crate::domain::{Job, JobAction, JobStatus};

pub fn is_inventory_retrieval(job: &Job) -> bool {
    job.action == JobAction::InventoryRetrieval
}

/// Completed and succeeded. Only such a job has a consumable output.
pub fn is_succeeded(job: &Job) -> bool {
    job.completed && job.status == JobStatus::Succeeded
}

pub fn is_incomplete_inventory(job: &Job) -> bool {
    is_inventory_retrieval(job) && !job.completed
}

pub fn is_consumable_inventory(job: &Job) -> bool {
    is_inventory_retrieval(job) && is_succeeded(job)
}

/// First incomplete inventory job in input order.
pub fn find_first_incomplete_inventory(jobs: &[Job]) -> Option<&Job> {
    jobs.iter().find(|job| is_incomplete_inventory(job))
}

/// Every succeeded inventory job, in input order.
pub fn succeeded_inventories(jobs: &[Job]) -> impl Iterator<Item = &Job> {
    jobs.iter().filter(|job| is_consumable_inventory(job))
}
