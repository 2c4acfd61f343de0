//! Plain-text tables for vaults, jobs and run summaries.
//!
//! Job table values are cut at 25 characters so long job ids and
//! timestamps keep the table narrow.

use glacier_core::app::{DeleteSummary, FleetSnapshot, MonitorReport, MonitorStop, Precheck, VaultDeletion, VaultDeletionReport};
use glacier_core::domain::{Job, Vault};

/// Maximum width of a job table cell
const JOB_CELL_WIDTH: usize = 25;

const NO_INVENTORIES: &str = "No recent inventories. Please request the archive inventory to prepare\n\
the deletion of the archives and subsequently the vault.";

fn truncate(value: &str, max_width: usize) -> String {
    value.chars().take(max_width).collect()
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Left-aligned columns separated by two spaces, with a dashed rule under the header.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![
        line(headers.iter().map(|h| h.to_string()).collect()),
        line(widths.iter().map(|w| "-".repeat(*w)).collect()),
    ];
    out.extend(rows.iter().map(|row| line(row.clone())));
    out.join("\n")
}

fn section(title: &str, body: &str) -> String {
    format!("\n{title}\n{}\n{body}\n", "=".repeat(title.chars().count()))
}

pub fn vaults_table(vaults: &[Vault]) -> String {
    let rows: Vec<Vec<String>> = vaults
        .iter()
        .map(|vault| {
            vec![
                vault.name.to_string(),
                vault.number_of_archives.to_string(),
                vault.size_in_bytes.to_string(),
                opt(&vault.creation_date),
                opt(&vault.last_inventory_date),
            ]
        })
        .collect();
    section(
        "Available Vaults:",
        &render_table(
            &["VaultName", "NumberOfArchives", "SizeInBytes", "CreationDate", "LastInventoryDate"],
            &rows,
        ),
    )
}

pub fn jobs_table(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return section("Jobs:", NO_INVENTORIES);
    }
    let rows: Vec<Vec<String>> = jobs
        .iter()
        .map(|job| {
            [
                job.job_id.to_string(),
                job.action.to_string(),
                opt(&job.creation_date),
                job.completed.to_string(),
                job.status.to_string(),
                opt(&job.completion_date),
                opt(&job.inventory_size_in_bytes),
            ]
            .iter()
            .map(|value| truncate(value, JOB_CELL_WIDTH))
            .collect()
        })
        .collect();
    section(
        "Inventories:",
        &render_table(
            &[
                "JobId",
                "Action",
                "CreationDate",
                "Completed",
                "StatusCode",
                "CompletionDate",
                "InventorySizeInBytes",
            ],
            &rows,
        ),
    )
}

pub fn delete_summary(summary: &DeleteSummary) -> String {
    format!(
        "Deleted {} of {} archives ({} failed)",
        summary.succeeded, summary.attempted, summary.failed
    )
}

pub fn snapshot(report: &MonitorReport) -> String {
    let headline = match report.stop {
        MonitorStop::NothingToWatch => "No inventory jobs in progress.".to_string(),
        MonitorStop::Changed => format!("Inventory jobs changed after {} polls.", report.polls),
        MonitorStop::Cancelled => format!("Stopped after {} polls.", report.polls),
    };
    if report.snapshot.is_empty() {
        return headline;
    }
    format!("{headline}\n{}", snapshot_table(&report.snapshot))
}

fn snapshot_table(snapshot: &FleetSnapshot) -> String {
    let rows: Vec<Vec<String>> = snapshot
        .jobs
        .iter()
        .map(|job| {
            vec![
                job.vault_name.to_string(),
                truncate(job.job_id.as_str(), JOB_CELL_WIDTH),
                job.status.to_string(),
                opt(&job.status_message),
            ]
        })
        .collect();
    render_table(&["VaultName", "JobId", "StatusCode", "StatusMessage"], &rows)
}

pub fn vault_deletion(report: &VaultDeletionReport) -> String {
    let mut lines = Vec::new();
    match &report.precheck {
        Precheck::NoPendingInventory => {}
        Precheck::Consumed { job_id, summary } => {
            lines.push(format!("Inventory {}: {}", job_id.short(JOB_CELL_WIDTH), delete_summary(summary)));
        }
        Precheck::JobFailed(job) => lines.push(format!(
            "Inventory job {} failed: {}",
            job.job_id.short(JOB_CELL_WIDTH),
            job.status_message.as_deref().unwrap_or("no message")
        )),
        Precheck::Cancelled => lines.push("Waiting for the inventory was cancelled.".to_string()),
        Precheck::Failed(reason) => lines.push(format!("Inventory check skipped: {reason}")),
    }
    match &report.disposition {
        VaultDeletion::Deleted => lines.push(format!("Vault {} deleted.", report.vault)),
        VaultDeletion::Blocked { guidance } => {
            lines.push(format!("Vault {} is not empty yet.", report.vault));
            lines.push(guidance.clone());
        }
        VaultDeletion::Cancelled => {
            lines.push(format!("Vault {} was not deleted (cancelled).", report.vault));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacier_core::domain::{JobId, VaultName};

    #[test]
    fn job_cells_are_cut_at_25_characters() {
        let job = Job::inventory("photos", "0123456789abcdefghijklmnopqrstuvwxyz").succeeded(42);
        let table = jobs_table(&[job]);

        assert!(table.contains("0123456789abcdefghijklmno"));
        assert!(!table.contains("0123456789abcdefghijklmnop"));
        assert!(table.contains("InventorySizeInBytes"));
        assert!(table.contains("Succeeded"));
    }

    #[test]
    fn empty_job_list_prints_hint() {
        let table = jobs_table(&[]);
        assert!(table.contains("No recent inventories"));
    }

    #[test]
    fn vault_table_lists_every_vault() {
        let table = vaults_table(&[
            Vault::new("photos").with_archives(3, 3072),
            Vault::new("music"),
        ]);
        assert!(table.contains("photos"));
        assert!(table.contains("3072"));
        assert!(table.contains("music"));
    }

    #[test]
    fn blocked_deletion_shows_guidance() {
        let report = VaultDeletionReport {
            vault: VaultName::new("photos"),
            precheck: Precheck::Consumed {
                job_id: JobId::new("job-1"),
                summary: DeleteSummary {
                    attempted: 2,
                    succeeded: 2,
                    ..Default::default()
                },
            },
            disposition: VaultDeletion::Blocked {
                guidance: "Wait 24 hours".to_string(),
            },
        };
        let text = vault_deletion(&report);
        assert!(text.contains("Deleted 2 of 2 archives"));
        assert!(text.contains("Wait 24 hours"));
    }

    #[test]
    fn cancelled_deletion_reports_partial_progress() {
        let report = VaultDeletionReport {
            vault: VaultName::new("photos"),
            precheck: Precheck::Consumed {
                job_id: JobId::new("job-1"),
                summary: DeleteSummary {
                    attempted: 8,
                    succeeded: 8,
                    ..Default::default()
                },
            },
            disposition: VaultDeletion::Cancelled,
        };
        let text = vault_deletion(&report);
        assert!(text.contains("Deleted 8 of 8 archives"));
        assert!(text.contains("not deleted (cancelled)"));
    }

    #[test]
    fn columns_are_aligned() {
        let table = render_table(&["A", "Long"], &[vec!["xyz".to_string(), "1".to_string()]]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "A    Long");
        assert_eq!(lines[1], "---  ----");
        assert_eq!(lines[2], "xyz  1");
    }
}
