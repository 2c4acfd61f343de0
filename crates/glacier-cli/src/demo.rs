//! Sample account for `--demo`.

use std::time::Duration;

use chrono::Utc;
use glacier_core::domain::{Job, Vault};
use glacier_core::impls::InMemoryGlacier;

/// Three vaults: one ready to be emptied, one with an inventory still
/// running, one already empty.
pub fn demo_glacier() -> InMemoryGlacier {
    let now = Utc::now();
    let photo_archives: Vec<String> = (1..=120).map(|i| format!("photo-archive-{i:04}")).collect();
    let pending = Job::inventory("backups-2019", "demo-inventory-pending").with_creation_date(now);

    InMemoryGlacier::new()
        .with_vault(
            Vault::new("photos")
                .with_archives(photo_archives.len() as u64, 120 * 1024 * 1024)
                .with_creation_date(now),
        )
        .with_inventory("photos", "demo-inventory-photos", photo_archives)
        .with_vault(Vault::new("backups-2019").with_creation_date(now))
        .with_inventory("backups-2019", "demo-inventory-pending", ["backup-0001", "backup-0002"])
        .with_job_listings(
            "backups-2019",
            [Ok(vec![pending.clone()]), Ok(vec![pending.clone().succeeded(2048)])],
        )
        .with_job_states(
            "demo-inventory-pending",
            [Ok(pending.clone()), Ok(pending.succeeded(2048))],
        )
        .with_vault(Vault::new("empty").with_creation_date(now))
        .with_archive_delay(Duration::from_millis(15))
}
