//! Vault snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::VaultName;

/// A vault as reported by `ListVaults`.
///
/// Fetched fresh on every query; nothing is kept between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub name: VaultName,
    pub size_in_bytes: u64,
    pub number_of_archives: u64,
    pub creation_date: Option<DateTime<Utc>>,

    /// Date of the last inventory Glacier computed for this vault (roughly daily).
    pub last_inventory_date: Option<DateTime<Utc>>,
}

impl Vault {
    pub fn new(name: impl Into<VaultName>) -> Self {
        Self {
            name: name.into(),
            size_in_bytes: 0,
            number_of_archives: 0,
            creation_date: None,
            last_inventory_date: None,
        }
    }

    pub fn with_archives(mut self, number_of_archives: u64, size_in_bytes: u64) -> Self {
        self.number_of_archives = number_of_archives;
        self.size_in_bytes = size_in_bytes;
        self
    }

    pub fn with_creation_date(mut self, creation_date: DateTime<Utc>) -> Self {
        self.creation_date = Some(creation_date);
        self
    }
}

/// Parse the ISO 8601 timestamps Glacier uses (`2012-03-20T17:03:43.221Z`).
///
/// Unparseable values are dropped rather than failing the whole listing.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_glacier_timestamps() {
        let ts = parse_timestamp("2012-03-20T17:03:43.221Z").unwrap();
        assert_eq!(ts.year(), 2012);
        assert_eq!(ts.hour(), 17);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn builder_sets_counts() {
        let vault = Vault::new("photos").with_archives(3, 1024);
        assert_eq!(vault.name.as_str(), "photos");
        assert_eq!(vault.number_of_archives, 3);
        assert_eq!(vault.size_in_bytes, 1024);
    }
}
