//! Configuration: region, profile and the polling / parallelism knobs.
//!
//! Values come from the environment with command-line overrides on top.
//! `resolve()` fails fast when region or profile is missing.

use std::time::Duration;

use crate::domain::ConfigError;

pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_PROFILE: &str = "AWS_PROFILE";
pub const ENV_POLL_INTERVAL_SECS: &str = "GLACIER_POLL_INTERVAL_SECS";
pub const ENV_MAX_PARALLELISM: &str = "GLACIER_MAX_PARALLELISM";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Resolved configuration. Every field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlacierConfig {
    pub region: String,
    pub profile: String,
    /// Sleep between two polls of the waiter and the fleet monitor.
    pub poll_interval: Duration,
    /// Upper bound on concurrent archive deletions.
    pub max_parallelism: usize,
}

impl GlacierConfig {
    /// Configuration for tests and `--demo`; nothing is read from the environment.
    pub fn local() -> Self {
        Self {
            region: "local".to_string(),
            profile: "local".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_parallelism: default_parallelism(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism.max(1);
        self
    }

    /// Re-check a configuration that was assembled by hand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profile.trim().is_empty() {
            return Err(ConfigError::MissingProfile);
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: ENV_POLL_INTERVAL_SECS,
                value: "0".to_string(),
            });
        }
        if self.max_parallelism == 0 {
            return Err(ConfigError::InvalidValue {
                name: ENV_MAX_PARALLELISM,
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Hardware parallelism, or 1 when it cannot be determined.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Partially known configuration (environment, then overrides).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSource {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_parallelism: Option<usize>,
}

impl ConfigSource {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let poll_interval_secs = get(ENV_POLL_INTERVAL_SECS)
            .map(|value| parse_positive(ENV_POLL_INTERVAL_SECS, &value))
            .transpose()?;
        let max_parallelism = get(ENV_MAX_PARALLELISM)
            .map(|value| parse_positive(ENV_MAX_PARALLELISM, &value).map(|n| n as usize))
            .transpose()?;

        Ok(Self {
            region: get(ENV_REGION),
            profile: get(ENV_PROFILE),
            poll_interval_secs,
            max_parallelism,
        })
    }

    /// Values set in `overrides` win.
    pub fn merge(self, overrides: ConfigSource) -> Self {
        Self {
            region: overrides.region.or(self.region),
            profile: overrides.profile.or(self.profile),
            poll_interval_secs: overrides.poll_interval_secs.or(self.poll_interval_secs),
            max_parallelism: overrides.max_parallelism.or(self.max_parallelism),
        }
    }

    pub fn resolve(self) -> Result<GlacierConfig, ConfigError> {
        let profile = self.profile.ok_or(ConfigError::MissingProfile)?;
        let region = self.region.ok_or(ConfigError::MissingRegion)?;
        Ok(GlacierConfig {
            region,
            profile,
            poll_interval: self
                .poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            max_parallelism: self
                .max_parallelism
                .unwrap_or_else(default_parallelism)
                .max(1),
        })
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        })
}
