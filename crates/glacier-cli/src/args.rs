use clap::Parser;
use glacier_core::config::ConfigSource;

/// glacier-sweep - empty and delete Amazon S3 Glacier vaults
#[derive(Parser, Debug)]
#[command(name = "glacier-sweep")]
#[command(version)]
#[command(about = "Inspect, empty and delete Amazon S3 Glacier vaults", long_about = None)]
pub struct Cli {
    /// Preselect a vault
    #[arg(long = "vault")]
    pub vault: Option<String>,

    /// Print the vault list (or the job table of --vault) and exit
    #[arg(long = "report", conflicts_with_all = ["watch", "delete_vault"])]
    pub report: bool,

    /// Wait until the set of running inventory jobs changes, then print it
    #[arg(long = "watch", conflicts_with = "delete_vault")]
    pub watch: bool,

    /// Delete a vault without prompting (waits for a pending inventory first)
    #[arg(long = "delete-vault", value_name = "NAME")]
    pub delete_vault: Option<String>,

    /// AWS region (overrides AWS_REGION)
    #[arg(long = "region")]
    pub region: Option<String>,

    /// AWS profile (overrides AWS_PROFILE)
    #[arg(long = "profile")]
    pub profile: Option<String>,

    /// Seconds between two job polls
    #[arg(long = "poll-interval-secs", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_secs: Option<u64>,

    /// Upper bound on concurrent archive deletions
    #[arg(long = "max-parallelism", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_parallelism: Option<u64>,

    /// Print --report, --watch and --delete-vault results as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Debug logging, including every failed archive
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Run against an in-process Glacier with sample data
    #[arg(long = "demo")]
    pub demo: bool,
}

impl Cli {
    /// Command-line values as configuration overrides.
    pub fn overrides(&self) -> ConfigSource {
        ConfigSource {
            region: self.region.clone(),
            profile: self.profile.clone(),
            poll_interval_secs: self.poll_interval_secs,
            max_parallelism: self.max_parallelism.map(|n| n as usize),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.report {
            Mode::Report
        } else if self.watch {
            Mode::Watch
        } else if let Some(vault) = &self.delete_vault {
            Mode::DeleteVault(vault.clone())
        } else {
            Mode::Interactive
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Report,
    Watch,
    DeleteVault(String),
}

impl Mode {
    /// Modes that wait or delete and can stop cleanly on a cancelled token.
    /// Everything else keeps the default Ctrl-C behaviour.
    pub fn cancellable(&self) -> bool {
        !matches!(self, Mode::Report)
    }
}
