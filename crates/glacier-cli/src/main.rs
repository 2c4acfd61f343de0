mod args;
mod demo;
mod logging;
mod menu;
mod progress;
mod report;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use glacier_core::config::{ConfigSource, GlacierConfig};
use glacier_core::domain::VaultName;
use glacier_core::{App, AppBuilder};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::args::{Cli, Mode};
use crate::menu::{LinePrompter, Session};
use crate::progress::BarProgress;

/// Poll interval of the demo account unless overridden.
const DEMO_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// 128 + SIGINT
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app = build_app(&cli).await?;
    info!(
        max_parallelism = app.deleter.max_parallelism(),
        poll_interval_secs = app.waiter.poll_interval().as_secs(),
        "ready"
    );

    let mode = cli.mode();
    let cancel = CancellationToken::new();
    if mode.cancellable() {
        spawn_ctrl_c(cancel.clone());
    }

    match mode {
        Mode::Report => print_report(&app, cli.vault.as_deref(), cli.json).await,
        Mode::Watch => {
            let report = app.monitor.watch(&cancel).await?;
            emit(cli.json, &report, || report::snapshot(&report))
        }
        Mode::DeleteVault(vault) => {
            let progress = BarProgress::new();
            let report = app
                .orchestrator
                .delete_vault(&VaultName::new(vault), &progress, &cancel)
                .await?;
            emit(cli.json, &report, || report::vault_deletion(&report))
        }
        Mode::Interactive => {
            let prompter = LinePrompter::new()?;
            Session::new(&app, prompter, cancel)
                .run(cli.vault.map(VaultName::new))
                .await
        }
    }
}

async fn build_app(cli: &Cli) -> Result<App> {
    if cli.demo {
        let mut config = GlacierConfig::local().with_poll_interval(DEMO_POLL_INTERVAL);
        if let Some(secs) = cli.poll_interval_secs {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(n) = cli.max_parallelism {
            config = config.with_max_parallelism(n as usize);
        }
        info!("running against the demo account");
        return Ok(AppBuilder::new(config)
            .service(Arc::new(demo::demo_glacier()))
            .build()?);
    }

    let config = ConfigSource::from_env()?
        .merge(cli.overrides())
        .resolve()?;
    info!(region = %config.region, profile = %config.profile, "using AWS configuration");

    let app = AppBuilder::new(config)
        .connect_aws()
        .await?
        .build()?;
    Ok(app)
}

/// First Ctrl-C cancels the token; a second one exits immediately.
fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("interrupted, finishing in-flight work (press Ctrl-C again to quit)");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted again, exiting");
            std::process::exit(EXIT_INTERRUPTED);
        }
    });
}

async fn print_report(app: &App, vault: Option<&str>, json: bool) -> Result<()> {
    match vault {
        Some(vault) => {
            let jobs = app
                .client
                .list_jobs(&VaultName::new(vault))
                .await
                .with_context(|| format!("failed to list jobs of vault {vault}"))?;
            emit(json, &jobs, || report::jobs_table(&jobs))
        }
        None => {
            let vaults = app.client.list_vaults().await.context("failed to list vaults")?;
            emit(json, &vaults, || report::vaults_table(&vaults))
        }
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
