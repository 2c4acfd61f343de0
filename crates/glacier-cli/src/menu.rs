//! Interactive session: pick a vault, look at its jobs, pick an action.
//!
//! Prompts go through the `Prompter` trait so the flow can be driven by a
//! script in tests. The real prompter reads lines with rustyline.

use anyhow::{Context, Result};
use glacier_core::App;
use glacier_core::domain::{GlacierError, VaultAction, VaultName};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::progress::BarProgress;
use crate::report;

pub trait Prompter {
    /// Ask for one of `options`. `None` when the user aborts the prompt.
    fn select(&mut self, message: &str, options: &[String]) -> Result<Option<usize>>;

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;
}

/// 1-based menu number to index.
pub fn parse_choice(input: &str, len: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}

pub fn parse_confirm(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Run a blocking terminal read without stalling other tasks on this worker.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    tokio::task::block_in_place(f)
}

pub struct LinePrompter {
    editor: DefaultEditor,
}

impl LinePrompter {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to initialize the terminal prompt")?;
        Ok(Self { editor })
    }

    /// Blocks on the terminal. Needs the multi-threaded runtime.
    fn read(&mut self, prompt: &str) -> Result<Option<String>> {
        let editor = &mut self.editor;
        match run_blocking(|| editor.readline(prompt)) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err).context("failed to read from the terminal"),
        }
    }
}

impl Prompter for LinePrompter {
    fn select(&mut self, message: &str, options: &[String]) -> Result<Option<usize>> {
        println!("{message}");
        for (i, option) in options.iter().enumerate() {
            println!("  {:>2}) {option}", i + 1);
        }
        loop {
            let Some(line) = self.read("> ")? else {
                return Ok(None);
            };
            match parse_choice(&line, options.len()) {
                Some(index) => return Ok(Some(index)),
                None => println!("Please enter a number between 1 and {}.", options.len()),
            }
        }
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let Some(line) = self.read(&format!("{message} {hint} "))? else {
                return Ok(false);
            };
            if let Some(answer) = parse_confirm(&line, default) {
                return Ok(answer);
            }
        }
    }
}

pub struct Session<'a, P: Prompter> {
    app: &'a App,
    prompter: P,
    cancel: CancellationToken,
    show_progress: bool,
}

impl<'a, P: Prompter> Session<'a, P> {
    pub fn new(app: &'a App, prompter: P, cancel: CancellationToken) -> Self {
        Self {
            app,
            prompter,
            cancel,
            show_progress: true,
        }
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn progress(&self) -> BarProgress {
        if self.show_progress {
            BarProgress::new()
        } else {
            BarProgress::hidden()
        }
    }

    pub async fn run(&mut self, preselected: Option<VaultName>) -> Result<()> {
        let mut preselected = preselected;
        loop {
            let vault = match preselected.take() {
                Some(vault) => vault,
                None => match self.select_vault().await? {
                    Some(vault) => vault,
                    None => return Ok(()),
                },
            };

            let action = self.select_action(&vault).await?;
            let Some(action) = action else {
                return Ok(());
            };
            if action.is_exit() {
                return Ok(());
            }

            if let Err(err) = self.perform(&vault, &action).await {
                if !err.is_recoverable() {
                    return Err(err).with_context(|| format!("{action} on vault {vault} failed"));
                }
                warn!(%vault, error = %err, "{action} did not complete");
            }

            if self.cancel.is_cancelled() {
                return Ok(());
            }
            if !self
                .prompter
                .confirm("Would you like to continue with another vault?", true)?
            {
                return Ok(());
            }
        }
    }

    async fn select_vault(&mut self) -> Result<Option<VaultName>> {
        let vaults = self.app.client.list_vaults().await?;
        println!("{}", report::vaults_table(&vaults));

        let mut options: Vec<String> = vaults.iter().map(|v| v.name.to_string()).collect();
        options.push(VaultAction::Exit.label());

        let choice = self
            .prompter
            .select("Select a AWS Glacier Vault:", &options)?;
        Ok(choice
            .and_then(|index| vaults.get(index))
            .map(|vault| vault.name.clone()))
    }

    async fn select_action(&mut self, vault: &VaultName) -> Result<Option<VaultAction>> {
        let jobs = self.app.client.list_jobs(vault).await?;
        println!("{}", report::jobs_table(&jobs));

        let actions = VaultAction::menu_for(&jobs);
        let labels: Vec<String> = actions.iter().map(VaultAction::label).collect();
        let choice = self.prompter.select("Select an action:", &labels)?;
        Ok(choice.and_then(|index| actions.get(index).cloned()))
    }

    async fn perform(&self, vault: &VaultName, action: &VaultAction) -> Result<(), GlacierError> {
        match action {
            VaultAction::DeleteInventory { job_id } => {
                let progress = self.progress();
                let summary = self
                    .app
                    .orchestrator
                    .delete_inventory(vault, job_id, &progress, &self.cancel)
                    .await?;
                for failure in &summary.failures {
                    debug!(archive_id = %failure.archive_id, message = %failure.message, "archive not deleted");
                }
                println!("{}", report::delete_summary(&summary));
            }
            VaultAction::RetrieveInventory => {
                let job_id = self.app.client.retrieve_inventory(vault).await?;
                println!("Inventory retrieval started: {job_id}");
            }
            VaultAction::DeleteVault => {
                let progress = self.progress();
                let report = self
                    .app
                    .orchestrator
                    .delete_vault(vault, &progress, &self.cancel)
                    .await?;
                println!("{}", report::vault_deletion(&report));
            }
            VaultAction::Back | VaultAction::Exit => {}
        }
        Ok(())
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacier_core::config::GlacierConfig;
    use glacier_core::domain::Vault;
    use glacier_core::impls::{Call, InMemoryGlacier};
    use glacier_core::AppBuilder;
    use rstest::rstest;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Answers prompts from a fixed list and records what was offered.
    #[derive(Default)]
    struct ScriptedPrompter {
        choices: VecDeque<Option<usize>>,
        confirms: VecDeque<bool>,
        offered: Vec<Vec<String>>,
    }

    impl Prompter for ScriptedPrompter {
        fn select(&mut self, _message: &str, options: &[String]) -> Result<Option<usize>> {
            self.offered.push(options.to_vec());
            Ok(self.choices.pop_front().flatten())
        }

        fn confirm(&mut self, _message: &str, _default: bool) -> Result<bool> {
            Ok(self.confirms.pop_front().unwrap_or(false))
        }
    }

    fn app(glacier: &Arc<InMemoryGlacier>) -> App {
        AppBuilder::new(GlacierConfig::local().with_max_parallelism(2))
            .service(glacier.clone())
            .build()
            .unwrap()
    }

    #[rstest]
    #[case("1", 3, Some(0))]
    #[case(" 3 ", 3, Some(2))]
    #[case("0", 3, None)]
    #[case("4", 3, None)]
    #[case("abc", 3, None)]
    fn parses_menu_numbers(#[case] input: &str, #[case] len: usize, #[case] expected: Option<usize>) {
        assert_eq!(parse_choice(input, len), expected);
    }

    #[rstest]
    #[case("", true, Some(true))]
    #[case("", false, Some(false))]
    #[case("Y", false, Some(true))]
    #[case("no", true, Some(false))]
    #[case("maybe", true, None)]
    fn parses_confirmations(#[case] input: &str, #[case] default: bool, #[case] expected: Option<bool>) {
        assert_eq!(parse_confirm(input, default), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn blocking_read_leaves_the_worker_free() {
        let (tx, rx) = std::sync::mpsc::channel();
        let reader = tokio::spawn(async move {
            run_blocking(move || rx.recv_timeout(std::time::Duration::from_secs(5)))
        });
        tokio::spawn(async move {
            let _ = tx.send(42);
        });

        assert_eq!(reader.await.unwrap(), Ok(42));
    }

    #[tokio::test]
    async fn delete_inventory_then_stop() {
        let glacier = Arc::new(
            InMemoryGlacier::new()
                .with_vault(Vault::new("photos"))
                .with_inventory("photos", "job-1", ["a-1", "a-2"]),
        );
        let app = app(&glacier);
        let prompter = ScriptedPrompter {
            // vault "photos", then "Delete Inventory: job-1"
            choices: VecDeque::from([Some(0), Some(0)]),
            confirms: VecDeque::from([false]),
            ..Default::default()
        };

        let mut session = Session::new(&app, prompter, CancellationToken::new()).without_progress();
        session.run(None).await.unwrap();
        let prompter = session.into_prompter();

        assert_eq!(prompter.offered[0], vec!["photos".to_string(), "EXIT".to_string()]);
        assert_eq!(prompter.offered[1][0], "Delete Inventory: job-1");
        assert_eq!(glacier.remaining_archives("photos").await, 0);
    }

    #[tokio::test]
    async fn exit_from_vault_list_touches_nothing() {
        let glacier = Arc::new(InMemoryGlacier::new().with_vault(Vault::new("photos")));
        let app = app(&glacier);
        let prompter = ScriptedPrompter {
            choices: VecDeque::from([Some(1)]),
            ..Default::default()
        };

        let mut session = Session::new(&app, prompter, CancellationToken::new()).without_progress();
        session.run(None).await.unwrap();

        assert_eq!(glacier.calls().await, vec![Call::ListVaults]);
    }

    #[tokio::test]
    async fn blocked_vault_delete_keeps_the_session_going() {
        let glacier = Arc::new(
            InMemoryGlacier::new()
                .with_vault(Vault::new("photos"))
                .with_inventory("photos", "job-1", ["a-1"]),
        );
        let app = app(&glacier);
        let prompter = ScriptedPrompter {
            // preselected vault: "Delete Vault" is after the one inventory entry and "Retrieve Inventory"
            choices: VecDeque::from([Some(2), Some(1)]),
            confirms: VecDeque::from([true]),
            ..Default::default()
        };

        let mut session = Session::new(&app, prompter, CancellationToken::new()).without_progress();
        session.run(Some(VaultName::new("photos"))).await.unwrap();
        let prompter = session.into_prompter();

        // second round offered the vault list, where EXIT was picked
        assert_eq!(prompter.offered.len(), 2);
        assert_eq!(
            glacier.count_calls(|c| matches!(c, Call::DeleteVault(_))).await,
            1
        );
    }

    #[tokio::test]
    async fn retrieve_inventory_starts_a_job() {
        let glacier = Arc::new(InMemoryGlacier::new().with_vault(Vault::new("photos")));
        let app = app(&glacier);
        let prompter = ScriptedPrompter {
            choices: VecDeque::from([Some(0)]),
            ..Default::default()
        };

        let mut session = Session::new(&app, prompter, CancellationToken::new()).without_progress();
        session.run(Some(VaultName::new("photos"))).await.unwrap();

        assert_eq!(
            glacier
                .count_calls(|c| matches!(c, Call::InitiateInventoryJob(_)))
                .await,
            1
        );
    }
}
