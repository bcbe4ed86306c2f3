//! Application context: unified state passed to every command handler.
//!
//! Holds the output settings and one instance of every infrastructure
//! adapter, so command handlers take a single `&AppContext`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::application::ports::ConfigStore;
use crate::domain::DockhandConfig;
use crate::domain::credentials::KEY_PASSPHRASE_ENV;
use crate::infra::azure::AzCli;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::crypto::LocalKeyGenerator;
use crate::infra::fs::DiskFs;
use crate::infra::probe::HttpProbe;
use crate::infra::registry::RegistryFile;
use crate::infra::ssh::SshConnector;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Env vars that skip interactive prompts.
pub const NON_INTERACTIVE_ENV: [&str; 2] = ["CI", "DOCKHAND_YES"];

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Global command-line switches that shape the context.
#[derive(Debug, Default)]
pub struct AppFlags {
    pub json: bool,
    pub quiet: bool,
    pub no_color: bool,
    /// `--yes`; `CI` and `DOCKHAND_YES` have the same effect.
    pub yes: bool,
    /// Overrides `azure.subscription` from the config file.
    pub subscription: Option<String>,
}

/// Everything a command handler needs: output settings, loaded config and
/// one instance of each adapter.
pub struct AppContext {
    pub output: OutputContext,
    pub mode: OutputMode,
    /// Prompts answer with their default.
    pub non_interactive: bool,
    pub config_store: YamlConfigStore,
    pub config: DockhandConfig,
    pub registry: RegistryFile,
    /// Cloud resources and the secret vault, both through the `az` CLI.
    pub cloud: AzCli<TokioCommandRunner>,
    pub connector: SshConnector,
    pub keys: LocalKeyGenerator,
    pub fs: DiskFs,
    pub probe: HttpProbe,
    /// Unlocks encrypted login keys; from `DOCKHAND_KEY_PASSPHRASE`.
    pub key_passphrase: Option<String>,
    /// Fired on Ctrl-C.
    pub cancel: CancellationToken,
}

impl AppContext {
    /// Load configuration and wire the adapters.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or the home
    /// directory cannot be determined.
    pub fn new(flags: &AppFlags, cancel: CancellationToken) -> Result<Self> {
        let non_interactive =
            flags.yes || NON_INTERACTIVE_ENV.iter().any(|var| std::env::var_os(var).is_some());
        let mode = if flags.json { OutputMode::Json } else { OutputMode::Human };

        let key_passphrase = std::env::var(KEY_PASSPHRASE_ENV)
            .ok()
            .filter(|p| !p.is_empty());

        let config_store = YamlConfigStore::default();
        let config = config_store.load()?;
        let subscription = flags
            .subscription
            .clone()
            .or_else(|| config.azure.subscription.clone());

        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            mode,
            non_interactive,
            config_store,
            config,
            registry: RegistryFile::new()?,
            cloud: AzCli::default_runner(subscription),
            connector: SshConnector::default().with_key_passphrase(key_passphrase.clone()),
            keys: LocalKeyGenerator,
            fs: DiskFs,
            probe: HttpProbe::default(),
            key_passphrase,
            cancel,
        })
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Renderer matching `--json`.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter for services; silent in JSON mode.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::with_silence(&self.output, self.is_json())
    }

    /// Default local directory for a host's keys and certificates.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn credentials_dir(host: &str) -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".dockhand").join("hosts").join(host))
    }

    /// Yes/no prompt; answers `default` without asking when non-interactive.
    ///
    /// # Errors
    ///
    /// Fails when the prompt cannot be shown, e.g. without a TTY.
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .context("confirmation prompt failed")
    }
}
