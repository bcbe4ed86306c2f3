//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Provision, secure and inventory remote Docker hosts
#[derive(Parser, Debug)]
#[command(
    name = "dockhand",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// More diagnostic logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Cloud subscription (overrides azure.subscription)
    #[arg(long, global = true, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a VM and configure Docker on it
    Create(commands::create::CreateArgs),

    /// List Docker hosts
    List(commands::list::ListArgs),

    /// Show one host
    Show(commands::HostArgs),

    /// Install and configure Docker on an existing VM
    Configure(commands::configure::ConfigureArgs),

    /// Delete a host
    Delete(commands::delete::DeleteArgs),

    /// List containers on a host
    Ps(commands::inventory::PsArgs),

    /// List images on a host
    Images(commands::HostArgs),

    /// Manage containers on a host
    #[command(subcommand)]
    Container(commands::container::ContainerCommand),

    /// Build a Dockerfile on a host and run it
    Deploy(commands::deploy::DeployArgs),

    /// Generate key material
    #[command(subcommand)]
    Keys(commands::keys::KeysCommand),

    /// Store or fetch credentials in a key vault
    #[command(subcommand)]
    Vault(commands::vault::VaultCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            yes,
            subscription,
            command,
        } = self;

        if matches!(command, Command::Version) {
            return commands::version::run(json);
        }

        let flags = AppFlags {
            json,
            quiet,
            no_color,
            yes,
            subscription,
        };
        let app = AppContext::new(&flags, cancel)?;

        match &command {
            Command::Create(args) => commands::create::run(&app, args).await,
            Command::List(args) => commands::list::run(&app, args).await,
            Command::Show(args) => commands::show::run(&app, args).await,
            Command::Configure(args) => commands::configure::run(&app, args).await,
            Command::Delete(args) => commands::delete::run(&app, args).await,
            Command::Ps(args) => commands::inventory::run_ps(&app, args).await,
            Command::Images(args) => commands::inventory::run_images(&app, args).await,
            Command::Container(cmd) => commands::container::run(&app, cmd).await,
            Command::Deploy(args) => commands::deploy::run(&app, args).await,
            Command::Keys(cmd) => commands::keys::run(&app, cmd).await,
            Command::Vault(cmd) => commands::vault::run(&app, cmd).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(json),
        }
    }
}
