//! `dockhand keys`: local key material.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::ports::CredentialGenerator;
use crate::application::services::credentials::export_to_local_directory;
use crate::domain::CredentialBundle;

/// Keys subcommands.
#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Generate an SSH key pair and optionally a TLS certificate set
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Output directory
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Encrypt the private key with this passphrase
    #[arg(long, env = "DOCKHAND_KEY_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Comment stored in the public key
    #[arg(long, default_value = "dockhand")]
    pub comment: String,

    /// Also issue CA, server and client certificates for these host names
    #[arg(long = "tls-name", value_name = "NAME")]
    pub tls_names: Vec<String>,
}

/// Run a keys subcommand.
///
/// # Errors
///
/// Returns an error if generation or writing fails.
pub async fn run(app: &AppContext, cmd: &KeysCommand) -> Result<()> {
    match cmd {
        KeysCommand::Generate(args) => generate(app, args).await,
    }
}

async fn generate(app: &AppContext, args: &GenerateArgs) -> Result<()> {
    let mut bundle = CredentialBundle::default();
    bundle.ssh = Some(
        app.keys
            .ssh_key_pair(args.passphrase.as_deref(), &args.comment)?,
    );
    if !args.tls_names.is_empty() {
        bundle.tls = Some(app.keys.tls_bundle(&args.tls_names)?);
    }
    let written = export_to_local_directory(&app.fs, &args.out, &bundle).await?;
    app.renderer().render_files("keys generated", &args.out, &written)
}
