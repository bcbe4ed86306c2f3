//! `dockhand config`: show, read and set configuration values.

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;
use crate::domain::config::validate_config_key;

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Print one configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error for unknown keys, invalid values or an unwritable file.
pub fn run(app: &AppContext, cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Get { key } => get_config(app, key),
        ConfigCommand::Set { key, value } => set_config(app, key, value),
    }
}

fn show_config(app: &AppContext) -> Result<()> {
    let config = config_service::load_config(&app.config_store)?;
    let path = app.config_store.path()?;
    app.renderer().render_config(&config, &path)
}

fn get_config(app: &AppContext, key: &str) -> Result<()> {
    validate_config_key(key)?;
    let config = config_service::load_config(&app.config_store)?;
    let value = config.get(key).unwrap_or_default();
    app.renderer().render_config_value(key, &value)
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<()> {
    config_service::set_value(&app.config_store, key, value)?;
    if app.is_json() {
        return app.renderer().render_config_value(key, value);
    }
    app.output.success(&format!("Set {key} = {value}"));
    Ok(())
}
