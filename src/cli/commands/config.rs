//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
///
/// `config_path` is the file given with `--config`, if any.
pub fn run_config(action: &ConfigAction, config_path: Option<PathBuf>, settings: Settings) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::info(&format!("Config file exists: {}", config_path.display()));
                Output::info("Use --force to overwrite it with defaults.");
                return Ok(());
            }

            Settings::default().save_to(&config_path)?;
            Output::success(&format!("Created config file: {}", config_path.display()));

            let data_dir = settings.data_dir();
            if !data_dir.exists() {
                std::fs::create_dir_all(&data_dir)?;
                Output::success(&format!("Created data directory: {}", data_dir.display()));
            }
        }
    }

    Ok(())
}
