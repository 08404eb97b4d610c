// Configuration loader
// Loads settings from a TOML file (explicit path or ~/.arwi/config.toml)
// and the API key from the environment

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::API_KEY_ENV;
use super::settings::Config;

/// Load configuration.
///
/// An explicit `path` must exist. Without one, `~/.arwi/config.toml` is used
/// when present and defaults otherwise. `GEMINI_API_KEY` always wins over a
/// key in the file.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => load_from_file(&path)?,
            _ => Config::default(),
        },
    };

    apply_env(&mut config, std::env::var(API_KEY_ENV).ok());

    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::info!(
        "API key loaded: {}",
        if config.api_key_loaded() { "yes" } else { "no" }
    );

    Ok(config)
}

/// `~/.arwi/config.toml`, if a home directory exists
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".arwi").join("config.toml"))
}

fn load_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn apply_env(config: &mut Config, api_key: Option<String>) {
    if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
        config.gemini.api_key = Some(key);
    }
}
