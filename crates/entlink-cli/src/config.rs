//! Settings loading for CLI commands.
//!
//! Precedence: defaults, then the settings file, then `ENTLINK_*`
//! environment variables, then command flags.

use anyhow::{Context, Result};
use entlink_config::{Settings, SettingsStore};
use std::path::PathBuf;
use tracing::debug;

/// Open the settings store at `path`, or at the default location
pub async fn open_store(path: Option<PathBuf>) -> Result<SettingsStore> {
    let path = match path {
        Some(path) => path,
        None => SettingsStore::default_path().context("Could not determine config file path")?,
    };
    debug!("Using settings file {}", path.display());

    SettingsStore::open(&path)
        .await
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

/// Stored settings with environment overrides applied.
///
/// The overrides are never written back to the settings file.
pub fn effective_settings(store: &SettingsStore) -> Settings {
    let mut settings = store.settings().clone();
    settings.apply_env_overrides();
    settings
}

/// Load effective settings in one step
pub async fn load(path: Option<PathBuf>) -> Result<Settings> {
    let store = open_store(path).await?;
    Ok(effective_settings(&store))
}
