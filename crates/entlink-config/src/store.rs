//! Settings persistence
//!
//! [`SettingsStore`] owns the settings file path and the loaded [`Settings`].
//! Each setter writes the whole file before returning; there is no batching.

use crate::{ConfigError, Result, Settings};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Example settings file written by [`SettingsStore::write_example`].
pub const EXAMPLE_SETTINGS: &str = r#"# entlink configuration
# Location: ~/.config/entlink/config.toml

# Email added to OpenAlex API requests (joins the polite pool for faster
# and more consistent response times). Leave empty to send none.
contact_email = ""

# Vault-relative folder for new entity notes ("" = vault root)
target_folder = "Entities"

# Overwrite front matter keys that already exist in a note
overwrite = false

# Command used to open linked notes
# editor = "vim"

[endpoints]
openalex_url = "https://api.openalex.org"
wikipedia_url = "https://en.wikipedia.org"
wikidata_url = "https://www.wikidata.org"

[network]
# Request timeout in seconds (unset = transport default)
# timeout_secs = 30

[search]
# Quiet period before an autocomplete request is sent
debounce_ms = 300
# Open newly linked notes after writing them
open_after_link = true
"#;

/// Loaded settings bound to the file they persist to.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Default settings file path (`<config_dir>/entlink/config.toml`)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("entlink").join("config.toml"))
    }

    /// Open the settings file at the default location
    pub async fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?).await
    }

    /// Load settings from `path`, merging stored values over defaults.
    ///
    /// A missing file yields the defaults; nothing is written until a setter
    /// is called.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = Self::load(&path).await?;
        Ok(Self { path, settings })
    }

    async fn load(path: &Path) -> Result<Settings> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                debug!("Loading settings from {}", path.display());
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                Ok(Settings::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Settings file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set the polite-pool contact email and persist
    pub async fn set_contact_email(&mut self, email: impl Into<String>) -> Result<()> {
        self.settings.contact_email = email.into();
        self.save().await
    }

    /// Set the folder for new entity notes and persist
    pub async fn set_target_folder(&mut self, folder: impl Into<String>) -> Result<()> {
        self.settings.target_folder = folder.into();
        self.save().await
    }

    /// Set the overwrite policy and persist
    pub async fn set_overwrite(&mut self, overwrite: bool) -> Result<()> {
        self.settings.overwrite = overwrite;
        self.save().await
    }

    /// Apply an arbitrary change and persist
    pub async fn update<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        change(&mut self.settings);
        self.save().await
    }

    /// Write the current settings to disk
    pub async fn save(&self) -> Result<()> {
        let contents = self.settings.to_toml()?;
        self.ensure_parent().await?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })?;
        info!("Saved settings to {}", self.path.display());
        Ok(())
    }

    /// Write [`EXAMPLE_SETTINGS`] to the store path, replacing any file there
    pub async fn write_example(&self) -> Result<()> {
        self.ensure_parent().await?;
        tokio::fs::write(&self.path, EXAMPLE_SETTINGS)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })
    }

    async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ConfigError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_settings_parse() {
        let settings: Settings = toml::from_str(EXAMPLE_SETTINGS).unwrap();
        assert_eq!(settings.target_folder, "Entities");
        assert!(settings.editor.is_none());
        assert_eq!(settings.search.debounce_ms, 300);
    }
}
