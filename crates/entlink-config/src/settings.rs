//! Settings model
//!
//! Every section carries `#[serde(default)]`, so a settings file only needs the
//! values the user changed. Anything missing falls back to [`Settings::default`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding [`Settings::contact_email`].
pub const ENV_CONTACT_EMAIL: &str = "ENTLINK_CONTACT_EMAIL";
/// Environment variable overriding [`Settings::target_folder`].
pub const ENV_TARGET_FOLDER: &str = "ENTLINK_TARGET_FOLDER";
/// Environment variable overriding [`EndpointConfig::openalex_url`].
pub const ENV_OPENALEX_URL: &str = "ENTLINK_OPENALEX_URL";

/// User settings for entity linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Email added to OpenAlex requests to join the polite pool
    /// (faster and more consistent response times). Ignored unless it looks
    /// like an email address.
    pub contact_email: String,

    /// Vault-relative folder where new entity notes are created.
    /// Empty means the vault root.
    pub target_folder: String,

    /// Overwrite front matter keys that already exist in a note.
    pub overwrite: bool,

    /// Command used to open linked notes (for example `code` or `vim`).
    /// When unset, the note location is only reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// Remote endpoints
    pub endpoints: EndpointConfig,

    /// HTTP client settings
    pub network: NetworkConfig,

    /// Interactive search behaviour
    pub search: SearchConfig,
}

/// Base URLs of the remote services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// OpenAlex API base URL
    pub openalex_url: String,
    /// Wikipedia base URL used for the redirect probe
    pub wikipedia_url: String,
    /// Wikidata base URL used for search links
    pub wikidata_url: String,
}

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Request timeout in seconds; unset keeps the transport default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Interactive search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before an autocomplete request is sent
    pub debounce_ms: u64,
    /// Open newly linked notes after writing them
    pub open_after_link: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            contact_email: String::new(),
            target_folder: String::new(),
            overwrite: false,
            editor: None,
            endpoints: EndpointConfig::default(),
            network: NetworkConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            openalex_url: "https://api.openalex.org".to_string(),
            wikipedia_url: "https://en.wikipedia.org".to_string(),
            wikidata_url: "https://www.wikidata.org".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: concat!("entlink/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            open_after_link: true,
        }
    }
}

impl NetworkConfig {
    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl SearchConfig {
    /// Debounce quiet period as a [`Duration`]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Settings {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe a stored setting.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(email) = non_blank(ENV_CONTACT_EMAIL) {
            self.contact_email = email;
        }
        if let Some(folder) = non_blank(ENV_TARGET_FOLDER) {
            self.target_folder = folder;
        }
        if let Some(url) = non_blank(ENV_OPENALEX_URL) {
            self.endpoints.openalex_url = url;
        }
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.contact_email.is_empty());
        assert!(settings.target_folder.is_empty());
        assert!(!settings.overwrite);
        assert_eq!(settings.endpoints.openalex_url, "https://api.openalex.org");
        assert_eq!(settings.search.debounce(), Duration::from_millis(300));
        assert!(settings.network.timeout().is_none());
    }

    #[test]
    fn test_partial_toml_merges_over_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            contact_email = "me@example.org"

            [search]
            debounce_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(settings.contact_email, "me@example.org");
        assert_eq!(settings.search.debounce_ms, 50);
        assert!(settings.search.open_after_link);
        assert_eq!(settings.endpoints, EndpointConfig::default());
        assert!(!settings.overwrite);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_CONTACT_EMAIL, "env@example.org"),
            (ENV_TARGET_FOLDER, "   "),
            (ENV_OPENALEX_URL, "http://localhost:9999"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings {
            target_folder: "Entities".to_string(),
            ..Default::default()
        };
        settings.apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(settings.contact_email, "env@example.org");
        assert_eq!(settings.target_folder, "Entities");
        assert_eq!(settings.endpoints.openalex_url, "http://localhost:9999");
    }

    #[test]
    fn test_toml_roundtrip_keeps_editor() {
        let settings = Settings {
            editor: Some("vim".to_string()),
            overwrite: true,
            ..Default::default()
        };
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
