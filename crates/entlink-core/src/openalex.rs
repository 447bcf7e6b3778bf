//! OpenAlex concept endpoints.
//!
//! Two calls are used: the concept autocomplete endpoint for incremental
//! search and the concept record endpoint for resolution. Both append the
//! polite-pool `mailto` parameter when a contact email that looks like an
//! address is configured.

use crate::error::{LinkerError, Result};
use crate::http::HttpExecutor;
use entlink_config::Settings;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

/// Local part, `@`, and a domain containing a dot. Not RFC validation.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());

/// Whether `email` has the rough shape of an email address
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// One hit from the autocomplete endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AutocompleteHit {
    /// Concept name
    pub display_name: String,
    /// Context line (usually the concept's field)
    #[serde(default)]
    pub hint: Option<String>,
    /// Concept URL (`https://openalex.org/C41008148`)
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    results: Vec<AutocompleteHit>,
}

/// Client for the OpenAlex concept API.
#[derive(Clone)]
pub struct OpenAlexClient {
    http: HttpExecutor,
    base_url: String,
    mailto: Option<String>,
}

impl OpenAlexClient {
    /// Create a client for `base_url`.
    ///
    /// `contact_email` is only sent when it passes [`is_valid_email`];
    /// anything else is dropped without error.
    pub fn new(http: HttpExecutor, base_url: impl Into<String>, contact_email: &str) -> Self {
        let mailto = if contact_email.is_empty() {
            None
        } else if is_valid_email(contact_email) {
            Some(contact_email.to_string())
        } else {
            debug!("Contact email {:?} does not look like an address, omitting mailto", contact_email);
            None
        };

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mailto,
        }
    }

    /// Create a client from user settings
    pub fn from_settings(http: HttpExecutor, settings: &Settings) -> Self {
        Self::new(http, &settings.endpoints.openalex_url, &settings.contact_email)
    }

    /// The `mailto` value that will be sent, if any
    pub fn mailto(&self) -> Option<&str> {
        self.mailto.as_deref()
    }

    /// `<base>/autocomplete/concepts?q=<query>[&mailto=<email>]`
    pub fn autocomplete_url(&self, query: &str) -> Result<Url> {
        let mut url = self.endpoint(&["autocomplete", "concepts"])?;
        url.query_pairs_mut().append_pair("q", query);
        self.append_mailto(&mut url);
        Ok(url)
    }

    /// `<base>/concepts/<id>[?mailto=<email>]`
    pub fn concept_url(&self, source_id: &str) -> Result<Url> {
        let mut url = self.endpoint(&["concepts", source_id])?;
        self.append_mailto(&mut url);
        Ok(url)
    }

    /// Query the autocomplete endpoint
    pub async fn autocomplete(&self, query: &str) -> Result<Vec<AutocompleteHit>> {
        let url = self.autocomplete_url(query)?;
        let response: AutocompleteResponse = self.http.get_json(url.as_str()).await?;
        debug!("Autocomplete {:?}: {} hits", query, response.results.len());
        Ok(response.results)
    }

    /// Fetch the raw concept record
    pub async fn concept(&self, source_id: &str) -> Result<Map<String, Value>> {
        let url = self.concept_url(source_id)?;
        match self.http.get_json::<Value>(url.as_str()).await? {
            Value::Object(record) => Ok(record),
            _ => Err(LinkerError::Parse(format!(
                "concept {}: expected a JSON object",
                source_id
            ))),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| LinkerError::Parse(format!("OpenAlex URL {:?}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| LinkerError::Parse(format!("OpenAlex URL {:?} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn append_mailto(&self, url: &mut Url) {
        if let Some(email) = &self.mailto {
            url.query_pairs_mut().append_pair("mailto", email);
        }
    }
}
