//! Encyclopedia redirect probe for terms without a database identity.
//!
//! A Wikipedia search for an exact article title redirects to the article,
//! whose HTML names its canonical URL in a `<link rel="canonical">` element.
//! When no article matches, the search page itself is all we can offer.

use crate::error::{LinkerError, Result};
use crate::http::HttpExecutor;
use crate::types::{ConceptRecord, PropertyValue};
use entlink_config::EndpointConfig;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, info};
use url::Url;

static CANONICAL_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel="canonical"]"#).unwrap());

/// `href` of the first canonical link element in `html`
pub fn canonical_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&CANONICAL_LINK)
        .filter_map(|elem| elem.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}

/// Builds encyclopedia search links and follows them to canonical articles.
#[derive(Clone)]
pub struct EncyclopediaProbe {
    http: HttpExecutor,
    wikipedia_url: String,
    wikidata_url: String,
}

impl EncyclopediaProbe {
    /// Create a probe for the configured endpoints
    pub fn new(http: HttpExecutor, endpoints: &EndpointConfig) -> Self {
        Self {
            http,
            wikipedia_url: endpoints.wikipedia_url.clone(),
            wikidata_url: endpoints.wikidata_url.clone(),
        }
    }

    /// Wikipedia search URL for `name`
    pub fn wikipedia_search_url(&self, name: &str) -> Result<String> {
        search_url(&self.wikipedia_url, name)
    }

    /// Wikidata search URL for `name`; a link users can follow, not a resolved id
    pub fn wikidata_search_url(&self, name: &str) -> Result<String> {
        search_url(&self.wikidata_url, name)
    }

    /// Minimal record for a term with no database identity.
    ///
    /// `wikipedia` is the canonical article when one was found, otherwise the
    /// search URL verbatim. `wikidata` is always a search URL.
    pub async fn fallback_record(&self, name: &str) -> Result<ConceptRecord> {
        let search_url = self.wikipedia_search_url(name)?;
        let html = self.http.get_text(&search_url).await?;

        let wikipedia = match canonical_link(&html) {
            Some(article) => {
                info!("Resolved {:?} to {}", name, article);
                article
            }
            None => {
                debug!("No canonical article for {:?}, keeping the search link", name);
                search_url
            }
        };

        let mut identifiers = BTreeMap::new();
        identifiers.insert("wikipedia".to_string(), PropertyValue::Scalar(wikipedia));
        identifiers.insert(
            "wikidata".to_string(),
            PropertyValue::Scalar(self.wikidata_search_url(name)?),
        );

        Ok(ConceptRecord {
            display_name: name.to_string(),
            description: String::new(),
            identifiers,
            wikidata_entity_id: String::new(),
        })
    }
}

/// `<base>/w/index.php?search=<name>`
fn search_url(base: &str, name: &str) -> Result<String> {
    let mut url = Url::parse(base)
        .map_err(|e| LinkerError::Parse(format!("encyclopedia URL {:?}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| LinkerError::Parse(format!("encyclopedia URL {:?} cannot be a base", base)))?
        .pop_if_empty()
        .extend(["w", "index.php"]);
    url.query_pairs_mut().append_pair("search", name);
    Ok(url.into())
}
