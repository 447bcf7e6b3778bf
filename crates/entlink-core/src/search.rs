//! Concept autocomplete search

use crate::debounce::Debouncer;
use crate::error::Result;
use crate::openalex::{AutocompleteHit, OpenAlexClient};
use crate::types::{short_id, Identity, Suggestion};
use std::time::Duration;
use tracing::debug;

/// Autocomplete search against OpenAlex concepts.
#[derive(Clone)]
pub struct ConceptSearch {
    client: OpenAlexClient,
}

impl ConceptSearch {
    /// Create a search over `client`
    pub fn new(client: OpenAlexClient) -> Self {
        Self { client }
    }

    /// Suggestions for `query`.
    ///
    /// Blank queries return nothing without a request. When the endpoint has
    /// no hits, a single "create empty note" suggestion carrying the query is
    /// returned so the user can still link an unmatched term.
    pub async fn search(&self, query: &str) -> Result<Vec<Suggestion>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let suggestions: Vec<Suggestion> = self
            .client
            .autocomplete(query)
            .await?
            .into_iter()
            .map(to_suggestion)
            .collect();

        if suggestions.is_empty() {
            debug!("No concepts match {:?}, offering an empty note", query);
            return Ok(vec![Suggestion::create_empty(query)]);
        }

        Ok(suggestions)
    }
}

fn to_suggestion(hit: AutocompleteHit) -> Suggestion {
    Suggestion {
        identity: hit.id.as_deref().map(|id| Identity {
            source_id: short_id(id).to_string(),
        }),
        display_name: hit.display_name,
        hint: hit.hint.unwrap_or_default(),
    }
}

/// [`ConceptSearch`] behind a [`Debouncer`], for per-keystroke querying.
pub struct DebouncedSearch {
    debouncer: Debouncer<String, Vec<Suggestion>>,
}

impl DebouncedSearch {
    /// Debounce `search` with a `wait` quiet period
    pub fn new(search: ConceptSearch, wait: Duration) -> Self {
        let debouncer = Debouncer::new(wait, move |query: String| {
            let search = search.clone();
            async move { search.search(&query).await }
        });
        Self { debouncer }
    }

    /// Query as the user types.
    ///
    /// Blank text resolves immediately to no suggestions and does not disturb
    /// a pending request. Otherwise the call joins the pending debounce slot
    /// and resolves with the result for the latest text.
    pub async fn query(&self, text: &str) -> Result<Vec<Suggestion>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.debouncer.call(text.to_string()).await
    }
}
