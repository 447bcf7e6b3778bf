//! # entlink-core
//!
//! Links notes to OpenAlex concepts.
//!
//! The flow is: a debounced autocomplete search produces [`Suggestion`]s, the
//! user picks one, the [`EntityResolver`] turns it into a [`ConceptRecord`]
//! (falling back to an encyclopedia search link for unmatched terms), and the
//! record is merged into the note's YAML front matter through a
//! [`DocumentStore`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use entlink_config::Settings;
//! use entlink_core::{Linker, LinkerError, PickerAction, Suggestion, SuggestionPicker, VaultStore};
//! use std::sync::Arc;
//!
//! struct FirstHit;
//!
//! #[async_trait::async_trait]
//! impl SuggestionPicker for FirstHit {
//!     async fn pick(&mut self, suggestions: &[Suggestion]) -> PickerAction {
//!         if suggestions.is_empty() {
//!             PickerAction::Cancel
//!         } else {
//!             PickerAction::Select(0)
//!         }
//!     }
//! }
//!
//! # async fn example() -> Result<(), LinkerError> {
//! let linker = Linker::new(Settings::default(), Arc::new(VaultStore::new("./vault")));
//! if let Some(outcome) = linker.link_selection("machine learning", &mut FirstHit).await? {
//!     println!("linked {}", outcome.path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod debounce;
pub mod encyclopedia;
pub mod error;
pub mod frontmatter;
pub mod http;
pub mod openalex;
pub mod resolver;
pub mod search;
pub mod store;
pub mod types;

pub use controller::{
    note_path, LinkOutcome, LinkPhase, LinkSession, LinkTarget, Linker, PickerAction,
    SuggestionPicker,
};
pub use debounce::Debouncer;
pub use encyclopedia::EncyclopediaProbe;
pub use error::{LinkerError, Result};
pub use frontmatter::{merge, FrontMatter, MergeReport, ParsedDocument};
pub use http::{HttpExecutor, HttpRequest, HttpResponse};
pub use openalex::{is_valid_email, AutocompleteHit, OpenAlexClient};
pub use resolver::{flatten_concept, EntityResolver};
pub use search::{ConceptSearch, DebouncedSearch};
pub use store::{DocumentHandle, DocumentStore, FrontMatterMutator, VaultStore, ViewOptions};
pub use types::{short_id, ConceptRecord, Identity, PropertySet, PropertyValue, Suggestion};
