//! Linking workflow: query, pick a suggestion, resolve it, commit to a note.
//!
//! A [`LinkSession`] walks one action through [`LinkPhase`]. [`Linker`] is
//! the user-facing entry point that drives a session with a
//! [`SuggestionPicker`].

use crate::encyclopedia::EncyclopediaProbe;
use crate::error::{LinkerError, Result};
use crate::frontmatter::{merge, FrontMatter, MergeReport};
use crate::http::HttpExecutor;
use crate::openalex::OpenAlexClient;
use crate::resolver::EntityResolver;
use crate::search::{ConceptSearch, DebouncedSearch};
use crate::store::{DocumentHandle, DocumentStore, ViewOptions};
use crate::types::{ConceptRecord, Suggestion};
use async_trait::async_trait;
use entlink_config::Settings;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where a linking session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// Nothing in flight
    Idle,
    /// Waiting on autocomplete
    Querying,
    /// Suggestions available for picking
    Suggesting,
    /// Fetching the chosen concept
    Resolving,
    /// Writing the concept into a note
    Committing,
    /// Transient: a failing step passes through here on its way back to
    /// `Idle`. Only the log and [`LinkSession::last_error`] record it.
    Failed,
}

impl fmt::Display for LinkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Querying => "querying",
            Self::Suggesting => "suggesting",
            Self::Resolving => "resolving",
            Self::Committing => "committing",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Note that receives the resolved concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// `<target_folder>/<display_name>.md`, created when missing
    NewNote,
    /// An existing note the user is working in
    ActiveNote(PathBuf),
}

/// Result of a committed link.
#[derive(Debug, Clone)]
pub struct LinkOutcome {
    /// Vault-relative note path
    pub path: PathBuf,
    /// Whether the note was created by this link
    pub created: bool,
    /// Front matter changes
    pub report: MergeReport,
    /// The concept written into the note
    pub record: ConceptRecord,
    /// Whether the note was opened in a view
    pub opened: bool,
}

/// The user's response to a list of suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerAction {
    /// Link the suggestion at this index
    Select(usize),
    /// Search again with new text
    Refine(String),
    /// Stop without linking
    Cancel,
}

/// Presents suggestions and reports what the user chose.
#[async_trait]
pub trait SuggestionPicker: Send {
    /// Choose from `suggestions`, which may be empty
    async fn pick(&mut self, suggestions: &[Suggestion]) -> PickerAction;
}

/// Vault-relative path of the note for `display_name` inside `folder`.
///
/// Path separators and characters notes cannot carry in their names are
/// replaced with `-`, so the name always stays a single path component.
pub fn note_path(folder: &str, display_name: &str) -> PathBuf {
    let file_name: String = display_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect();
    let file_name = format!("{}.md", file_name);

    let folder = folder.trim().trim_matches('/');
    if folder.is_empty() {
        PathBuf::from(file_name)
    } else {
        Path::new(folder).join(file_name)
    }
}

struct SessionState {
    phase: LinkPhase,
    suggestions: Vec<Suggestion>,
    last_error: Option<LinkerError>,
}

/// One linking interaction.
///
/// The session owns its debounced search, so pending autocomplete calls are
/// cancelled when the session is dropped.
pub struct LinkSession {
    settings: Settings,
    search: DebouncedSearch,
    resolver: EntityResolver,
    store: Arc<dyn DocumentStore>,
    state: Mutex<SessionState>,
}

impl LinkSession {
    /// Create a session over `store`
    pub fn new(settings: Settings, http: HttpExecutor, store: Arc<dyn DocumentStore>) -> Self {
        let openalex = OpenAlexClient::from_settings(http.clone(), &settings);
        let search = DebouncedSearch::new(
            ConceptSearch::new(openalex.clone()),
            settings.search.debounce(),
        );
        let resolver = EntityResolver::new(
            openalex,
            EncyclopediaProbe::new(http, &settings.endpoints),
        );

        Self {
            settings,
            search,
            resolver,
            store,
            state: Mutex::new(SessionState {
                phase: LinkPhase::Idle,
                suggestions: Vec::new(),
                last_error: None,
            }),
        }
    }

    /// Current phase
    pub fn phase(&self) -> LinkPhase {
        self.state.lock().phase
    }

    /// Suggestions from the latest successful query
    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.state.lock().suggestions.clone()
    }

    /// The failure that last sent the session back to idle
    pub fn last_error(&self) -> Option<LinkerError> {
        self.state.lock().last_error.clone()
    }

    /// Search for `text` through the debounced autocomplete.
    ///
    /// Concurrent calls collapse: every caller in a burst receives the
    /// suggestions for the last text. A call overtaken by a newer one while
    /// its request was in flight gets [`LinkerError::Cancelled`] and leaves
    /// the session untouched.
    pub async fn query(&self, text: &str) -> Result<Vec<Suggestion>> {
        self.enter(LinkPhase::Querying);

        match self.search.query(text).await {
            Ok(suggestions) => {
                let mut state = self.state.lock();
                state.suggestions = suggestions.clone();
                if state.phase == LinkPhase::Querying {
                    state.phase = LinkPhase::Suggesting;
                }
                Ok(suggestions)
            }
            Err(LinkerError::Cancelled) => {
                debug!("Query {:?} superseded by newer input", text);
                Err(LinkerError::Cancelled)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Resolve `suggestion` and merge it into the note named by `target`.
    ///
    /// Resolution happens before any document is touched, so a resolution
    /// failure never leaves a note behind. A merge failure after the note was
    /// created is reported as [`LinkerError::PlaceholderLeft`].
    pub async fn commit(&self, suggestion: &Suggestion, target: LinkTarget) -> Result<LinkOutcome> {
        self.enter(LinkPhase::Resolving);
        let record = match self.resolver.resolve(suggestion).await {
            Ok(record) => record,
            Err(e) => return Err(self.fail(e)),
        };

        self.enter(LinkPhase::Committing);
        let (path, open_after) = match &target {
            LinkTarget::NewNote => (
                note_path(&self.settings.target_folder, &record.display_name),
                self.settings.search.open_after_link,
            ),
            LinkTarget::ActiveNote(path) => (path.clone(), false),
        };

        let (handle, created) = match self.locate(&path, &target).await {
            Ok(found) => found,
            Err(e) => return Err(self.fail(e)),
        };

        let properties = record.to_property_set();
        let overwrite = self.settings.overwrite;
        let report = match self
            .store
            .update_front_matter(
                &handle,
                Box::new(move |front_matter: &mut FrontMatter| {
                    merge(front_matter, &properties, overwrite)
                }),
            )
            .await
        {
            Ok(report) => report,
            Err(e) if created => {
                warn!(
                    "Linking {:?} failed after creating {}; an empty note was left behind",
                    record.display_name,
                    path.display()
                );
                return Err(self.fail(LinkerError::PlaceholderLeft {
                    path,
                    source: Box::new(e),
                }));
            }
            Err(e) => return Err(self.fail(e)),
        };

        let opened = open_after && self.open(&handle).await;

        info!(
            "Linked {} to {:?} ({} added, {} overwritten, {} kept)",
            path.display(),
            record.display_name,
            report.added.len(),
            report.overwritten.len(),
            report.kept.len()
        );
        self.enter(LinkPhase::Idle);

        Ok(LinkOutcome {
            path,
            created,
            report,
            record,
            opened,
        })
    }

    /// Handle for the target note. New notes are created when missing; an
    /// active note must already exist.
    async fn locate(&self, path: &Path, target: &LinkTarget) -> Result<(DocumentHandle, bool)> {
        if let Some(handle) = self.store.find(path).await? {
            return Ok((handle, false));
        }
        if let LinkTarget::ActiveNote(_) = target {
            return Err(LinkerError::Document {
                path: path.to_path_buf(),
                reason: "note does not exist".to_string(),
            });
        }
        debug!("{} does not exist yet, creating it", path.display());
        let handle = self.store.create(path, "").await?;
        Ok((handle, true))
    }

    async fn open(&self, handle: &DocumentHandle) -> bool {
        match self
            .store
            .open_in_view(handle, ViewOptions { new_tab: true })
            .await
        {
            Ok(()) => true,
            Err(e) => {
                // The note is already linked
                warn!("Could not open {}: {}", handle.path.display(), e);
                false
            }
        }
    }

    fn enter(&self, phase: LinkPhase) {
        let mut state = self.state.lock();
        debug!("Link session {} -> {}", state.phase, phase);
        state.phase = phase;
    }

    /// Report `err` and return to `Idle`. `Failed` is held only for the
    /// duration of the lock, so callers never observe it.
    fn fail(&self, err: LinkerError) -> LinkerError {
        let mut state = self.state.lock();
        error!("Link failed while {}: {}", state.phase, err);
        state.phase = LinkPhase::Failed;
        state.last_error = Some(err.clone());
        debug!("Link session {} -> {}", state.phase, LinkPhase::Idle);
        state.phase = LinkPhase::Idle;
        err
    }
}

/// Entry point for the two linking commands.
#[derive(Clone)]
pub struct Linker {
    settings: Settings,
    http: HttpExecutor,
    store: Arc<dyn DocumentStore>,
}

impl Linker {
    /// Create a linker over `store` using the network settings in `settings`
    pub fn new(settings: Settings, store: Arc<dyn DocumentStore>) -> Self {
        let http = HttpExecutor::new(&settings.network);
        Self::with_http(settings, http, store)
    }

    /// Create a linker with an existing HTTP executor
    pub fn with_http(settings: Settings, http: HttpExecutor, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            settings,
            http,
            store,
        }
    }

    /// Settings used by new sessions
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start a fresh session
    pub fn session(&self) -> LinkSession {
        LinkSession::new(self.settings.clone(), self.http.clone(), Arc::clone(&self.store))
    }

    /// Link the selected text to a concept note in the target folder.
    ///
    /// Returns `Ok(None)` when the user cancels.
    pub async fn link_selection(
        &self,
        selection: &str,
        picker: &mut dyn SuggestionPicker,
    ) -> Result<Option<LinkOutcome>> {
        self.run(selection, LinkTarget::NewNote, picker).await
    }

    /// Link the note at `path` to the concept matching its title.
    ///
    /// The note is updated in place and never opened in a new view.
    pub async fn link_active_note(
        &self,
        path: &Path,
        picker: &mut dyn SuggestionPicker,
    ) -> Result<Option<LinkOutcome>> {
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| LinkerError::InvalidPath(format!("no note title in {}", path.display())))?;

        self.run(&title, LinkTarget::ActiveNote(path.to_path_buf()), picker)
            .await
    }

    async fn run(
        &self,
        query: &str,
        target: LinkTarget,
        picker: &mut dyn SuggestionPicker,
    ) -> Result<Option<LinkOutcome>> {
        let session = self.session();
        let mut suggestions = session.query(query).await?;

        loop {
            match picker.pick(&suggestions).await {
                PickerAction::Select(index) => {
                    let suggestion = suggestions.get(index).cloned().ok_or_else(|| {
                        LinkerError::NoSuchSuggestion {
                            index,
                            available: suggestions.len(),
                        }
                    })?;
                    return session.commit(&suggestion, target).await.map(Some);
                }
                PickerAction::Refine(text) => {
                    debug!("Refining search to {:?}", text);
                    suggestions = session.query(&text).await?;
                }
                PickerAction::Cancel => {
                    info!("Linking cancelled");
                    return Ok(None);
                }
            }
        }
    }
}
