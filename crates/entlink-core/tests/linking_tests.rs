//! End-to-end linking against a mock OpenAlex/Wikipedia server and a
//! temporary vault.

use async_trait::async_trait;
use entlink_config::Settings;
use entlink_core::{
    DocumentHandle, DocumentStore, FrontMatterMutator, HttpExecutor, LinkPhase, LinkSession,
    LinkTarget, Linker, LinkerError, MergeReport, ParsedDocument, PickerAction, Suggestion,
    SuggestionPicker, VaultStore, ViewOptions,
};
use serde_json::json;
use serde_yaml::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Replays a fixed list of picker actions, then cancels.
struct ScriptedPicker {
    actions: VecDeque<PickerAction>,
    offered: Vec<Vec<Suggestion>>,
}

impl ScriptedPicker {
    fn new(actions: impl IntoIterator<Item = PickerAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
            offered: Vec::new(),
        }
    }
}

#[async_trait]
impl SuggestionPicker for ScriptedPicker {
    async fn pick(&mut self, suggestions: &[Suggestion]) -> PickerAction {
        self.offered.push(suggestions.to_vec());
        self.actions.pop_front().unwrap_or(PickerAction::Cancel)
    }
}

/// Vault store that counts views and can refuse front matter updates.
struct ObservedStore {
    inner: VaultStore,
    opened: AtomicUsize,
    refuse_updates: bool,
}

impl ObservedStore {
    fn new(root: &Path) -> Self {
        Self {
            inner: VaultStore::new(root),
            opened: AtomicUsize::new(0),
            refuse_updates: false,
        }
    }
}

#[async_trait]
impl DocumentStore for ObservedStore {
    async fn find(&self, path: &Path) -> entlink_core::Result<Option<DocumentHandle>> {
        self.inner.find(path).await
    }

    async fn create(&self, path: &Path, initial_content: &str) -> entlink_core::Result<DocumentHandle> {
        self.inner.create(path, initial_content).await
    }

    async fn update_front_matter(
        &self,
        handle: &DocumentHandle,
        mutator: FrontMatterMutator<'_>,
    ) -> entlink_core::Result<MergeReport> {
        if self.refuse_updates {
            return Err(LinkerError::Document {
                path: handle.path.clone(),
                reason: "read-only".to_string(),
            });
        }
        self.inner.update_front_matter(handle, mutator).await
    }

    async fn open_in_view(&self, handle: &DocumentHandle, options: ViewOptions) -> entlink_core::Result<()> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open_in_view(handle, options).await
    }
}

fn settings_for(server: &MockServer, target_folder: &str) -> Settings {
    let mut settings = Settings::default();
    settings.contact_email = "me@example.org".to_string();
    settings.target_folder = target_folder.to_string();
    settings.endpoints.openalex_url = server.uri();
    settings.endpoints.wikipedia_url = server.uri();
    settings.search.debounce_ms = 5;
    settings
}

fn front_matter_of(vault: &TempDir, relative: &str) -> ParsedDocument {
    let content = std::fs::read_to_string(vault.path().join(relative)).unwrap();
    ParsedDocument::parse(&content).unwrap()
}

fn text(document: &ParsedDocument, key: &str) -> Option<String> {
    document
        .front_matter
        .get(&Value::String(key.to_string()))
        .and_then(Value::as_str)
        .map(str::to_string)
}

async fn mount_machine_learning(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/autocomplete/concepts"))
        .and(query_param("q", "machine learning"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": "https://openalex.org/C123",
                "display_name": "Machine learning",
                "hint": "Computer science"
            }]
        })))
        .mount(server)
        .await;
}

async fn mount_concept(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/concepts/C123"))
        .and(query_param("mailto", "me@example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "https://openalex.org/C123",
            "wikidata": "https://www.wikidata.org/wiki/Q2539",
            "display_name": "Machine learning",
            "description": "branch of statistics and computer science",
            "level": 1,
            "works_count": 3000000,
            "ids": {
                "openalex": "https://openalex.org/C123",
                "wikidata": "https://www.wikidata.org/wiki/Q2539",
                "wikipedia": "https://en.wikipedia.org/wiki/Machine_learning",
                "mag": 119857082
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_link_existing_note_keeps_present_keys() {
    let server = MockServer::start().await;
    mount_machine_learning(&server).await;
    mount_concept(&server).await;

    let vault = TempDir::new().unwrap();
    std::fs::create_dir_all(vault.path().join("Entities")).unwrap();
    std::fs::write(
        vault.path().join("Entities/Machine learning.md"),
        "---\ndescription: old\n---\nMy notes\n",
    )
    .unwrap();

    let linker = Linker::new(
        settings_for(&server, "Entities"),
        Arc::new(VaultStore::new(vault.path())),
    );
    let mut picker = ScriptedPicker::new([PickerAction::Select(0)]);

    let outcome = linker
        .link_selection("machine learning", &mut picker)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.path, PathBuf::from("Entities/Machine learning.md"));
    assert!(!outcome.created);
    assert_eq!(outcome.record.wikidata_entity_id, "Q2539");
    assert!(outcome.report.kept.contains(&"description".to_string()));
    assert!(outcome.report.added.contains(&"wikidata".to_string()));

    let document = front_matter_of(&vault, "Entities/Machine learning.md");
    assert_eq!(text(&document, "description").as_deref(), Some("old"));
    assert_eq!(
        text(&document, "wikidata").as_deref(),
        Some("https://www.wikidata.org/wiki/Q2539")
    );
    assert_eq!(text(&document, "wikidata_entity_id").as_deref(), Some("Q2539"));
    assert_eq!(text(&document, "mag").as_deref(), Some("119857082"));
    assert!(text(&document, "level").is_none());
    assert_eq!(document.body, "My notes\n");
}

#[tokio::test]
async fn test_overwrite_replaces_present_keys() {
    let server = MockServer::start().await;
    mount_machine_learning(&server).await;
    mount_concept(&server).await;

    let vault = TempDir::new().unwrap();
    std::fs::write(
        vault.path().join("Machine learning.md"),
        "---\ndescription: old\n---\n",
    )
    .unwrap();

    let mut settings = settings_for(&server, "");
    settings.overwrite = true;
    let linker = Linker::new(settings, Arc::new(VaultStore::new(vault.path())));

    let outcome = linker
        .link_selection("machine learning", &mut ScriptedPicker::new([PickerAction::Select(0)]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.report.overwritten, vec!["description".to_string()]);
    let document = front_matter_of(&vault, "Machine learning.md");
    assert_eq!(
        text(&document, "description").as_deref(),
        Some("branch of statistics and computer science")
    );
}

#[tokio::test]
async fn test_unmatched_term_links_search_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/autocomplete/concepts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(query_param("search", "zzdepartment of xyz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Search results</title></head></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let vault = TempDir::new().unwrap();
    let store = Arc::new(ObservedStore::new(vault.path()));
    let linker = Linker::new(settings_for(&server, ""), store.clone());
    let mut picker = ScriptedPicker::new([PickerAction::Select(0)]);

    let outcome = linker
        .link_selection("zzdepartment of xyz", &mut picker)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(picker.offered[0].len(), 1);
    assert!(picker.offered[0][0].identity.is_none());
    assert!(outcome.created);
    assert!(outcome.opened);
    assert_eq!(store.opened.load(Ordering::SeqCst), 1);

    let document = front_matter_of(&vault, "zzdepartment of xyz.md");
    assert_eq!(
        text(&document, "wikipedia"),
        Some(format!("{}/w/index.php?search=zzdepartment+of+xyz", server.uri()))
    );
    assert_eq!(
        text(&document, "wikidata").as_deref(),
        Some("https://www.wikidata.org/w/index.php?search=zzdepartment+of+xyz")
    );
    assert_eq!(text(&document, "description").as_deref(), Some(""));
    assert_eq!(text(&document, "wikidata_entity_id").as_deref(), Some(""));
}

#[tokio::test]
async fn test_unmatched_term_follows_canonical_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/autocomplete/concepts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><link rel="canonical" href="https://en.wikipedia.org/wiki/Graph_theory"></head></html>"#,
        ))
        .mount(&server)
        .await;

    let vault = TempDir::new().unwrap();
    let mut settings = settings_for(&server, "Entities");
    settings.search.open_after_link = false;
    let linker = Linker::new(settings, Arc::new(VaultStore::new(vault.path())));

    let outcome = linker
        .link_selection("Graph theory", &mut ScriptedPicker::new([PickerAction::Select(0)]))
        .await
        .unwrap()
        .unwrap();

    assert!(!outcome.opened);
    let document = front_matter_of(&vault, "Entities/Graph theory.md");
    assert_eq!(
        text(&document, "wikipedia").as_deref(),
        Some("https://en.wikipedia.org/wiki/Graph_theory")
    );
}

#[tokio::test]
async fn test_active_note_is_never_opened() {
    let server = MockServer::start().await;
    mount_machine_learning(&server).await;
    mount_concept(&server).await;

    let vault = TempDir::new().unwrap();
    std::fs::create_dir_all(vault.path().join("Reading")).unwrap();
    std::fs::write(vault.path().join("Reading/machine learning.md"), "Draft\n").unwrap();

    let store = Arc::new(ObservedStore::new(vault.path()));
    let linker = Linker::new(settings_for(&server, "Entities"), store.clone());

    let outcome = linker
        .link_active_note(
            Path::new("Reading/machine learning.md"),
            &mut ScriptedPicker::new([PickerAction::Select(0)]),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.path, PathBuf::from("Reading/machine learning.md"));
    assert!(!outcome.created);
    assert!(!outcome.opened);
    assert_eq!(store.opened.load(Ordering::SeqCst), 0);
    assert!(!vault.path().join("Entities").exists());

    let document = front_matter_of(&vault, "Reading/machine learning.md");
    assert_eq!(text(&document, "display_name").as_deref(), Some("Machine learning"));
    assert_eq!(document.body, "Draft\n");
}

#[tokio::test]
async fn test_refine_queries_again() {
    let server = MockServer::start().await;
    mount_machine_learning(&server).await;
    mount_concept(&server).await;
    Mock::given(method("GET"))
        .and(path("/autocomplete/concepts"))
        .and(query_param("q", "ml"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let vault = TempDir::new().unwrap();
    let linker = Linker::new(settings_for(&server, ""), Arc::new(VaultStore::new(vault.path())));
    let mut picker = ScriptedPicker::new([
        PickerAction::Refine("machine learning".to_string()),
        PickerAction::Select(0),
    ]);

    let outcome = linker
        .link_selection("ml", &mut picker)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(picker.offered.len(), 2);
    assert_eq!(picker.offered[1][0].display_name, "Machine learning");
    assert_eq!(outcome.path, PathBuf::from("Machine learning.md"));
}

#[tokio::test]
async fn test_cancel_leaves_vault_untouched() {
    let server = MockServer::start().await;
    mount_machine_learning(&server).await;

    let vault = TempDir::new().unwrap();
    let linker = Linker::new(settings_for(&server, ""), Arc::new(VaultStore::new(vault.path())));

    let outcome = linker
        .link_selection("machine learning", &mut ScriptedPicker::new([PickerAction::Cancel]))
        .await
        .unwrap();

    assert!(outcome.is_none());
    assert_eq!(std::fs::read_dir(vault.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_out_of_range_selection_is_rejected() {
    let server = MockServer::start().await;
    mount_machine_learning(&server).await;

    let vault = TempDir::new().unwrap();
    let linker = Linker::new(settings_for(&server, ""), Arc::new(VaultStore::new(vault.path())));

    let err = linker
        .link_selection("machine learning", &mut ScriptedPicker::new([PickerAction::Select(3)]))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LinkerError::NoSuchSuggestion {
            index: 3,
            available: 1
        }
    );
}

#[tokio::test]
async fn test_resolve_failure_resets_session() {
    let server = MockServer::start().await;
    mount_machine_learning(&server).await;
    Mock::given(method("GET"))
        .and(path("/concepts/C123"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let vault = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(VaultStore::new(vault.path()));
    let session = LinkSession::new(settings_for(&server, ""), HttpExecutor::default(), store);

    let suggestions = session.query("machine learning").await.unwrap();
    assert_eq!(session.phase(), LinkPhase::Suggesting);

    let err = session
        .commit(&suggestions[0], LinkTarget::NewNote)
        .await
        .unwrap_err();

    assert!(matches!(err, LinkerError::Status { status: 500, .. }));
    assert_eq!(session.phase(), LinkPhase::Idle);
    assert_eq!(session.last_error(), Some(err));
    assert!(!vault.path().join("Machine learning.md").exists());
}

#[tokio::test]
async fn test_query_failure_resets_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let vault = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(VaultStore::new(vault.path()));
    let session = LinkSession::new(settings_for(&server, ""), HttpExecutor::default(), store);

    assert!(session.query("rust").await.is_err());
    assert_eq!(session.phase(), LinkPhase::Idle);
    assert!(session.suggestions().is_empty());
}

#[tokio::test]
async fn test_merge_failure_after_create_reports_placeholder() {
    let server = MockServer::start().await;
    mount_machine_learning(&server).await;
    mount_concept(&server).await;

    let vault = TempDir::new().unwrap();
    let mut store = ObservedStore::new(vault.path());
    store.refuse_updates = true;
    let linker = Linker::new(settings_for(&server, "Entities"), Arc::new(store));

    let err = linker
        .link_selection("machine learning", &mut ScriptedPicker::new([PickerAction::Select(0)]))
        .await
        .unwrap_err();

    match err {
        LinkerError::PlaceholderLeft { path, source } => {
            assert_eq!(path, PathBuf::from("Entities/Machine learning.md"));
            assert!(matches!(*source, LinkerError::Document { .. }));
        }
        other => panic!("expected placeholder error, got {other:?}"),
    }
    assert_eq!(
        std::fs::read_to_string(vault.path().join("Entities/Machine learning.md")).unwrap(),
        ""
    );
}

#[tokio::test]
async fn test_slow_older_query_does_not_replace_newer_suggestions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/autocomplete/concepts"))
        .and(query_param("q", "ru"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "results": [{ "id": "https://openalex.org/C9", "display_name": "Ruthenium" }]
                }))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/autocomplete/concepts"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": "https://openalex.org/C1", "display_name": "Rust" }]
        })))
        .mount(&server)
        .await;

    let vault = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(VaultStore::new(vault.path()));
    let mut settings = settings_for(&server, "");
    settings.search.debounce_ms = 20;
    let session = LinkSession::new(settings, HttpExecutor::default(), store);

    let (older, newer) = tokio::join!(session.query("ru"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.query("rust").await
    });

    assert_eq!(older, Err(LinkerError::Cancelled));
    assert_eq!(newer.unwrap()[0].display_name, "Rust");
    assert_eq!(session.suggestions()[0].display_name, "Rust");
    assert_eq!(session.phase(), LinkPhase::Suggesting);
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn test_missing_active_note_is_not_created() {
    let server = MockServer::start().await;
    mount_machine_learning(&server).await;
    mount_concept(&server).await;

    let vault = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(VaultStore::new(vault.path()));
    let session = LinkSession::new(settings_for(&server, ""), HttpExecutor::default(), store);
    let note = PathBuf::from("Reading/machine learning.md");

    let suggestions = session.query("machine learning").await.unwrap();
    let err = session
        .commit(&suggestions[0], LinkTarget::ActiveNote(note.clone()))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LinkerError::Document {
            path: note,
            reason: "note does not exist".to_string(),
        }
    );
    assert_eq!(session.phase(), LinkPhase::Idle);
    assert_eq!(session.last_error(), Some(err));
    assert!(!vault.path().join("Reading").exists());
}
