//! Document storage seam.
//!
//! [`DocumentStore`] is everything the linker needs from the host that owns
//! the notes. [`VaultStore`] implements it over a directory of markdown files.

use crate::error::{LinkerError, Result};
use crate::frontmatter::{FrontMatter, MergeReport, ParsedDocument};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// A document known to exist in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    /// Store-relative path
    pub path: PathBuf,
}

/// How a document should be presented after linking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Open in a new view rather than replacing the current one
    pub new_tab: bool,
}

/// Front matter mutation applied inside a read-modify-write.
pub type FrontMatterMutator<'a> = Box<dyn FnOnce(&mut FrontMatter) -> MergeReport + Send + 'a>;

/// Host document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Look up a document by path
    async fn find(&self, path: &Path) -> Result<Option<DocumentHandle>>;

    /// Create a new document. Fails if one already exists at `path`.
    async fn create(&self, path: &Path, initial_content: &str) -> Result<DocumentHandle>;

    /// Read the document's front matter, apply `mutator`, and write the result
    /// back. The body is preserved and the mutator sees the same snapshot that
    /// is written.
    async fn update_front_matter(
        &self,
        handle: &DocumentHandle,
        mutator: FrontMatterMutator<'_>,
    ) -> Result<MergeReport>;

    /// Present the document to the user
    async fn open_in_view(&self, handle: &DocumentHandle, options: ViewOptions) -> Result<()>;
}

/// Filesystem store rooted at a vault directory.
#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
    editor: Option<String>,
}

impl VaultStore {
    /// Create a store over `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            editor: None,
        }
    }

    /// Use `editor` to open documents
    pub fn with_editor(mut self, editor: Option<String>) -> Self {
        self.editor = editor.filter(|e| !e.trim().is_empty());
        self
    }

    /// Absolute location of a vault-relative path.
    ///
    /// Absolute paths and `..` components are rejected so a document name can
    /// never escape the vault.
    pub fn full_path(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return Err(LinkerError::InvalidPath(format!(
                "absolute paths are not allowed: {}",
                path.display()
            )));
        }
        for component in path.components() {
            if let Component::ParentDir = component {
                return Err(LinkerError::InvalidPath(format!(
                    "path traversal is not allowed: {}",
                    path.display()
                )));
            }
        }
        if path.file_name().is_none() {
            return Err(LinkerError::InvalidPath(format!(
                "no file name in {}",
                path.display()
            )));
        }
        Ok(self.root.join(path))
    }

    async fn write_replacing(&self, full_path: &Path, contents: &str) -> std::io::Result<()> {
        let file_name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = full_path.with_file_name(format!(".{}.entlink.tmp", file_name));

        tokio::fs::write(&temp_path, contents).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, full_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for VaultStore {
    async fn find(&self, path: &Path) -> Result<Option<DocumentHandle>> {
        let full_path = self.full_path(path)?;
        match tokio::fs::metadata(&full_path).await {
            Ok(meta) if meta.is_file() => Ok(Some(DocumentHandle {
                path: path.to_path_buf(),
            })),
            Ok(_) => Err(LinkerError::Document {
                path: path.to_path_buf(),
                reason: "not a file".to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LinkerError::Document {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    async fn create(&self, path: &Path, initial_content: &str) -> Result<DocumentHandle> {
        let full_path = self.full_path(path)?;
        let create_failure = |e: std::io::Error| LinkerError::DocumentCreate {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(create_failure)?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
            .map_err(create_failure)?;
        file.write_all(initial_content.as_bytes())
            .await
            .map_err(create_failure)?;
        file.flush().await.map_err(create_failure)?;

        info!("Created {}", full_path.display());
        Ok(DocumentHandle {
            path: path.to_path_buf(),
        })
    }

    async fn update_front_matter(
        &self,
        handle: &DocumentHandle,
        mutator: FrontMatterMutator<'_>,
    ) -> Result<MergeReport> {
        let full_path = self.full_path(&handle.path)?;
        let io_failure = |e: std::io::Error| LinkerError::Document {
            path: handle.path.clone(),
            reason: e.to_string(),
        };

        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(io_failure)?;
        let mut document = ParsedDocument::parse(&content)?;

        let report = mutator(&mut document.front_matter);
        if !report.changed() {
            debug!("{} already up to date", handle.path.display());
            return Ok(report);
        }

        let rendered = document.render()?;
        self.write_replacing(&full_path, &rendered)
            .await
            .map_err(io_failure)?;

        debug!("Updated front matter of {}", handle.path.display());
        Ok(report)
    }

    async fn open_in_view(&self, handle: &DocumentHandle, options: ViewOptions) -> Result<()> {
        let full_path = self.full_path(&handle.path)?;

        let Some(editor) = &self.editor else {
            info!("Linked note ready at {}", full_path.display());
            return Ok(());
        };

        debug!("Opening {} with {} (new view: {})", full_path.display(), editor, options.new_tab);
        let status = tokio::process::Command::new(editor)
            .arg(&full_path)
            .status()
            .await
            .map_err(|e| LinkerError::Document {
                path: handle.path.clone(),
                reason: format!("failed to launch {}: {}", editor, e),
            })?;

        if !status.success() {
            return Err(LinkerError::Document {
                path: handle.path.clone(),
                reason: format!("{} exited with {}", editor, status),
            });
        }
        Ok(())
    }
}
