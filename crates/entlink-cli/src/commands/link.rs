use anyhow::{Context, Result};
use colored::Colorize;
use entlink_config::Settings;
use entlink_core::{LinkOutcome, Linker, SuggestionPicker, VaultStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::picker::{FixedPicker, TerminalPicker};

/// Execute `link`: link selected text to a note in the target folder
pub async fn execute_selection(
    settings: Settings,
    vault: PathBuf,
    selection: String,
    pick: Option<u64>,
    no_open: bool,
) -> Result<()> {
    let mut settings = settings;
    if no_open {
        settings.search.open_after_link = false;
    }

    let linker = linker_for(settings, &vault);
    let mut picker = picker_for(pick);

    let outcome = linker
        .link_selection(&selection, picker.as_mut())
        .await
        .with_context(|| format!("Failed to link {:?}", selection))?;

    report(outcome.as_ref());
    Ok(())
}

/// Execute `link-note`: link an existing note by its title
pub async fn execute_note(
    settings: Settings,
    vault: PathBuf,
    path: PathBuf,
    pick: Option<u64>,
) -> Result<()> {
    let note = vault_relative(&vault, &path);
    if !vault.join(&note).is_file() {
        anyhow::bail!("No note at {}", vault.join(&note).display());
    }

    let linker = linker_for(settings, &vault);
    let mut picker = picker_for(pick);

    let outcome = linker
        .link_active_note(&note, picker.as_mut())
        .await
        .with_context(|| format!("Failed to link {}", note.display()))?;

    report(outcome.as_ref());
    Ok(())
}

fn linker_for(settings: Settings, vault: &Path) -> Linker {
    let store = VaultStore::new(vault).with_editor(settings.editor.clone());
    Linker::new(settings, Arc::new(store))
}

fn picker_for(pick: Option<u64>) -> Box<dyn SuggestionPicker> {
    match pick {
        Some(position) => Box::new(FixedPicker::new(position as usize)),
        None => Box::new(TerminalPicker::new()),
    }
}

/// `path` relative to `vault`; paths already relative are kept as given
pub fn vault_relative(vault: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        if let Ok(relative) = path.strip_prefix(vault) {
            return relative.to_path_buf();
        }
    }
    path.to_path_buf()
}

fn report(outcome: Option<&LinkOutcome>) {
    let Some(outcome) = outcome else {
        println!("{}", "Cancelled, nothing was linked.".dimmed());
        return;
    };

    let verb = if outcome.created { "Created" } else { "Updated" };
    println!(
        "{} {} {} {}",
        "Success:".green().bold(),
        verb,
        outcome.path.display(),
        format!("({})", outcome.record.display_name).dimmed()
    );
    println!(
        "  {} added, {} overwritten, {} kept",
        outcome.report.added.len(),
        outcome.report.overwritten.len(),
        outcome.report.kept.len()
    );
    if !outcome.record.wikidata_entity_id.is_empty() {
        println!("  wikidata: {}", outcome.record.wikidata_entity_id.cyan());
    }
}
