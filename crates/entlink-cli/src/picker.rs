//! Suggestion pickers for the terminal.

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use entlink_core::{PickerAction, Suggestion, SuggestionPicker};
use tracing::warn;

const SEARCH_AGAIN: &str = "Search again...";
const CANCEL: &str = "Cancel";

/// Menu line for a suggestion: the name, then its hint dimmed.
pub fn suggestion_label(suggestion: &Suggestion) -> String {
    if suggestion.hint.is_empty() {
        suggestion.display_name.clone()
    } else {
        format!("{}  {}", suggestion.display_name, suggestion.hint.dimmed())
    }
}

/// Always picks the same 1-based position (`--pick N`).
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker {
    position: usize,
}

impl FixedPicker {
    /// Picker for the 1-based `position`
    pub fn new(position: usize) -> Self {
        Self { position }
    }
}

#[async_trait]
impl SuggestionPicker for FixedPicker {
    async fn pick(&mut self, suggestions: &[Suggestion]) -> PickerAction {
        if suggestions.is_empty() {
            return PickerAction::Cancel;
        }
        PickerAction::Select(self.position.saturating_sub(1))
    }
}

/// Interactive menu: the suggestions, then "search again" and "cancel".
#[derive(Debug, Default)]
pub struct TerminalPicker;

impl TerminalPicker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SuggestionPicker for TerminalPicker {
    async fn pick(&mut self, suggestions: &[Suggestion]) -> PickerAction {
        let mut items: Vec<String> = suggestions.iter().map(suggestion_label).collect();
        let count = items.len();
        items.push(SEARCH_AGAIN.to_string());
        items.push(CANCEL.to_string());

        let prompt = tokio::task::spawn_blocking(move || prompt(&items, count)).await;
        match prompt {
            Ok(Ok(action)) => action,
            Ok(Err(e)) => {
                warn!("Picker closed: {}", e);
                PickerAction::Cancel
            }
            Err(e) => {
                warn!("Picker task failed: {}", e);
                PickerAction::Cancel
            }
        }
    }
}

fn prompt(items: &[String], count: usize) -> dialoguer::Result<PickerAction> {
    let theme = ColorfulTheme::default();

    if count == 0 {
        println!("{}", "No suggestions.".yellow());
    }

    let selection = Select::with_theme(&theme)
        .with_prompt("Link to")
        .items(items)
        .default(0)
        .interact()?;

    Ok(match selection_action(selection, count) {
        Some(action) => action,
        None => {
            let text: String = Input::with_theme(&theme)
                .with_prompt("Search")
                .interact_text()?;
            PickerAction::Refine(text)
        }
    })
}

/// Action for a menu row, or `None` when the user asked to search again.
fn selection_action(selection: usize, count: usize) -> Option<PickerAction> {
    if selection < count {
        Some(PickerAction::Select(selection))
    } else if selection == count {
        None
    } else {
        Some(PickerAction::Cancel)
    }
}
