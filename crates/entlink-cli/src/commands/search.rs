use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use entlink_config::Settings;
use entlink_core::{ConceptSearch, HttpExecutor, OpenAlexClient, Suggestion};

use crate::cli::OutputFormat;

/// Execute search command
pub async fn execute(settings: Settings, query: String, format: OutputFormat) -> Result<()> {
    let suggestions = fetch(&settings, &query).await?;

    if suggestions.is_empty() {
        println!("{}", "Nothing to search for.".dimmed());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suggestions)?),
        OutputFormat::Table => println!("{}", render_table(&suggestions)),
    }
    Ok(())
}

/// Suggestions for `query` with the given settings
pub async fn fetch(settings: &Settings, query: &str) -> Result<Vec<Suggestion>> {
    let http = HttpExecutor::new(&settings.network);
    let search = ConceptSearch::new(OpenAlexClient::from_settings(http, settings));
    search
        .search(query)
        .await
        .with_context(|| format!("Search for {:?} failed", query))
}

/// Numbered table of suggestions
pub fn render_table(suggestions: &[Suggestion]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Concept").fg(Color::Cyan),
        Cell::new("Hint").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
    ]);

    for (i, suggestion) in suggestions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&suggestion.display_name),
            Cell::new(&suggestion.hint),
            Cell::new(suggestion.source_id().unwrap_or("-")),
        ]);
    }

    table.to_string()
}
