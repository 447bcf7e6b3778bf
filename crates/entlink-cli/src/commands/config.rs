use anyhow::{Context, Result};
use colored::Colorize;
use entlink_core::is_valid_email;
use std::path::PathBuf;

use crate::cli::{ConfigCommands, ConfigFormat};
use crate::config::{effective_settings, open_store};

/// Execute config subcommand
pub async fn execute(config_path: Option<PathBuf>, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { format } => show(config_path, format).await,
        ConfigCommands::Path => path(config_path).await,
        ConfigCommands::Init { force } => init(config_path, force).await,
        ConfigCommands::SetEmail { email } => set_email(config_path, email).await,
        ConfigCommands::SetFolder { folder } => set_folder(config_path, folder).await,
        ConfigCommands::SetOverwrite { value } => set_overwrite(config_path, value).await,
    }
}

/// Show the current effective configuration
async fn show(config_path: Option<PathBuf>, format: ConfigFormat) -> Result<()> {
    let store = open_store(config_path).await?;
    let settings = effective_settings(&store);

    match format {
        ConfigFormat::Json => println!("{}", settings.to_json()?),
        ConfigFormat::Toml => println!("{}", settings.to_toml()?),
    }
    Ok(())
}

async fn path(config_path: Option<PathBuf>) -> Result<()> {
    let store = open_store(config_path).await?;
    println!("{}", store.path().display());
    Ok(())
}

/// Initialize a new config file
async fn init(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let store = open_store(config_path).await?;

    if store.path().exists() && !force {
        println!(
            "{} Config file already exists at: {}",
            "Error:".red().bold(),
            store.path().display()
        );
        println!("Use {} to overwrite", "--force".yellow());
        return Ok(());
    }

    store
        .write_example()
        .await
        .context("Failed to write example config")?;

    println!(
        "{} Created config file at: {}",
        "Success:".green().bold(),
        store.path().display()
    );
    println!(
        "\n{}",
        "Set contact_email to join the OpenAlex polite pool for faster responses.".dimmed()
    );
    Ok(())
}

async fn set_email(config_path: Option<PathBuf>, email: String) -> Result<()> {
    let mut store = open_store(config_path).await?;
    let email = email.trim().to_string();

    if !email.is_empty() && !is_valid_email(&email) {
        println!(
            "{} {:?} does not look like an email address; it will not be sent to OpenAlex",
            "Warning:".yellow().bold(),
            email
        );
    }

    store
        .set_contact_email(email)
        .await
        .context("Failed to save contact email")?;
    println!("{} Contact email saved", "Success:".green().bold());
    Ok(())
}

async fn set_folder(config_path: Option<PathBuf>, folder: String) -> Result<()> {
    let mut store = open_store(config_path).await?;
    store
        .set_target_folder(folder.trim())
        .await
        .context("Failed to save target folder")?;

    let shown = if store.settings().target_folder.is_empty() {
        "vault root".to_string()
    } else {
        store.settings().target_folder.clone()
    };
    println!("{} New notes go to {}", "Success:".green().bold(), shown);
    Ok(())
}

async fn set_overwrite(config_path: Option<PathBuf>, value: bool) -> Result<()> {
    let mut store = open_store(config_path).await?;
    store
        .set_overwrite(value)
        .await
        .context("Failed to save overwrite setting")?;
    println!("{} overwrite = {}", "Success:".green().bold(), value);
    Ok(())
}
