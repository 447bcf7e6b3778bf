use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output format for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Output format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

#[derive(Parser)]
#[command(name = "entlink")]
#[command(about = "entlink - link markdown notes to OpenAlex concepts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory containing the notes
    #[arg(long, global = true, default_value = ".")]
    pub vault: PathBuf,

    /// Config file path (defaults to ~/.config/entlink/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses RUST_LOG or defaults to 'warn'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Level requested on the command line, if any
    pub fn level_filter(&self) -> Option<LevelFilter> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level.into()),
            (None, true) => Some(LevelFilter::DEBUG),
            (None, false) => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search OpenAlex concepts
    Search {
        /// Search text
        query: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Link selection to entity: create or update a note for the chosen concept
    Link {
        /// Selected text to search for
        selection: String,

        /// Pick the Nth suggestion (1-based) instead of prompting
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        pick: Option<u64>,

        /// Do not open the note after linking
        #[arg(long)]
        no_open: bool,
    },

    /// Link active note to entity: search by the note's title and update it in place
    LinkNote {
        /// Note path, relative to the vault
        path: PathBuf,

        /// Pick the Nth suggestion (1-based) instead of prompting
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        pick: Option<u64>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },

    /// Print the config file path
    Path,

    /// Write an example config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set the contact email sent to OpenAlex.
    /// Requests with an email join the polite pool and get faster, more
    /// consistent response times.
    SetEmail {
        /// Email address ("" to stop sending one)
        email: String,
    },

    /// Set the vault folder new entity notes are written to
    SetFolder {
        /// Vault-relative folder ("" for the vault root)
        folder: String,
    },

    /// Overwrite existing front matter keys when linking
    SetOverwrite {
        /// true or false
        #[arg(action = ArgAction::Set)]
        value: bool,
    },
}
