//! # entlink Configuration Library
//!
//! Settings for linking notes to OpenAlex concepts: the polite-pool contact
//! email, the folder new entity notes are written to, and the overwrite policy
//! applied when merging into existing front matter.
//!
//! Settings live in a TOML file. Stored values are merged over defaults at load
//! time and every change made through [`SettingsStore`] is persisted
//! immediately.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use entlink_config::SettingsStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = SettingsStore::open_default().await?;
//!     store.set_contact_email("me@example.org").await?;
//!     println!("notes go to {:?}", store.settings().target_folder);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod settings;
mod store;

pub use error::*;
pub use settings::*;
pub use store::*;
