//! entlink CLI library
//!
//! Command parsing, settings loading and the terminal suggestion picker used
//! by the `entlink` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod picker;
