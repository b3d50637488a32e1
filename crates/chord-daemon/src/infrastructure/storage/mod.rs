//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the XDG
//! config directory (or an explicit path), falls back to defaults when the
//! file does not exist yet, and can write the defaults out as a starting
//! point for editing.

pub mod config;
