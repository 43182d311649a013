//! Configuration error taxonomy.
//!
//! Loading `vela.toml` can fail before a build even starts; every
//! variant that involves the file carries its path so the message points
//! at what the user has to fix.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating `vela.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    /// The config file is not valid TOML for the known sections.
    #[error("failed to parse config `{0}`")]
    Toml(PathBuf, #[source] toml::de::Error),

    /// The parsed config breaks a semantic rule
    /// (checked in `SiteConfig::validate`).
    #[error("invalid configuration: {0}")]
    Validation(String),
}
