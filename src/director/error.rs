//! Error types for the director and its configuration

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by director operations.
///
/// Re-entrant calls and degenerate parameters are not errors: they are
/// ignored and reported through the `Ok(false)` / no-op return instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectorError {
    #[error("{operation} rejected: director is not the authority for this entity")]
    NotAuthority { operation: &'static str },
}

/// Errors during boss profile loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read boss profile {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RON in {path}")]
    ParseRon {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("invalid boss profile {name}: {reason}")]
    InvalidDefinition { name: String, reason: String },
}
