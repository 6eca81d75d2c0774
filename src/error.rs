//! Error types for fetchers and language storage.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a lazyload fetcher.
///
/// The coordinator never propagates these: each one is logged and counted,
/// and the remaining fetchers keep running.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("translation source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("language code {0:?} cannot be used as a file name")]
    InvalidLanguage(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse translation parts: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl FetchError {
    /// Whether retrying the same fetch could succeed.
    ///
    /// Only raw I/O failures qualify; a missing file or malformed content will
    /// not fix itself between attempts.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Io { .. })
    }
}

/// Failure of the key/value store backing the persisted language.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings file {} could not be accessed: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {} is not a JSON object: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
