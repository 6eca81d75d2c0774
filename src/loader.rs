//! JSON locale files as a lazyload source.
//!
//! A locale directory holds one `<language>.json` file per language, each
//! containing either a single part or an array of parts:
//!
//! ```json
//! [
//!   { "prefix": "generic", "stringMap": { "hello": "Hello, {name}" } },
//!   { "stringMap": { "ok": "OK" } }
//! ]
//! ```

use crate::error::FetchError;
use crate::lazyload::LazyloadHandler;
use crate::model::PartBatch;
use crate::retry::{retry_fetch, RetryConfig};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Future-shaped handler loading `<dir>/<language>.json`.
///
/// Transient read failures are retried per `retry`; a missing file is reported
/// as [`FetchError::NotFound`] right away.
pub fn json_directory(dir: impl Into<PathBuf>, retry: RetryConfig) -> LazyloadHandler {
    let dir = dir.into();
    LazyloadHandler::future(move |language: &str| {
        let dir = dir.clone();
        let retry = retry.clone();
        let language = language.to_string();
        async move { load_language(&dir, &language, &retry).await }
    })
}

/// Load the parts for `language` from `dir`.
pub async fn load_language(
    dir: &Path,
    language: &str,
    retry: &RetryConfig,
) -> Result<PartBatch, FetchError> {
    let path = locale_path(dir, language)?;
    let what = format!("Loading {}", path.display());
    let path = path.as_path();
    retry_fetch(retry, &what, || read_parts_file(path)).await
}

/// Path of the locale file for `language`.
///
/// Rejects codes that would resolve outside `dir`.
pub fn locale_path(dir: &Path, language: &str) -> Result<PathBuf, FetchError> {
    let mut components = Path::new(language).components();
    let is_plain_name = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    let has_separator = language.contains(|c: char| c == '/' || c == '\\');

    if !is_plain_name || has_separator || language.contains("..") {
        return Err(FetchError::InvalidLanguage(language.to_string()));
    }

    Ok(dir.join(format!("{}.json", language)))
}

/// Read and parse one locale file.
pub async fn read_parts_file(path: &Path) -> Result<PartBatch, FetchError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FetchError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(FetchError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let batch = parse_parts(&content)?;
    debug!("Read {} part(s) from {}", batch.len(), path.display());
    Ok(batch)
}

/// Parse a single part or an array of parts.
pub fn parse_parts(content: &str) -> Result<PartBatch, FetchError> {
    Ok(serde_json::from_str(content)?)
}

/// Language codes with a locale file in `dir`, sorted.
pub async fn discover_languages(dir: &Path) -> Result<Vec<String>, FetchError> {
    let io_error = |source| FetchError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FetchError::NotFound(dir.to_path_buf()))
        }
        Err(source) => return Err(io_error(source)),
    };

    let mut languages = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            languages.push(stem.to_string());
        }
    }

    languages.sort();
    Ok(languages)
}
