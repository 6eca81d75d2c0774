//! Translation parts: the unit of registration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flat mapping of key to template string.
pub type TranslationStringMap = HashMap<String, String>;

/// Merged tables, keyed by language code.
pub type TranslationCollectedMap = HashMap<String, TranslationStringMap>;

/// One batch of translations for one language.
///
/// ```json
/// { "prefix": "generic", "stringMap": { "hello": "Merhaba, {name}" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationPart {
    /// Optional namespace prepended to every key as `prefix.key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Keys relative to `prefix`, mapped to their templates
    #[serde(rename = "stringMap", alias = "string_map")]
    pub string_map: TranslationStringMap,
}

impl TranslationPart {
    /// Create a part without a prefix.
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: None,
            string_map: entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Create a part whose keys live under `prefix`.
    pub fn with_prefix<K, V>(
        prefix: impl Into<String>,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: Some(prefix.into()),
            ..Self::new(entries)
        }
    }

    /// Fully-qualified key for one of this part's keys.
    pub fn qualified_key(&self, key: &str) -> String {
        qualify(self.prefix.as_deref(), key)
    }

    /// Iterate over `(fully-qualified key, template)` pairs.
    pub fn qualified_entries(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.string_map
            .iter()
            .map(move |(key, value)| (self.qualified_key(key), value.as_str()))
    }
}

/// Join the non-empty pieces of `[prefix, key]` with a dot.
///
/// An empty prefix is treated the same as no prefix.
pub fn qualify(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() && !key.is_empty() => format!("{}.{}", prefix, key),
        Some(prefix) if !prefix.is_empty() => prefix.to_string(),
        _ => key.to_string(),
    }
}

/// Copy every entry of `part` into `table`, overwriting existing keys.
pub fn merge_part(table: &mut TranslationStringMap, part: &TranslationPart) {
    for (key, value) in part.qualified_entries() {
        table.insert(key, value.to_string());
    }
}

/// What a fetcher delivers: a single part or a sequence of parts.
///
/// A sequence is merged as a whole and produces a single change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartBatch {
    Single(TranslationPart),
    Many(Vec<TranslationPart>),
}

impl PartBatch {
    /// Number of parts in the batch.
    pub fn len(&self) -> usize {
        match self {
            PartBatch::Single(_) => 1,
            PartBatch::Many(parts) => parts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the parts as a slice.
    pub fn parts(&self) -> &[TranslationPart] {
        match self {
            PartBatch::Single(part) => std::slice::from_ref(part),
            PartBatch::Many(parts) => parts,
        }
    }
}

impl From<TranslationPart> for PartBatch {
    fn from(part: TranslationPart) -> Self {
        PartBatch::Single(part)
    }
}

impl From<Vec<TranslationPart>> for PartBatch {
    fn from(parts: Vec<TranslationPart>) -> Self {
        PartBatch::Many(parts)
    }
}
