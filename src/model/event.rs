use serde::Serialize;
use std::fmt;

/// Signal that lookups must be recomputed. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranslationEvent {
    /// The active language was set (including the initial value)
    LanguageChange,
    /// One part, or one batch of parts, was merged
    PartRegistered,
}

impl fmt::Display for TranslationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationEvent::LanguageChange => write!(f, "LANGUAGE_CHANGE"),
            TranslationEvent::PartRegistered => write!(f, "PART_REGISTERED"),
        }
    }
}
