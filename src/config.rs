use crate::environment::EnvironmentController;
use crate::retry::RetryConfig;
use crate::storage::{FileStore, LanguageStore};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Language
    pub language: Option<String>,
    pub persist_language: bool,
    pub settings_file: PathBuf,

    // Locale files
    pub locales_dir: PathBuf,
    pub fetch_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: None,
            persist_language: true,
            settings_file: PathBuf::from(".translator/settings.json"),
            locales_dir: PathBuf::from("locales"),
            fetch_attempts: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            // Language
            language: std::env::var("TRANSLATOR_LANGUAGE")
                .ok()
                .filter(|code| !code.trim().is_empty()),
            persist_language: match std::env::var("TRANSLATOR_PERSIST_LANGUAGE") {
                Ok(value) => parse_bool(&value)
                    .context("TRANSLATOR_PERSIST_LANGUAGE must be true or false")?,
                Err(_) => defaults.persist_language,
            },
            settings_file: std::env::var("TRANSLATOR_SETTINGS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_file),

            // Locale files
            locales_dir: std::env::var("TRANSLATOR_LOCALES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.locales_dir),
            fetch_attempts: std::env::var("TRANSLATOR_FETCH_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|attempts| *attempts > 0)
                .unwrap_or(defaults.fetch_attempts),
        })
    }

    /// Retry policy for locale file reads.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::fetch().with_attempts(self.fetch_attempts)
    }

    /// The settings file store, when persistence is enabled.
    pub fn language_store(&self) -> Result<Option<Arc<dyn LanguageStore>>> {
        if !self.persist_language {
            return Ok(None);
        }

        let store = FileStore::open(&self.settings_file).with_context(|| {
            format!(
                "Failed to open settings file {}",
                self.settings_file.display()
            )
        })?;
        Ok(Some(Arc::new(store)))
    }

    /// Language state holder built from this configuration.
    pub fn environment(&self) -> Result<EnvironmentController> {
        let initial = self.language.as_deref();
        Ok(match self.language_store()? {
            Some(store) => EnvironmentController::with_store(initial, store),
            None => EnvironmentController::new(initial),
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("invalid boolean {:?}", other),
    }
}
