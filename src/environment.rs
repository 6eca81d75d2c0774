//! Language state holder: the single source of truth for the active language.
//!
//! An [`EnvironmentController`] is constructed explicitly and handed to every
//! consumer that needs it. For code that cannot thread a handle through,
//! [`EnvironmentController::global`] keeps a lazily initialized process-wide
//! instance.

use crate::bus::{lock, ListenStream, ReplaySubject, Subscription};
use crate::storage::{LanguageStore, LANGUAGE_KEY};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, warn};

/// Holds the active language and publishes every change.
///
/// Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct EnvironmentController {
    inner: Arc<EnvironmentInner>,
}

struct EnvironmentInner {
    language: ReplaySubject<Option<String>>,
    store: Option<Arc<dyn LanguageStore>>,
    /// Held from emission through persistence, so listeners and the store see
    /// changes in the order they were made.
    emission: Mutex<()>,
}

static GLOBAL: OnceLock<EnvironmentController> = OnceLock::new();

impl EnvironmentController {
    /// Controller without persistence, starting at `initial_language`.
    ///
    /// `None` is a valid start: the first published value is then `None`.
    pub fn new(initial_language: Option<&str>) -> Self {
        Self::build(initial_language, None)
    }

    /// Controller that restores from and saves to `store`.
    ///
    /// A language already present in the store wins over `initial_language`.
    pub fn with_store(initial_language: Option<&str>, store: Arc<dyn LanguageStore>) -> Self {
        Self::build(initial_language, Some(store))
    }

    /// Process-wide controller.
    ///
    /// This is shared global state: the first call constructs the instance
    /// with its arguments, and every later call returns that same instance and
    /// ignores its own arguments.
    pub fn global(
        initial_language: Option<&str>,
        store: Option<Arc<dyn LanguageStore>>,
    ) -> &'static EnvironmentController {
        GLOBAL.get_or_init(|| Self::build(initial_language, store))
    }

    fn build(initial_language: Option<&str>, store: Option<Arc<dyn LanguageStore>>) -> Self {
        let restored = store.as_ref().and_then(|store| match store.get_item(LANGUAGE_KEY) {
            Ok(saved) => saved.filter(|code| !code.is_empty()),
            Err(e) => {
                warn!("Failed to restore saved language, using initial value: {}", e);
                None
            }
        });

        let controller = Self {
            inner: Arc::new(EnvironmentInner {
                language: ReplaySubject::new(),
                store,
                emission: Mutex::new(()),
            }),
        };

        match restored.or_else(|| initial_language.map(str::to_string)) {
            Some(code) => controller.set_language(code),
            None => controller.inner.language.emit(None),
        }
        controller
    }

    /// The active language, `None` when none was ever supplied.
    pub fn language(&self) -> Option<String> {
        self.inner.language.value().flatten()
    }

    /// Make `code` the active language.
    ///
    /// Subscribers are notified first; the store is written afterwards, before
    /// this returns. A failed write is logged and otherwise ignored.
    ///
    /// Concurrent calls are serialized: a call blocks until the previous one
    /// has notified every subscriber and written the store. A subscriber must
    /// therefore not call `set_language` on the same controller.
    pub fn set_language(&self, code: impl Into<String>) {
        let code = code.into();
        let _emission = lock(&self.inner.emission);
        debug!("Language set to {}", code);
        self.inner.language.emit(Some(code.clone()));

        if let Some(store) = &self.inner.store {
            if let Err(e) = store.set_item(LANGUAGE_KEY, &code) {
                warn!("Failed to persist language {}: {}", code, e);
            }
        }
    }

    /// Call `listener` with the current language now and on every change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Option<String>) + Send + Sync + 'static,
    {
        self.inner.language.subscribe(listener)
    }

    /// Stream of the current language followed by every change.
    pub fn get_language(&self) -> ListenStream<Option<String>> {
        self.inner.language.listen()
    }

    /// `true` when changes are written to a store.
    pub fn is_persistent(&self) -> bool {
        self.inner.store.is_some()
    }
}

impl fmt::Debug for EnvironmentController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentController")
            .field("language", &self.language())
            .field("persistent", &self.is_persistent())
            .finish()
    }
}
