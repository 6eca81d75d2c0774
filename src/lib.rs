//! Reactive runtime translation registry.
//!
//! - [`EnvironmentController`] holds the active language and persists it
//! - [`LazyloadCoordinator`] fetches string tables on demand
//! - [`TranslationRepository`] merges tables, resolves keys and publishes changes
//!
//! ```
//! use translation_registry::{EnvironmentController, TranslationPart, TranslationRepository, TranslatorText};
//!
//! let env = EnvironmentController::new(Some("tr-tr"));
//! let repository = TranslationRepository::new(&env);
//! repository.register_parts(
//!     TranslationPart::with_prefix("generic", [("hello", "Merhaba, {name}")]),
//!     "tr-tr",
//! );
//!
//! let text = TranslatorText::new("generic.hello").param("name", "Kyle");
//! assert_eq!(repository.get_string(text), "Merhaba, Kyle");
//! ```

pub mod bus;
pub mod config;
pub mod environment;
pub mod error;
pub mod lazyload;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod repository;
pub mod retry;
pub mod storage;
pub mod validator;

pub use bus::{ListenStream, Subscription};
pub use environment::EnvironmentController;
pub use error::{FetchError, StoreError};
pub use lazyload::{HandlerId, HandlerKind, LazyloadCoordinator, LazyloadHandler, PartSink};
pub use model::{
    PartBatch, TranslationCollectedMap, TranslationEvent, TranslationPart, TranslationStringMap,
    TranslatorText,
};
pub use repository::TranslationRepository;
pub use storage::{FileStore, LanguageStore, MemoryStore, LANGUAGE_KEY};
