//! Translation repository: merged string tables, lookups and change notification.
//!
//! The repository follows an [`EnvironmentController`] for its whole lifetime.
//! Every language emission (the replayed initial one included) updates the
//! active language, fires [`TranslationEvent::LanguageChange`] and asks the
//! [`LazyloadCoordinator`] to fetch strings for that language. Every merged
//! batch fires exactly one [`TranslationEvent::PartRegistered`].
//!
//! Tables and the active language live behind one `RwLock`. Batches are merged
//! under a single write lock and notifications fire after it is released, so a
//! listener never observes a half-merged batch.

use crate::bus::{lock, read, write, ListenStream, Subject, Subscription};
use crate::environment::EnvironmentController;
use crate::error::FetchError;
use crate::lazyload::{LazyloadCoordinator, PartSink};
use crate::metrics::RepositoryMetrics;
use crate::model::{
    merge_part, PartBatch, TranslationCollectedMap, TranslationEvent, TranslatorText,
};
use futures::channel::mpsc;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock, Weak};
use tracing::debug;

/// Registry of per-language string tables bound to one language source.
///
/// Cloning yields another handle to the same repository. The repository stops
/// following its environment once the last handle is dropped.
#[derive(Clone)]
pub struct TranslationRepository {
    inner: Arc<RepositoryInner>,
}

struct RepositoryInner {
    state: RwLock<RepositoryState>,
    changes: Subject<TranslationEvent>,
    lazyload: LazyloadCoordinator,
    metrics: RepositoryMetrics,
    subscriptions: Mutex<Vec<Subscription>>,
}

#[derive(Default)]
struct RepositoryState {
    collected: TranslationCollectedMap,
    current_language: Option<String>,
}

impl TranslationRepository {
    /// Repository with an empty lazyload coordinator.
    pub fn new(environment: &EnvironmentController) -> Self {
        Self::with_lazyload(environment, LazyloadCoordinator::new())
    }

    /// Repository fetching through `lazyload`.
    ///
    /// Subscribes to `environment` right away, so the current language is
    /// active (and its fetch started) when this returns.
    pub fn with_lazyload(environment: &EnvironmentController, lazyload: LazyloadCoordinator) -> Self {
        let inner = Arc::new(RepositoryInner {
            state: RwLock::new(RepositoryState::default()),
            changes: Subject::new(),
            lazyload,
            metrics: RepositoryMetrics::new(),
            subscriptions: Mutex::new(Vec::new()),
        });

        let weak = Arc::downgrade(&inner);
        let on_handlers = inner.lazyload.on_updated(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.refresh_current();
            }
        });

        let weak = Arc::downgrade(&inner);
        let on_language = environment.subscribe(move |language: &Option<String>| {
            if let Some(inner) = weak.upgrade() {
                inner.set_language(language.clone());
            }
        });

        lock(&inner.subscriptions).extend([on_handlers, on_language]);
        Self { inner }
    }

    /// Merge `parts` into the table for `language`.
    ///
    /// A single part and a list of parts both fire one notification.
    pub fn register_parts(&self, parts: impl Into<PartBatch>, language: &str) {
        self.inner.register(parts.into(), language);
    }

    /// `true` once any part was merged for `language`.
    pub fn has_language(&self, language: &str) -> bool {
        read(&self.inner.state).collected.contains_key(language)
    }

    /// The active language, `None` until the environment published one.
    pub fn current_language(&self) -> Option<String> {
        read(&self.inner.state).current_language.clone()
    }

    /// Resolve `text` against the active language.
    ///
    /// A missing entry resolves to the key itself (with parameters applied).
    /// Without an active language, or without any table for it, the key is
    /// returned as is.
    pub fn get_string(&self, text: impl Into<TranslatorText>) -> String {
        self.inner.resolve(&text.into())
    }

    /// Stream of the resolved text: the current value first, then a fresh value
    /// after every change notification.
    pub fn get_string_listen_changes(&self, text: impl Into<TranslatorText>) -> ListenStream<String> {
        let text = text.into();
        let (sender, receiver) = mpsc::unbounded();
        let sender = Arc::new(Mutex::new(sender));

        // Resolve and send under the sender lock so the last value sent always
        // reflects the newest table.
        let initial = lock(&sender);
        let subscription = {
            let sender = Arc::clone(&sender);
            let text = text.clone();
            let weak = Arc::downgrade(&self.inner);
            self.inner.changes.subscribe(move |_| {
                if let Some(inner) = weak.upgrade() {
                    let sender = lock(&sender);
                    let _ = sender.unbounded_send(inner.resolve(&text));
                }
            })
        };
        let _ = initial.unbounded_send(self.inner.resolve(&text));
        drop(initial);

        ListenStream::new(receiver, subscription)
    }

    /// Stream of every change notification.
    pub fn change_detection(&self) -> ListenStream<TranslationEvent> {
        self.inner.changes.listen()
    }

    /// Call `listener` on every change notification.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TranslationEvent) + Send + Sync + 'static,
    {
        self.inner.changes.subscribe(listener)
    }

    pub fn lazyload(&self) -> &LazyloadCoordinator {
        &self.inner.lazyload
    }

    pub fn metrics(&self) -> &RepositoryMetrics {
        &self.inner.metrics
    }

    /// Snapshot of every merged table.
    pub fn collected(&self) -> TranslationCollectedMap {
        read(&self.inner.state).collected.clone()
    }
}

impl fmt::Debug for TranslationRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = read(&self.inner.state);
        let mut languages: Vec<&String> = state.collected.keys().collect();
        languages.sort();

        f.debug_struct("TranslationRepository")
            .field("current_language", &state.current_language)
            .field("languages", &languages)
            .field("lazyload", &self.inner.lazyload)
            .finish()
    }
}

impl RepositoryInner {
    fn set_language(self: &Arc<Self>, language: Option<String>) {
        // An empty code means no language, as it does for the store.
        let language = language.filter(|code| !code.is_empty());
        write(&self.state).current_language = language.clone();

        match &language {
            Some(code) => debug!("Language changed to {}", code),
            None => debug!("Language cleared"),
        }
        self.notify(TranslationEvent::LanguageChange);
        self.refresh_current();
    }

    /// Fetch for the active language, read once earlier refreshes have started.
    fn refresh_current(self: &Arc<Self>) {
        let sink: Arc<dyn PartSink> = Arc::new(RepositorySink(Arc::downgrade(self)));
        self.lazyload
            .refresh_with(|| read(&self.state).current_language.clone(), sink);
    }

    fn register(&self, batch: PartBatch, language: &str) {
        {
            let mut state = write(&self.state);
            for part in batch.parts() {
                let table = state.collected.entry(language.to_string()).or_default();
                merge_part(table, part);
            }
        }

        debug!("Registered {} part(s) for {}", batch.len(), language);
        self.metrics.record_parts(batch.len());
        self.notify(TranslationEvent::PartRegistered);
    }

    fn resolve(&self, text: &TranslatorText) -> String {
        let state = read(&self.state);
        let table = state
            .current_language
            .as_ref()
            .and_then(|language| state.collected.get(language));

        match table {
            Some(table) => match table.get(&text.key) {
                Some(template) => {
                    self.metrics.record_resolved();
                    text.apply(template)
                }
                None => {
                    self.metrics.record_fallback();
                    text.apply(&text.key)
                }
            },
            None => {
                self.metrics.record_fallback();
                text.key.clone()
            }
        }
    }

    fn notify(&self, event: TranslationEvent) {
        self.metrics.record_notification();
        self.changes.emit(&event);
    }
}

/// Routes lazyload arrivals into a repository without keeping it alive.
struct RepositorySink(Weak<RepositoryInner>);

impl PartSink for RepositorySink {
    fn receive(&self, batch: PartBatch, language: &str) {
        if let Some(inner) = self.0.upgrade() {
            inner.register(batch, language);
        }
    }

    fn fetch_failed(&self, _language: &str, _error: &FetchError) {
        if let Some(inner) = self.0.upgrade() {
            inner.metrics.record_fetch_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazyload::LazyloadHandler;
    use crate::model::TranslationPart;
    use proptest::prelude::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    fn hello(template: &str) -> TranslationPart {
        TranslationPart::with_prefix("generic", [("hello", template)])
    }

    fn kyle() -> TranslatorText {
        TranslatorText::new("generic.hello").param("name", "Kyle")
    }

    fn event_log(repository: &TranslationRepository) -> (Arc<Mutex<Vec<TranslationEvent>>>, Subscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = repository.on_change(move |event| sink.lock().unwrap().push(*event));
        (events, subscription)
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("Condition not met in time");
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_registered_part_resolves_with_parameters() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Merhaba, {name}"), "tr-tr");

        assert_eq!(repository.get_string(kyle()), "Merhaba, Kyle");
    }

    #[test]
    fn test_switching_language_changes_and_reverts_lookup() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Merhaba, {name}"), "tr-tr");
        repository.register_parts(hello("Hello, {name}"), "en-us");

        env.set_language("en-us");
        assert_eq!(repository.get_string(kyle()), "Hello, Kyle");

        env.set_language("tr-tr");
        assert_eq!(repository.get_string(kyle()), "Merhaba, Kyle");
    }

    #[test]
    fn test_unregistered_key_falls_back_to_key() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Merhaba"), "tr-tr");

        assert_eq!(repository.get_string("generic.missing"), "generic.missing");
    }

    #[test]
    fn test_missing_key_fallback_applies_parameters() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Merhaba"), "tr-tr");

        let text = TranslatorText::new("welcome {name}").param("name", "Kyle");
        assert_eq!(repository.get_string(text), "welcome Kyle");
    }

    #[test]
    fn test_language_without_table_returns_raw_key() {
        let env = EnvironmentController::new(Some("de-de"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Merhaba"), "tr-tr");

        let text = TranslatorText::new("welcome {name}").param("name", "Kyle");
        assert_eq!(repository.get_string(text), "welcome {name}");
    }

    #[test]
    fn test_no_language_returns_raw_key() {
        let env = EnvironmentController::new(None);
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Merhaba, {name}"), "tr-tr");

        assert_eq!(repository.current_language(), None);
        assert_eq!(repository.get_string(kyle()), "generic.hello");
    }

    #[test]
    fn test_empty_template_resolves_to_empty_string() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello(""), "tr-tr");

        assert_eq!(repository.get_string("generic.hello"), "");
    }

    #[test]
    fn test_unmatched_placeholders_are_left_verbatim() {
        let env = EnvironmentController::new(Some("en-us"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Hello, {name} from {city}"), "en-us");

        assert_eq!(repository.get_string(kyle()), "Hello, Kyle from {city}");
    }

    #[test]
    fn test_later_registration_overwrites_key() {
        let env = EnvironmentController::new(Some("en-us"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Hi"), "en-us");
        repository.register_parts(hello("Hello"), "en-us");

        assert_eq!(repository.get_string("generic.hello"), "Hello");
    }

    #[test]
    fn test_has_language() {
        let env = EnvironmentController::new(Some("en-us"));
        let repository = TranslationRepository::new(&env);
        assert!(!repository.has_language("en-us"));

        repository.register_parts(hello("Hello"), "en-us");
        assert!(repository.has_language("en-us"));
        assert!(!repository.has_language("tr-tr"));
    }

    // ==================== Notification Tests ====================

    #[test]
    fn test_batch_fires_single_notification() {
        let env = EnvironmentController::new(Some("en-us"));
        let repository = TranslationRepository::new(&env);
        let (events, _sub) = event_log(&repository);

        repository.register_parts(
            vec![
                hello("Hello"),
                TranslationPart::with_prefix("menu", [("open", "Open")]),
                TranslationPart::new([("ok", "OK")]),
            ],
            "en-us",
        );

        assert_eq!(*events.lock().unwrap(), vec![TranslationEvent::PartRegistered]);
        assert_eq!(repository.get_string("menu.open"), "Open");
        assert_eq!(repository.get_string("ok"), "OK");
        assert_eq!(repository.metrics().parts_registered(), 3);
    }

    #[test]
    fn test_empty_batch_notifies_without_creating_language() {
        let env = EnvironmentController::new(Some("en-us"));
        let repository = TranslationRepository::new(&env);
        let (events, _sub) = event_log(&repository);

        repository.register_parts(Vec::new(), "en-us");

        assert_eq!(events.lock().unwrap().len(), 1);
        assert!(!repository.has_language("en-us"));
    }

    #[test]
    fn test_language_switch_fires_language_change() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        let (events, _sub) = event_log(&repository);

        env.set_language("en-us");

        assert_eq!(*events.lock().unwrap(), vec![TranslationEvent::LanguageChange]);
        assert_eq!(repository.current_language().as_deref(), Some("en-us"));
    }

    #[test]
    fn test_change_detection_stream() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        let mut changes = task::spawn(repository.change_detection());
        assert_pending!(changes.poll_next());

        repository.register_parts(hello("Merhaba"), "tr-tr");
        env.set_language("en-us");

        assert_ready_eq!(changes.poll_next(), Some(TranslationEvent::PartRegistered));
        assert_ready_eq!(changes.poll_next(), Some(TranslationEvent::LanguageChange));
        assert_pending!(changes.poll_next());
    }

    #[test]
    fn test_idempotent_reregistration() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Merhaba, {name}"), "tr-tr");
        let before = repository.collected();

        repository.register_parts(hello("Merhaba, {name}"), "tr-tr");

        assert_eq!(repository.collected(), before);
        assert_eq!(repository.get_string(kyle()), "Merhaba, Kyle");
    }

    // ==================== Listen Stream Tests ====================

    #[test]
    fn test_listen_changes_emits_fallback_then_resolved() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        let mut stream = task::spawn(repository.get_string_listen_changes(kyle()));

        assert_ready_eq!(stream.poll_next(), Some("generic.hello".to_string()));
        assert_pending!(stream.poll_next());

        repository.register_parts(hello("Merhaba, {name}"), "tr-tr");
        assert_ready_eq!(stream.poll_next(), Some("Merhaba, Kyle".to_string()));
    }

    #[test]
    fn test_listen_changes_follows_language_switch() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Merhaba, {name}"), "tr-tr");
        repository.register_parts(hello("Hello, {name}"), "en-us");

        let mut stream = task::spawn(repository.get_string_listen_changes(kyle()));
        assert_ready_eq!(stream.poll_next(), Some("Merhaba, Kyle".to_string()));

        env.set_language("en-us");
        assert_ready_eq!(stream.poll_next(), Some("Hello, Kyle".to_string()));
        assert_pending!(stream.poll_next());
    }

    #[test]
    fn test_dropping_listen_stream_unsubscribes() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        let stream = repository.get_string_listen_changes("generic.hello");
        assert_eq!(repository.inner.changes.listener_count(), 1);

        drop(stream);
        assert_eq!(repository.inner.changes.listener_count(), 0);
    }

    // ==================== Lazyload Tests ====================

    #[test]
    fn test_inserted_handler_fetches_current_language() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);

        repository
            .lazyload()
            .insert_one(LazyloadHandler::linear(|lang: &str| {
                TranslationPart::with_prefix("generic", [("language", lang)])
            }));

        assert_eq!(repository.get_string("generic.language"), "tr-tr");
    }

    #[test]
    fn test_language_switch_fetches_new_language() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let lazyload = LazyloadCoordinator::new();
        lazyload.insert_one(LazyloadHandler::linear(|lang: &str| {
            TranslationPart::with_prefix("generic", [("language", lang)])
        }));
        let repository = TranslationRepository::with_lazyload(&env, lazyload);
        assert!(repository.has_language("tr-tr"));

        env.set_language("en-us");

        assert!(repository.has_language("en-us"));
        assert_eq!(repository.get_string("generic.language"), "en-us");
    }

    #[test]
    fn test_no_fetch_without_language() {
        let env = EnvironmentController::new(None);
        let repository = TranslationRepository::new(&env);
        repository
            .lazyload()
            .insert_one(LazyloadHandler::linear(|lang: &str| {
                TranslationPart::new([("language", lang)])
            }));

        assert!(repository.collected().is_empty());
    }

    #[test]
    fn test_dropped_repository_stops_following() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let lazyload = LazyloadCoordinator::new();
        let repository = TranslationRepository::with_lazyload(&env, lazyload.clone());

        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        drop(repository);

        lazyload.insert_one(LazyloadHandler::linear(move |lang: &str| {
            *counter.lock().unwrap() += 1;
            TranslationPart::new([("language", lang)])
        }));
        env.set_language("en-us");

        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_fetch_failures_are_counted() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        repository.lazyload().insert([
            LazyloadHandler::try_linear(|lang: &str| {
                Err::<TranslationPart, _>(FetchError::NotFound(format!("{}.json", lang).into()))
            }),
            LazyloadHandler::linear(|_: &str| hello("Merhaba")),
        ]);

        assert_eq!(repository.metrics().fetch_failures(), 1);
        assert_eq!(repository.get_string("generic.hello"), "Merhaba");
    }

    #[tokio::test]
    async fn test_future_handler_updates_listen_stream() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        let mut stream = task::spawn(repository.get_string_listen_changes(kyle()));
        assert_ready_eq!(stream.poll_next(), Some("generic.hello".to_string()));

        repository
            .lazyload()
            .insert_one(LazyloadHandler::future(|_: &str| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, FetchError>(hello("Merhaba, {name}"))
            }));

        wait_until(|| repository.has_language("tr-tr")).await;
        assert_ready_eq!(stream.poll_next(), Some("Merhaba, Kyle".to_string()));
    }

    #[tokio::test]
    async fn test_switching_language_discards_pending_fetch() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let lazyload = LazyloadCoordinator::new();
        lazyload.insert_one(LazyloadHandler::future(|lang: &str| {
            let delay = if lang == "tr-tr" { 50 } else { 0 };
            let part = TranslationPart::with_prefix("generic", [("language", lang)]);
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, FetchError>(part)
            }
        }));
        let repository = TranslationRepository::with_lazyload(&env, lazyload);

        env.set_language("en-us");
        wait_until(|| repository.has_language("en-us")).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!repository.has_language("tr-tr"));
        assert_eq!(repository.get_string("generic.language"), "en-us");
    }

    #[tokio::test]
    async fn test_stream_handler_merges_every_batch() {
        let env = EnvironmentController::new(Some("en-us"));
        let repository = TranslationRepository::new(&env);
        repository
            .lazyload()
            .insert_one(LazyloadHandler::stream(|_: &str| {
                futures::stream::iter(vec![
                    Ok::<_, FetchError>(PartBatch::from(hello("Hello"))),
                    Ok(PartBatch::from(TranslationPart::new([("bye", "Bye")]))),
                ])
            }));

        wait_until(|| repository.get_string("bye") == "Bye").await;
        assert_eq!(repository.get_string("generic.hello"), "Hello");
    }

    #[tokio::test]
    async fn test_stream_batches_merge_in_arrival_order() {
        let env = EnvironmentController::new(Some("en-us"));
        let repository = TranslationRepository::new(&env);
        let mut stream = task::spawn(repository.get_string_listen_changes("generic.hello"));
        assert_ready_eq!(stream.poll_next(), Some("generic.hello".to_string()));

        repository
            .lazyload()
            .insert_one(LazyloadHandler::stream(|_: &str| {
                futures::stream::iter(vec![
                    Ok::<_, FetchError>(PartBatch::from(hello("v1"))),
                    Ok(PartBatch::from(hello("v2"))),
                ])
            }));

        wait_until(|| repository.metrics().parts_registered() == 2).await;
        assert_eq!(repository.get_string("generic.hello"), "v2");
        assert_ready_eq!(stream.poll_next(), Some("v1".to_string()));
        assert_ready_eq!(stream.poll_next(), Some("v2".to_string()));
        assert_pending!(stream.poll_next());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_switches_keep_latest_stream() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let lazyload = LazyloadCoordinator::new();
        let senders: Arc<Mutex<Vec<(String, mpsc::UnboundedSender<crate::lazyload::FetchResult>)>>> =
            Arc::default();
        let registry = Arc::clone(&senders);
        lazyload.insert_one(LazyloadHandler::stream(move |lang: &str| {
            let (sender, receiver) = mpsc::unbounded();
            registry.lock().unwrap().push((lang.to_string(), sender));
            receiver
        }));
        let repository = TranslationRepository::with_lazyload(&env, lazyload);

        let mut threads: Vec<_> = ["de-de", "en-us", "fr-fr"]
            .into_iter()
            .map(|language| {
                let env = env.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        env.set_language(language);
                    }
                })
            })
            .collect();
        threads.push({
            let repository = repository.clone();
            std::thread::spawn(move || {
                for _ in 0..20 {
                    repository
                        .lazyload()
                        .insert_one(LazyloadHandler::linear(|_: &str| Vec::<TranslationPart>::new()));
                }
            })
        });
        for thread in threads {
            thread.join().expect("Switcher thread panicked");
        }

        let open = || -> Vec<String> {
            senders
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, sender)| !sender.is_closed())
                .map(|(language, _)| language.clone())
                .collect()
        };
        wait_until(|| open().len() == 1).await;

        let latest = env.language();
        assert_eq!(repository.current_language(), latest);
        assert_eq!(open(), vec![latest.unwrap()]);
    }

    #[test]
    fn test_empty_language_code_counts_as_no_language() {
        let env = EnvironmentController::new(Some("tr-tr"));
        let repository = TranslationRepository::new(&env);
        repository.register_parts(hello("Merhaba"), "tr-tr");
        repository.register_parts(hello("Boş"), "");

        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        repository
            .lazyload()
            .insert_one(LazyloadHandler::linear(move |lang: &str| {
                *counter.lock().unwrap() += 1;
                TranslationPart::new([("language", lang)])
            }));
        assert_eq!(*calls.lock().unwrap(), 1);
        let (events, _sub) = event_log(&repository);

        env.set_language("");

        assert_eq!(repository.current_language(), None);
        assert_eq!(repository.get_string("generic.hello"), "generic.hello");
        assert_eq!(*events.lock().unwrap(), vec![TranslationEvent::LanguageChange]);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_registered_entry_resolves(
            prefix in "[a-z]{1,8}",
            key in "[a-z]{1,8}",
            template in "[A-Za-z ,]{0,16}",
            name in "[A-Za-z]{1,8}",
        ) {
            let env = EnvironmentController::new(Some("xx"));
            let repository = TranslationRepository::new(&env);
            let with_placeholder = format!("{}{{who}}", template);
            repository.register_parts(
                TranslationPart::with_prefix(prefix.clone(), [(key.clone(), with_placeholder)]),
                "xx",
            );

            let text = TranslatorText::new(format!("{}.{}", prefix, key)).param("who", name.clone());
            prop_assert_eq!(repository.get_string(text), format!("{}{}", template, name));
        }

        #[test]
        fn prop_unregistered_key_is_returned_unchanged(key in "[a-z.]{1,16}") {
            let env = EnvironmentController::new(Some("xx"));
            let repository = TranslationRepository::new(&env);
            repository.register_parts(TranslationPart::new([("__present", "value")]), "xx");

            prop_assume!(key != "__present");
            prop_assert_eq!(repository.get_string(key.as_str()), key);
        }

        #[test]
        fn prop_batch_notifies_once(count in 0usize..8) {
            let env = EnvironmentController::new(Some("xx"));
            let repository = TranslationRepository::new(&env);
            let (events, _sub) = event_log(&repository);

            let parts: Vec<TranslationPart> = (0..count)
                .map(|i| TranslationPart::new([(format!("k{}", i), "v")]))
                .collect();
            repository.register_parts(parts, "xx");

            prop_assert_eq!(events.lock().unwrap().len(), 1);
        }
    }
}
