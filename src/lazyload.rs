//! Lazyload coordinator: the registry of fetchers and the fan-out that runs them.
//!
//! A fetcher turns a language code into translation parts through one of three
//! delivery shapes. The shape is fixed when the handler is built (it is the
//! [`LazyloadHandler`] variant) and never re-derived from the returned value:
//!
//! - `Linear`: parts are returned directly and delivered inline
//! - `Async`: a single future, delivered once it resolves
//! - `Stream`: a push stream, every item delivered as it arrives
//!
//! [`LazyloadCoordinator::refresh`] starts every handler for one language
//! without waiting on any of them. Whatever arrives is handed to a
//! [`PartSink`] together with the language it was requested for.

use crate::bus::{lock, ListenStream, Subject, Subscription};
use crate::error::FetchError;
use crate::model::PartBatch;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outcome of one fetch, or of one stream item.
pub type FetchResult = Result<PartBatch, FetchError>;

type LinearFetch = Arc<dyn Fn(&str) -> FetchResult + Send + Sync>;
type AsyncFetch = Arc<dyn Fn(&str) -> BoxFuture<'static, FetchResult> + Send + Sync>;
type StreamFetch = Arc<dyn Fn(&str) -> BoxStream<'static, FetchResult> + Send + Sync>;

/// A fetcher tagged with its delivery shape.
#[derive(Clone)]
pub enum LazyloadHandler {
    Linear(LinearFetch),
    Async(AsyncFetch),
    Stream(StreamFetch),
}

/// Delivery shape of a [`LazyloadHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Linear,
    Async,
    Stream,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Linear => write!(f, "linear"),
            HandlerKind::Async => write!(f, "async"),
            HandlerKind::Stream => write!(f, "stream"),
        }
    }
}

impl LazyloadHandler {
    /// Synchronous fetcher that cannot fail.
    pub fn linear<F, P>(fetch: F) -> Self
    where
        F: Fn(&str) -> P + Send + Sync + 'static,
        P: Into<PartBatch>,
    {
        Self::Linear(Arc::new(move |language: &str| Ok(fetch(language).into())))
    }

    /// Synchronous fetcher that may fail.
    pub fn try_linear<F, P>(fetch: F) -> Self
    where
        F: Fn(&str) -> Result<P, FetchError> + Send + Sync + 'static,
        P: Into<PartBatch>,
    {
        Self::Linear(Arc::new(move |language: &str| {
            fetch(language).map(Into::into)
        }))
    }

    /// Fetcher resolving once through a future.
    pub fn future<F, Fut, P>(fetch: F) -> Self
    where
        F: Fn(&str) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, FetchError>> + Send + 'static,
        P: Into<PartBatch> + 'static,
    {
        Self::Async(Arc::new(move |language: &str| {
            fetch(language)
                .map(|result: Result<P, FetchError>| -> FetchResult { result.map(Into::into) })
                .boxed()
        }))
    }

    /// Fetcher pushing any number of batches through a stream.
    pub fn stream<F, S, P>(fetch: F) -> Self
    where
        F: Fn(&str) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<P, FetchError>> + Send + 'static,
        P: Into<PartBatch> + 'static,
    {
        Self::Stream(Arc::new(move |language: &str| {
            fetch(language)
                .map(|item: Result<P, FetchError>| -> FetchResult { item.map(Into::into) })
                .boxed()
        }))
    }

    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::Linear(_) => HandlerKind::Linear,
            Self::Async(_) => HandlerKind::Async,
            Self::Stream(_) => HandlerKind::Stream,
        }
    }
}

impl fmt::Debug for LazyloadHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LazyloadHandler").field(&self.kind()).finish()
    }
}

/// Stable identifier of an inserted handler.
///
/// Identifiers are never reused and stay valid when other handlers are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registered handlers in insertion order.
pub type HandlerList = Vec<(HandlerId, LazyloadHandler)>;

/// Receiver of everything the coordinator fetches.
pub trait PartSink: Send + Sync + 'static {
    /// `batch` arrived for `language`, the language the fetch was started for.
    fn receive(&self, batch: PartBatch, language: &str);

    /// A fetch for `language` failed. The failure has already been logged.
    fn fetch_failed(&self, _language: &str, _error: &FetchError) {}
}

/// Registry of [`LazyloadHandler`]s.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct LazyloadCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    handlers: Mutex<HandlerList>,
    next_id: AtomicU64,
    updated: Subject<HandlerList>,
    tasks: Mutex<HashMap<HandlerId, JoinHandle<()>>>,
    /// Serializes refreshes so the last one started owns every handler's task.
    refreshing: Mutex<()>,
    runtime: Option<Handle>,
}

impl Default for LazyloadCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl LazyloadCoordinator {
    /// Empty registry. Captures the current tokio runtime, if any, for
    /// refreshes triggered from threads outside of it.
    pub fn new() -> Self {
        Self::build(Handle::try_current().ok())
    }

    /// Empty registry spawning its fetch tasks on `runtime`.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self::build(Some(runtime))
    }

    fn build(runtime: Option<Handle>) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                handlers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                updated: Subject::new(),
                tasks: Mutex::new(HashMap::new()),
                refreshing: Mutex::new(()),
                runtime,
            }),
        }
    }

    /// Append `handlers` and notify update listeners once with the full list.
    pub fn insert(&self, handlers: impl IntoIterator<Item = LazyloadHandler>) -> Vec<HandlerId> {
        let (ids, snapshot) = {
            let mut list = lock(&self.inner.handlers);
            let ids: Vec<HandlerId> = handlers
                .into_iter()
                .map(|handler| {
                    let id = HandlerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
                    list.push((id, handler));
                    id
                })
                .collect();
            (ids, list.clone())
        };

        debug!(
            "Inserted {} lazyload handler(s), {} registered",
            ids.len(),
            snapshot.len()
        );
        self.inner.updated.emit(&snapshot);
        ids
    }

    /// Append a single handler.
    pub fn insert_one(&self, handler: LazyloadHandler) -> HandlerId {
        let id = HandlerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let snapshot = {
            let mut list = lock(&self.inner.handlers);
            list.push((id, handler));
            list.clone()
        };

        debug!("Inserted lazyload handler {}, {} registered", id, snapshot.len());
        self.inner.updated.emit(&snapshot);
        id
    }

    /// Remove a handler and stop its in-flight fetch, if any.
    ///
    /// Returns `false` when `id` is not registered.
    pub fn remove(&self, id: HandlerId) -> bool {
        let removed = {
            let mut list = lock(&self.inner.handlers);
            match list.iter().position(|(existing, _)| *existing == id) {
                Some(index) => {
                    list.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            self.dispose(id);
            debug!("Removed lazyload handler {}", id);
        }
        removed
    }

    /// Snapshot of the registered handlers, in insertion order.
    ///
    /// Later inserts and removals are not reflected; follow them through
    /// [`on_updated`](Self::on_updated).
    pub fn list(&self) -> HandlerList {
        lock(&self.inner.handlers).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.handlers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `listener` with the full handler list after every `insert`.
    pub fn on_updated<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&HandlerList) + Send + Sync + 'static,
    {
        self.inner.updated.subscribe(listener)
    }

    /// Stream of the full handler list after every `insert`.
    pub fn updates(&self) -> ListenStream<HandlerList> {
        self.inner.updated.listen()
    }

    /// Number of future or stream fetches still running.
    pub fn active_tasks(&self) -> usize {
        lock(&self.inner.tasks)
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Run every handler for `language`, handing results to `sink`.
    ///
    /// Linear handlers deliver before this returns. Future and stream handlers
    /// are spawned on the ambient tokio runtime (or the one captured at
    /// construction); a handler's previous task is aborted first, so each
    /// handler has at most one fetch in flight. Without any runtime those
    /// handlers are skipped.
    pub fn refresh(&self, language: &str, sink: Arc<dyn PartSink>) {
        self.refresh_with(|| Some(language.to_string()), sink);
    }

    /// Like [`refresh`](Self::refresh), with the language read only once
    /// concurrent refreshes have finished starting their tasks.
    ///
    /// Refreshes are serialized. When `language` reads shared state, the
    /// tasks left running always belong to the latest value any caller saw.
    /// Nothing runs when it returns `None`.
    pub fn refresh_with<F>(&self, language: F, sink: Arc<dyn PartSink>)
    where
        F: FnOnce() -> Option<String>,
    {
        let (language, inline) = {
            let _refreshing = lock(&self.inner.refreshing);
            let Some(language) = language() else {
                return;
            };
            let inline = self.start(&language, &sink);
            (language, inline)
        };

        // Delivered outside the refresh lock: a sink may trigger another refresh.
        for (id, result) in inline {
            deliver(id, &language, result, sink.as_ref());
        }
    }

    /// Start every handler for `language`. Returns the linear results, which
    /// the caller delivers.
    fn start(&self, language: &str, sink: &Arc<dyn PartSink>) -> Vec<(HandlerId, FetchResult)> {
        let handlers = self.list();
        debug!(
            "Refreshing {} lazyload handler(s) for {}",
            handlers.len(),
            language
        );

        let runtime = Handle::try_current()
            .ok()
            .or_else(|| self.inner.runtime.clone());

        let mut inline = Vec::new();
        for (id, handler) in handlers {
            self.dispose(id);

            match handler {
                LazyloadHandler::Linear(fetch) => {
                    inline.push((id, fetch(language)));
                }
                LazyloadHandler::Async(fetch) => {
                    let Some(runtime) = runtime.as_ref() else {
                        warn!("No tokio runtime available, skipping async handler {}", id);
                        continue;
                    };

                    let future = fetch(language);
                    let sink = Arc::clone(sink);
                    let language = language.to_string();
                    let task = runtime.spawn(async move {
                        let result = future.await;
                        deliver(id, &language, result, sink.as_ref());
                    });
                    self.track(id, task);
                }
                LazyloadHandler::Stream(fetch) => {
                    let Some(runtime) = runtime.as_ref() else {
                        warn!("No tokio runtime available, skipping stream handler {}", id);
                        continue;
                    };

                    let mut stream = fetch(language);
                    let sink = Arc::clone(sink);
                    let language = language.to_string();
                    let task = runtime.spawn(async move {
                        while let Some(result) = stream.next().await {
                            deliver(id, &language, result, sink.as_ref());
                        }
                        debug!("Stream handler {} finished for {}", id, language);
                    });
                    self.track(id, task);
                }
            }
        }
        inline
    }

    fn track(&self, id: HandlerId, task: JoinHandle<()>) {
        let registered = lock(&self.inner.handlers)
            .iter()
            .any(|(existing, _)| *existing == id);

        if !registered {
            // Removed while its fetch was being started.
            task.abort();
            return;
        }

        if let Some(previous) = lock(&self.inner.tasks).insert(id, task) {
            previous.abort();
        }
    }

    fn dispose(&self, id: HandlerId) {
        if let Some(task) = lock(&self.inner.tasks).remove(&id) {
            task.abort();
        }
    }
}

impl Drop for CoordinatorInner {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, task) in tasks.drain() {
            task.abort();
        }
    }
}

impl fmt::Debug for LazyloadCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyloadCoordinator")
            .field("handlers", &self.list())
            .finish_non_exhaustive()
    }
}

fn deliver(id: HandlerId, language: &str, result: FetchResult, sink: &dyn PartSink) {
    match result {
        Ok(batch) => {
            debug!(
                "Handler {} delivered {} part(s) for {}",
                id,
                batch.len(),
                language
            );
            sink.receive(batch, language);
        }
        Err(e) => {
            warn!("Lazyload handler {} failed for {}: {}", id, language, e);
            sink.fetch_failed(language, &e);
        }
    }
}
