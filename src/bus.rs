//! Synchronous publish/subscribe bus.
//!
//! Listeners run on the emitting thread, in subscription order, before `emit`
//! returns. Two channel flavours exist:
//!
//! - [`Subject`]: live-only, subscribers see emissions made after they subscribed
//! - [`ReplaySubject`]: remembers the last value and hands it to every new subscriber
//!
//! Every subscription is represented by a [`Subscription`] handle; dropping the
//! handle removes the listener. [`ListenStream`] adapts a subscription into a
//! `futures::Stream` for async consumers.

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::task::{Context, Poll};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Hook<T> {
    active: Arc<AtomicBool>,
    listener: Listener<T>,
}

impl<T> Hook<T> {
    fn is_alive(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Handle to a bus listener.
///
/// Dropping the handle stops the listener. Listeners removed this way are
/// pruned from the channel on its next emission.
#[must_use = "the listener is removed when the subscription is dropped"]
#[derive(Default)]
pub struct Subscription(Option<Arc<AtomicBool>>);

impl Subscription {
    /// Handle to no listener.
    pub const fn dummy() -> Self {
        Subscription(None)
    }

    pub fn is_dummy(&self) -> bool {
        self.0.is_none()
    }

    /// `true` while the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.0
            .as_ref()
            .map(|active| active.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Drop the handle without stopping the listener.
    ///
    /// The listener then lives as long as the channel it is registered on.
    pub fn perm(mut self) {
        self.0.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(active) = self.0.take() {
            active.store(false, Ordering::Release);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => write!(f, "Subscription(<dummy>)"),
            Some(active) => f
                .debug_tuple("Subscription")
                .field(&active.load(Ordering::Acquire))
                .finish(),
        }
    }
}

/// Live-only multicast channel.
pub struct Subject<T> {
    hooks: Arc<Mutex<Vec<Hook<T>>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            hooks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register `listener` for every subsequent emission.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(listener))
    }

    fn subscribe_listener(&self, listener: Listener<T>) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        lock(&self.hooks).push(Hook {
            active: Arc::clone(&active),
            listener,
        });
        Subscription(Some(active))
    }

    /// Deliver `value` to every live listener.
    ///
    /// No lock is held while listeners run, so a listener may subscribe or emit
    /// on any channel, this one included.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(Arc<AtomicBool>, Listener<T>)> = {
            let mut hooks = lock(&self.hooks);
            hooks.retain(Hook::is_alive);
            hooks
                .iter()
                .map(|hook| (Arc::clone(&hook.active), Arc::clone(&hook.listener)))
                .collect()
        };

        for (active, listener) in snapshot {
            if active.load(Ordering::Acquire) {
                listener(value);
            }
        }
    }

    /// Number of listeners that have not been dropped.
    pub fn listener_count(&self) -> usize {
        lock(&self.hooks).iter().filter(|hook| hook.is_alive()).count()
    }
}

impl<T: Clone + Send + 'static> Subject<T> {
    /// Stream of every subsequent emission.
    pub fn listen(&self) -> ListenStream<T> {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = self.subscribe_listener(forward_to(sender));
        ListenStream::new(receiver, subscription)
    }
}

/// Multicast channel that replays its latest value to new subscribers.
pub struct ReplaySubject<T> {
    subject: Subject<T>,
    last: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for ReplaySubject<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
            last: Arc::clone(&self.last),
        }
    }
}

impl<T: Clone + Send + 'static> Default for ReplaySubject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> ReplaySubject<T> {
    pub fn new() -> Self {
        Self {
            subject: Subject::new(),
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Latest emitted value, `None` before the first emission.
    pub fn value(&self) -> Option<T> {
        lock(&self.last).clone()
    }

    /// Record `value` as the latest and deliver it to every live listener.
    pub fn emit(&self, value: T) {
        *lock(&self.last) = Some(value.clone());
        self.subject.emit(&value);
    }

    /// Register `listener`; it is called right away with the latest value, if any.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(listener))
    }

    fn subscribe_listener(&self, listener: Listener<T>) -> Subscription {
        let (subscription, replay) = {
            let last = lock(&self.last);
            (
                self.subject.subscribe_listener(Arc::clone(&listener)),
                last.clone(),
            )
        };

        if let Some(value) = replay {
            listener(&value);
        }
        subscription
    }

    /// Stream starting with the latest value, followed by every subsequent emission.
    pub fn listen(&self) -> ListenStream<T> {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = self.subscribe_listener(forward_to(sender));
        ListenStream::new(receiver, subscription)
    }

    pub fn listener_count(&self) -> usize {
        self.subject.listener_count()
    }
}

fn forward_to<T: Clone + Send + 'static>(sender: UnboundedSender<T>) -> Listener<T> {
    let sender = Mutex::new(sender);
    Arc::new(move |value: &T| {
        // A closed receiver means the stream was dropped along with its subscription.
        let _ = lock(&sender).unbounded_send(value.clone());
    })
}

/// Stream of values pushed by a bus listener.
///
/// Never ends while the channel it listens to is alive; dropping the stream
/// removes the listener.
pub struct ListenStream<T> {
    receiver: UnboundedReceiver<T>,
    _subscription: Subscription,
}

impl<T> ListenStream<T> {
    pub(crate) fn new(receiver: UnboundedReceiver<T>, subscription: Subscription) -> Self {
        Self {
            receiver,
            _subscription: subscription,
        }
    }
}

impl<T> Stream for ListenStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.get_mut().receiver).poll_next(cx)
    }
}

impl<T> fmt::Debug for ListenStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenStream")
            .field("subscription", &self._subscription)
            .finish_non_exhaustive()
    }
}
