//! Key-addressed fetch cache with request de-duplication.
//!
//! Every remote read goes through a [`FetchCache`]. For each key there is at
//! most one fetch in flight; concurrent callers join it and receive the same
//! [`Resolution`].
//!
//! ```text
//! request(key) ─┬─ Success, fresh ──────────────→ Ready(value)
//!               ├─ stale or failed, has value ─(refetch)─→ Ready(last value)
//!               ├─ fetch in flight, no value ──(join)───→ shared result
//!               └─ Idle / Error, no value ──(fetch)─────→ Ready / Failed
//! ```
//!
//! Fetches run on spawned tokio tasks, so a fetch settles into the cache even
//! when every caller that started it has gone away.

pub mod focus;
mod subscription;

pub use focus::{AppState, FocusMonitor};
pub use subscription::Subscription;

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info};

use crate::app::{HnError, Result};

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Pending,
    Success,
    Error,
}

/// Tri-state outcome handed to callers.
#[derive(Debug, Clone)]
pub enum Resolution<V> {
    /// No value yet: the key is absent or its first fetch has not settled.
    Pending,
    Ready(V),
    Failed(Arc<HnError>),
}

impl<V> Resolution<V> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Resolution::Ready(_))
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            Resolution::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Resolution::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Arc<HnError>> {
        match self {
            Resolution::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Resolution<U> {
        match self {
            Resolution::Pending => Resolution::Pending,
            Resolution::Ready(v) => Resolution::Ready(f(v)),
            Resolution::Failed(e) => Resolution::Failed(e),
        }
    }

    /// `Ok(None)` while pending, `Ok(Some(v))` when ready.
    pub fn into_result(self) -> Result<Option<V>> {
        match self {
            Resolution::Pending => Ok(None),
            Resolution::Ready(v) => Ok(Some(v)),
            Resolution::Failed(e) => Err(HnError::Shared(e)),
        }
    }
}

/// Point-in-time view of a cache entry, as delivered to subscribers.
#[derive(Debug, Clone)]
pub struct Snapshot<V> {
    pub key: String,
    pub value: Option<V>,
    pub error: Option<Arc<HnError>>,
    pub status: Status,
    /// A background refetch is running while `value` stays readable.
    pub is_validating: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

type FetchFn<V> = Arc<dyn Fn(String) -> BoxFuture<'static, Result<V>> + Send + Sync>;
type Listener<V> = dyn Fn(&Snapshot<V>) + Send + Sync;
type InFlight<V> = Shared<BoxFuture<'static, Resolution<V>>>;

struct Entry<V> {
    value: Option<V>,
    error: Option<Arc<HnError>>,
    status: Status,
    last_fetched_at: Option<DateTime<Utc>>,
    stale: bool,
    in_flight: Option<(u64, InFlight<V>)>,
    /// Sequence number of the last fetch or mutation written to this entry.
    applied_seq: u64,
    fetcher: Option<FetchFn<V>>,
    listeners: Vec<(u64, Weak<Listener<V>>)>,
}

impl<V: Clone> Entry<V> {
    fn new() -> Self {
        Self {
            value: None,
            error: None,
            status: Status::Idle,
            last_fetched_at: None,
            stale: false,
            in_flight: None,
            applied_seq: 0,
            fetcher: None,
            listeners: Vec::new(),
        }
    }

    fn resolution(&self) -> Resolution<V> {
        match (self.status, &self.value, &self.error) {
            (Status::Success, Some(v), _) => Resolution::Ready(v.clone()),
            (Status::Error, _, Some(e)) => Resolution::Failed(e.clone()),
            _ => Resolution::Pending,
        }
    }

    fn snapshot(&self, key: &str) -> Snapshot<V> {
        Snapshot {
            key: key.to_string(),
            value: self.value.clone(),
            error: self.error.clone(),
            status: self.status,
            is_validating: self.value.is_some() && self.refetching(),
            last_fetched_at: self.last_fetched_at,
        }
    }

    /// A fetch is running whose result would still be applied.
    fn refetching(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|(seq, _)| *seq > self.applied_seq)
    }

    /// Upgrade live listeners, dropping the ones whose subscription is gone.
    fn live_listeners(&mut self) -> Vec<Arc<Listener<V>>> {
        let mut live = Vec::with_capacity(self.listeners.len());
        self.listeners.retain(|(_, weak)| match weak.upgrade() {
            Some(listener) => {
                live.push(listener);
                true
            }
            None => false,
        });
        live
    }
}

pub(crate) struct Inner<V> {
    name: &'static str,
    entries: Mutex<HashMap<String, Entry<V>>>,
    seq: AtomicU64,
    listener_ids: AtomicU64,
}

impl<V> Inner<V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn remove_listener(&self, key: &str, id: u64) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.listeners.retain(|(listener_id, _)| *listener_id != id);
        }
    }
}

/// Shared, cheaply cloneable handle to one cache.
pub struct FetchCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for FetchCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

enum Action<V> {
    Done(Resolution<V>),
    Join(InFlight<V>),
}

impl<V> FetchCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty cache. `name` only labels log lines.
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                entries: Mutex::new(HashMap::new()),
                seq: AtomicU64::new(1),
                listener_ids: AtomicU64::new(1),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Read `key`, fetching it with `fetcher` when there is no usable value.
    ///
    /// A `None` key is a no-op that stays [`Resolution::Pending`]. The fetcher is
    /// remembered for the key so revalidation and [`refresh`](Self::refresh)
    /// can reissue it.
    pub async fn request<F, Fut>(&self, key: Option<&str>, fetcher: F) -> Resolution<V>
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let Some(key) = key else {
            return Resolution::Pending;
        };
        let fetcher: FetchFn<V> = Arc::new(move |k| fetcher(k).boxed());

        let action = {
            let mut entries = self.inner.lock();
            let entry = entries.entry(key.to_string()).or_insert_with(Entry::new);
            entry.fetcher = Some(fetcher.clone());

            let fresh = entry.status == Status::Success && !entry.stale;
            let in_flight = entry
                .in_flight
                .as_ref()
                .map(|(seq, shared)| (*seq, shared.clone()));

            // A held value is served even after a failed refetch; only an
            // entry with nothing to show makes the caller wait.
            match (entry.value.clone(), in_flight) {
                (Some(value), Some(_)) => Action::Done(Resolution::Ready(value)),
                (None, Some((seq, shared))) => {
                    debug!("[{}] joining in-flight fetch #{} for {}", self.inner.name, seq, key);
                    Action::Join(shared)
                }
                (Some(value), None) if fresh => Action::Done(Resolution::Ready(value)),
                (Some(value), None) => {
                    debug!(
                        "[{}] serving last value of {} ({:?}) while refetching",
                        self.inner.name, key, entry.status
                    );
                    self.start_fetch(key, entry, fetcher);
                    Action::Done(Resolution::Ready(value))
                }
                (None, None) => Action::Join(self.start_fetch(key, entry, fetcher)),
            }
        };

        match action {
            Action::Done(resolution) => resolution,
            Action::Join(shared) => shared.await,
        }
    }

    /// Caller-initiated refetch using the fetcher last registered for `key`.
    pub async fn refresh(&self, key: &str) -> Resolution<V> {
        let shared = {
            let mut entries = self.inner.lock();
            let Some(entry) = entries.get_mut(key) else {
                return Resolution::Pending;
            };
            let joined = entry.in_flight.as_ref().map(|(_, shared)| shared.clone());
            if let Some(shared) = joined {
                shared
            } else if let Some(fetcher) = entry.fetcher.clone() {
                self.start_fetch(key, entry, fetcher)
            } else {
                return Resolution::Pending;
            }
        };
        shared.await
    }

    /// Overwrite the value for `key` and notify subscribers.
    pub fn mutate(&self, key: &str, value: V) {
        self.mutate_with(key, move |_| value);
    }

    /// Recompute the value for `key` from its current value.
    ///
    /// A fetch already in flight for the key is superseded: its result is
    /// discarded when it settles.
    pub fn mutate_with<F>(&self, key: &str, f: F) -> V
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let (next, snapshot, listeners) = {
            let mut entries = self.inner.lock();
            let entry = entries.entry(key.to_string()).or_insert_with(Entry::new);
            let next = f(entry.value.as_ref());

            entry.applied_seq = self.next_seq();
            entry.value = Some(next.clone());
            entry.error = None;
            entry.status = Status::Success;
            entry.stale = false;
            entry.last_fetched_at = Some(Utc::now());

            (next, entry.snapshot(key), entry.live_listeners())
        };

        debug!("[{}] mutated {}", self.inner.name, key);
        notify(&listeners, &snapshot);
        next
    }

    pub fn peek(&self, key: &str) -> Option<Snapshot<V>> {
        self.inner.lock().get(key).map(|entry| entry.snapshot(key))
    }

    /// Last known value for `key`, stale or not.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key).and_then(|entry| entry.value.clone())
    }

    /// Register `listener` for every state change of `key`.
    ///
    /// The entry keeps only a weak handle; dropping the returned
    /// [`Subscription`] stops delivery.
    pub fn subscribe<L>(&self, key: &str, listener: L) -> Subscription<V>
    where
        L: Fn(&Snapshot<V>) + Send + Sync + 'static,
    {
        let listener: Arc<Listener<V>> = Arc::new(listener);
        let id = self.inner.listener_ids.fetch_add(1, Ordering::Relaxed);

        self.inner
            .lock()
            .entry(key.to_string())
            .or_insert_with(Entry::new)
            .listeners
            .push((id, Arc::downgrade(&listener)));

        Subscription::new(Arc::downgrade(&self.inner), key.to_string(), id, listener)
    }

    /// Mark every successful entry stale and refetch the subscribed ones in the
    /// background. Returns the number of fetches started.
    pub fn revalidate(&self) -> usize {
        let mut started = 0;
        let mut entries = self.inner.lock();

        for (key, entry) in entries.iter_mut() {
            if entry.status != Status::Success {
                continue;
            }
            entry.stale = true;

            let subscribed = !entry.live_listeners().is_empty();
            if entry.refetching() || !subscribed {
                continue;
            }
            if let Some(fetcher) = entry.fetcher.clone() {
                self.start_fetch(key, entry, fetcher);
                started += 1;
            }
        }

        info!(
            "[{}] revalidation marked {} entries stale, {} refetching",
            self.inner.name,
            entries.len(),
            started
        );
        started
    }

    /// Drop every entry. Fetches still in flight settle into nothing.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_seq(&self) -> u64 {
        self.inner.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn start_fetch(&self, key: &str, entry: &mut Entry<V>, fetcher: FetchFn<V>) -> InFlight<V> {
        let seq = self.next_seq();
        let owned_key = key.to_string();

        debug!("[{}] fetch #{} started for {}", self.inner.name, seq, key);

        let handle = tokio::spawn({
            let cache = self.clone();
            let key = owned_key.clone();
            async move {
                // The fetcher itself is called inside the guard so a panic
                // before its first await is caught too.
                let outcome = match AssertUnwindSafe(async { fetcher(key.clone()).await })
                    .catch_unwind()
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(HnError::Task(format!("fetcher for {} panicked", key))),
                };
                cache.settle(&key, seq, outcome)
            }
        });

        let cache = self.clone();
        let shared = async move {
            match handle.await {
                Ok(resolution) => resolution,
                Err(e) => {
                    tracing::error!(
                        "[{}] fetch task #{} for {} died: {}",
                        cache.name(),
                        seq,
                        owned_key,
                        e
                    );
                    cache.settle(&owned_key, seq, Err(HnError::Task(e.to_string())))
                }
            }
        }
        .boxed()
        .shared();
        // Background refetches have no joiner; settle them all the same.
        tokio::spawn(shared.clone());

        if entry.value.is_none() {
            entry.status = Status::Pending;
        }
        entry.in_flight = Some((seq, shared.clone()));
        shared
    }

    fn settle(&self, key: &str, seq: u64, outcome: Result<V>) -> Resolution<V> {
        let (resolution, snapshot, listeners) = {
            let mut entries = self.inner.lock();
            let Some(entry) = entries.get_mut(key) else {
                debug!("[{}] {} was cleared before fetch #{} settled", self.inner.name, key, seq);
                return match outcome {
                    Ok(v) => Resolution::Ready(v),
                    Err(e) => Resolution::Failed(Arc::new(e)),
                };
            };

            if entry.in_flight.as_ref().is_some_and(|(s, _)| *s == seq) {
                entry.in_flight = None;
            }

            if seq <= entry.applied_seq {
                debug!(
                    "[{}] discarding fetch #{} for {}, #{} already applied",
                    self.inner.name, seq, key, entry.applied_seq
                );
                return entry.resolution();
            }

            entry.applied_seq = seq;
            entry.stale = false;
            match outcome {
                Ok(value) => {
                    entry.value = Some(value);
                    entry.error = None;
                    entry.status = Status::Success;
                    entry.last_fetched_at = Some(Utc::now());
                    debug!("[{}] fetch #{} for {} succeeded", self.inner.name, seq, key);
                }
                Err(e) => {
                    tracing::warn!("[{}] fetch #{} for {} failed: {}", self.inner.name, seq, key, e);
                    entry.error = Some(Arc::new(e));
                    entry.status = Status::Error;
                }
            }

            (entry.resolution(), entry.snapshot(key), entry.live_listeners())
        };

        notify(&listeners, &snapshot);
        resolution
    }
}

fn notify<V>(listeners: &[Arc<Listener<V>>], snapshot: &Snapshot<V>) {
    for listener in listeners {
        listener(snapshot);
    }
}
