//! Observable read state bound to a dependency value.
//!
//! DESIGN
//! ======
//! A `Query` owns a fetcher and the last-seen dependency value. Mounting and
//! every dependency change spawn a fetch on the tokio runtime; `refetch`
//! runs one inline. State is published through a `watch` channel so each
//! transition (`loading`, `data`, `error` together) is a single update.
//!
//! ORDERING
//! ========
//! Every invocation takes a generation number when it starts. A settlement
//! is applied only if no newer invocation has started since, so the visible
//! state always belongs to the most recently issued fetch, and `loading`
//! stays true until that fetch settles. Generations are taken and checked
//! while holding the channel's write lock, which makes start and settle
//! atomic with respect to each other.
//!
//! An invocation whose future is dropped before it settles (a cancelled
//! `refetch`, an aborted automatic fetch) clears `loading` if it was still
//! the latest, keeping the previous `data`.

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::envelope::Envelope;

/// Snapshot of a query or mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    /// Last successful payload. Kept while a refetch is in flight.
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> QueryState<T> {
    #[must_use]
    pub fn idle() -> Self {
        Self { data: None, loading: false, error: None }
    }

    #[must_use]
    pub fn pending() -> Self {
        Self { data: None, loading: true, error: None }
    }

    /// The state an envelope settles into.
    #[must_use]
    pub fn settled(envelope: Envelope<T>) -> Self {
        if envelope.is_success() {
            Self { data: envelope.into_data(), loading: false, error: None }
        } else {
            let error = envelope.message().map(str::to_owned);
            Self { data: None, loading: false, error }
        }
    }
}

// =============================================================================
// FENCED STATE
// =============================================================================

/// Watch channel plus the generation counter that fences settlements.
pub(crate) struct Fenced<T> {
    state: watch::Sender<QueryState<T>>,
    generation: AtomicU64,
}

impl<T> Fenced<T> {
    pub(crate) fn new(initial: QueryState<T>) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state, generation: AtomicU64::new(0) }
    }

    /// Start an invocation: take the next generation and apply `enter`.
    pub(crate) fn begin(&self, enter: impl FnOnce(&mut QueryState<T>)) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            enter(state);
        });
        generation
    }

    /// Apply `next` if `generation` is still the latest. Returns whether it was applied.
    pub(crate) fn settle(&self, generation: u64, next: QueryState<T>) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        });
        if !applied {
            tracing::trace!(generation, "discarding superseded settlement");
        }
        applied
    }

    /// Clear `loading` for a `generation` that will never settle.
    fn abandon(&self, generation: u64) {
        let cleared = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation || !state.loading {
                return false;
            }
            state.loading = false;
            true
        });
        if cleared {
            tracing::trace!(generation, "in-flight call dropped before settling");
        }
    }

    /// Guard for `generation` that must be settled before it is dropped.
    pub(crate) fn in_flight(&self, generation: u64) -> InFlight<'_, T> {
        InFlight { fenced: self, generation, armed: true }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    pub(crate) fn snapshot(&self) -> QueryState<T>
    where
        T: Clone,
    {
        self.state.borrow().clone()
    }

    pub(crate) fn replace(&self, next: QueryState<T>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(next);
    }

    pub(crate) async fn wait_settled(&self) -> QueryState<T>
    where
        T: Clone,
    {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|state| !state.loading).await.map(|state| (*state).clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }
}

/// One started invocation. Dropping it unsettled abandons its generation.
pub(crate) struct InFlight<'a, T> {
    fenced: &'a Fenced<T>,
    generation: u64,
    armed: bool,
}

impl<T> InFlight<'_, T> {
    pub(crate) fn settle(mut self, next: QueryState<T>) -> bool {
        self.armed = false;
        self.fenced.settle(self.generation, next)
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.fenced.abandon(self.generation);
        }
    }
}

// =============================================================================
// QUERY
// =============================================================================

type Fetcher<T, D> = Box<dyn Fn(D) -> BoxFuture<'static, Envelope<T>> + Send + Sync>;

struct Shared<T, D> {
    fenced: Fenced<T>,
    fetcher: Fetcher<T, D>,
}

impl<T, D> Shared<T, D> {
    /// Enter loading and take the invocation's generation.
    fn start(&self) -> u64 {
        self.fenced.begin(|state| {
            state.loading = true;
            state.error = None;
        })
    }

    async fn fetch(&self, generation: u64, deps: D) {
        let in_flight = self.fenced.in_flight(generation);
        let envelope = (self.fetcher)(deps).await;
        in_flight.settle(QueryState::settled(envelope));
    }
}

struct AutoFetch<D> {
    deps: D,
    task: Option<JoinHandle<()>>,
}

/// Re-fetchable read bound to a dependency value `D`.
///
/// The fetcher receives a clone of the current dependencies on each call.
/// Use `()` for a query with no inputs.
pub struct Query<T, D = ()> {
    shared: Arc<Shared<T, D>>,
    auto: Mutex<AutoFetch<D>>,
}

impl<T, D> Query<T, D>
where
    T: Clone + Send + Sync + 'static,
    D: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create the query in the loading state and spawn the first fetch.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn mount<F, Fut>(deps: D, fetcher: F) -> Self
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Envelope<T>> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            fenced: Fenced::new(QueryState::pending()),
            fetcher: Box::new(move |deps: D| -> BoxFuture<'static, Envelope<T>> { fetcher(deps).boxed() }),
        });
        let task = spawn_fetch(&shared, deps.clone());
        Self { shared, auto: Mutex::new(AutoFetch { deps, task: Some(task) }) }
    }

    /// Store new dependencies. A value different from the current one
    /// replaces any in-flight automatic fetch with a new one. Returns whether
    /// a fetch was started.
    pub async fn set_dependencies(&self, deps: D) -> bool {
        let mut auto = self.auto.lock().await;
        if auto.deps == deps {
            return false;
        }
        auto.deps = deps.clone();
        if let Some(previous) = auto.task.take() {
            previous.abort();
        }
        auto.task = Some(spawn_fetch(&self.shared, deps));
        true
    }

    /// Fetch again with the current dependencies and wait for this
    /// invocation to settle or be superseded.
    pub async fn refetch(&self) {
        let deps = self.auto.lock().await.deps.clone();
        let generation = self.shared.start();
        self.shared.fetch(generation, deps).await;
    }

    #[must_use]
    pub fn state(&self) -> QueryState<T> {
        self.shared.fenced.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.shared.fenced.subscribe()
    }

    /// Resolve with the first state where `loading` is false.
    pub async fn wait_settled(&self) -> QueryState<T> {
        self.shared.fenced.wait_settled().await
    }
}

impl<T, D> Drop for Query<T, D> {
    fn drop(&mut self) {
        if let Some(task) = self.auto.get_mut().task.take() {
            task.abort();
        }
    }
}

// The generation is taken before spawning so the superseded task, whenever
// the runtime gets to dropping it, can no longer clear `loading`.
fn spawn_fetch<T, D>(shared: &Arc<Shared<T, D>>, deps: D) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    D: Send + Sync + 'static,
{
    let generation = shared.start();
    let shared = Arc::clone(shared);
    tokio::spawn(async move { shared.fetch(generation, deps).await })
}
