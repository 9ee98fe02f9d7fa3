//! Explicitly triggered write state.
//!
//! `Mutation::mutate` runs one call and hands its own result back to its
//! caller. Overlapping calls all run to completion, but only the most
//! recently started one may write the shared state; an older call that
//! settles late still returns its payload, it just no longer shows. A call
//! dropped before it settles leaves the state idle-like, not loading.

#[cfg(test)]
#[path = "mutation_test.rs"]
mod tests;

use std::future::Future;

use tokio::sync::watch;

use crate::envelope::Envelope;
use crate::query::{Fenced, QueryState};

pub type MutationState<T> = QueryState<T>;

pub struct Mutation<T> {
    fenced: Fenced<T>,
}

impl<T: Clone + Send + Sync> Mutation<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { fenced: Fenced::new(QueryState::idle()) }
    }

    /// Invoke `call(params)`. Returns the payload on success, `None` on failure;
    /// the failure text is in [`Mutation::state`].
    pub async fn mutate<P, F, Fut>(&self, call: F, params: P) -> Option<T>
    where
        F: FnOnce(P) -> Fut,
        Fut: Future<Output = Envelope<T>>,
    {
        let generation = self.fenced.begin(|state| *state = QueryState::pending());
        let in_flight = self.fenced.in_flight(generation);
        let settled = QueryState::settled(call(params).await);
        let data = settled.data.clone();
        in_flight.settle(settled);
        data
    }

    #[must_use]
    pub fn state(&self) -> MutationState<T> {
        self.fenced.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MutationState<T>> {
        self.fenced.subscribe()
    }

    /// Back to the idle state. In-flight calls can no longer write it.
    pub fn reset(&self) {
        self.fenced.replace(QueryState::idle());
    }
}

impl<T: Clone + Send + Sync> Default for Mutation<T> {
    fn default() -> Self {
        Self::new()
    }
}
