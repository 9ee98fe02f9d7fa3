//! # academy-client
//!
//! Typed data-access core for the cricket-academy backend: a uniform
//! response envelope, an HTTP transport, the action catalog, query and
//! mutation state containers, and the persisted login session.
//!
//! LAYERING
//! ========
//! `transport` speaks HTTP and knows nothing about actions. `client` binds a
//! transport to the typed catalog in `actions` and always yields an
//! [`Envelope`]. `query` and `mutation` turn envelopes into observable UI
//! state. `session` owns the authenticated [`models::User`] and mirrors it
//! into a [`storage::KeyValueStore`].

pub mod actions;
pub mod client;
pub mod config;
pub mod envelope;
pub mod models;
pub mod mutation;
pub mod query;
pub mod session;
pub mod storage;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use envelope::Envelope;
pub use mutation::Mutation;
pub use query::{Query, QueryState};
pub use session::{SessionState, SessionStore};
