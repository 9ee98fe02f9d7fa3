//! Uniform response envelope.
//!
//! Every call through [`crate::ApiClient::request`] settles into an
//! `Envelope`, whatever happened on the wire. Fields are private so the
//! "payload xor message" invariant can only be established through
//! [`Envelope::ok`] and [`Envelope::fail`].

#[cfg(test)]
#[path = "envelope_test.rs"]
mod tests;

use std::fmt::Display;

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Message used when a failure carries no text of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Result of one remote call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    timestamp: String,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message: None, timestamp: now_timestamp() }
    }

    /// Failed envelope. An empty message is replaced by [`DEFAULT_ERROR_MESSAGE`].
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() { DEFAULT_ERROR_MESSAGE.to_owned() } else { message };
        Self { success: false, data: None, message: Some(message), timestamp: now_timestamp() }
    }

    /// Build from a `Result`, rendering the error with `Display`.
    #[must_use]
    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Client-side RFC 3339 construction time.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Convert into a `Result`, with the failure message as the error.
    ///
    /// # Errors
    ///
    /// Returns the envelope's message when it is a failure.
    pub fn into_result(self) -> Result<T, String> {
        match self.data {
            Some(data) if self.success => Ok(data),
            _ => Err(self.message.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned())),
        }
    }

    /// Transform the payload, keeping the outcome and timestamp.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope { success: self.success, data: self.data.map(f), message: self.message, timestamp: self.timestamp }
    }
}

/// Current UTC time as RFC 3339.
#[must_use]
pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}
