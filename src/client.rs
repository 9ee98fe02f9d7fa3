//! Typed API client over a [`Transport`].
//!
//! `ApiClient::request` is the one entry point every screen-level call goes
//! through: it never fails, it always settles into an [`Envelope`].

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::sync::Arc;

use futures::future::join_all;

use crate::actions::{self, Action, CheckIn, CheckOut, CreateNotification, ListSessions};
use crate::config::ClientConfig;
use crate::envelope::{Envelope, now_timestamp};
use crate::models::{AttendanceRecord, Notification, NotificationKind, TrainingSession};
use crate::transport::{HttpTransport, Transport, TransportError};

/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build a client backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Perform `action`, settling every outcome into an envelope.
    pub async fn request<A: Action>(&self, action: &A) -> Envelope<A::Output> {
        Envelope::from_result(self.try_request(action).await)
    }

    /// Perform `action`, keeping the typed failure.
    ///
    /// # Errors
    ///
    /// Returns the transport failure, or [`TransportError::Decode`] if the
    /// payload does not match the action's output type.
    pub async fn try_request<A: Action>(&self, action: &A) -> Result<A::Output, TransportError> {
        let params = actions::to_params(action)?;
        let value = self.transport.send(A::KIND, A::NAME, params).await?;
        serde_json::from_value(value).map_err(|e| TransportError::Decode(format!("{}: {e}", A::NAME)))
    }

    // =========================================================================
    // COMPOSITES
    // =========================================================================

    /// Sessions scheduled for today's local date.
    pub async fn todays_sessions(&self) -> Envelope<Vec<TrainingSession>> {
        let today = actions::calendar_date(actions::local_now());
        self.request(&ListSessions { date: Some(today) }).await
    }

    /// Check `user_id` into `session_id` now.
    pub async fn check_in(&self, user_id: &str, session_id: &str) -> Envelope<AttendanceRecord> {
        self.request(&CheckIn::at(user_id, session_id, actions::local_now())).await
    }

    /// Check out of the attendance record `record_id` now.
    pub async fn check_out(&self, record_id: &str) -> Envelope<AttendanceRecord> {
        self.request(&CheckOut::at(record_id, actions::local_now())).await
    }

    /// Send one notification per user, concurrently.
    ///
    /// Succeeds only if every notification was created; otherwise the
    /// message names how many failed and the first failure.
    pub async fn send_bulk_notifications(
        &self,
        title: &str,
        message: &str,
        user_ids: &[String],
        kind: NotificationKind,
    ) -> Envelope<bool> {
        let timestamp = now_timestamp();
        let requests = user_ids.iter().map(|user_id| {
            let action = CreateNotification {
                notification: Notification {
                    user_id: user_id.clone(),
                    title: title.to_owned(),
                    message: message.to_owned(),
                    kind,
                    timestamp: timestamp.clone(),
                    is_read: false,
                    ..Notification::default()
                },
            };
            async move { self.request(&action).await }
        });

        let results = join_all(requests).await;
        let failures: Vec<String> =
            results.into_iter().filter_map(|env| env.message().map(str::to_owned)).collect();

        match failures.first() {
            None => Envelope::ok(true),
            Some(first) => {
                tracing::warn!(failed = failures.len(), total = user_ids.len(), "bulk notification incomplete");
                Envelope::fail(format!("failed to notify {} of {} users: {first}", failures.len(), user_ids.len()))
            }
        }
    }
}
