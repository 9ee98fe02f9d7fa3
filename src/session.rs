//! The signed-in identity and its durable copy.
//!
//! DESIGN
//! ======
//! `SessionStore` is an explicitly constructed handle; share it behind an
//! `Arc`. Memory state is published through a `watch` channel and mirrored
//! into a [`KeyValueStore`] under [`SESSION_KEY`]. Every write holds the
//! store's write lock across its persist and publish steps, so concurrent
//! `login`, `logout` and `update_user_data` calls cannot interleave.
//!
//! Storage is written before memory on login and update: a session that is
//! visible in memory is always one that survives a restart. Logout is the
//! exception and clears memory even when the storage clear fails.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::actions::{ChangePassword, Login};
use crate::client::ApiClient;
use crate::models::{User, UserPatch};
use crate::storage::{KeyValueStore, StorageError};

/// Storage key of the persisted identity.
pub const SESSION_KEY: &str = "user";

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Durable storage has not been read yet. Not the same as signed out.
    Loading,
    Unauthenticated,
    Authenticated(User),
}

impl SessionState {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Loading | Self::Unauthenticated => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Invalid(String),
    /// The backend or the network refused the request.
    #[error("{0}")]
    Rejected(String),
    #[error("not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("stored session is unreadable: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to encode session: {0}")]
    Encode(#[source] serde_json::Error),
}

pub struct SessionStore {
    client: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
    writes: Mutex<()>,
}

impl SessionStore {
    /// New store in the `Loading` state. Call [`SessionStore::rehydrate`] next.
    #[must_use]
    pub fn new(client: ApiClient, storage: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self { client, storage, state, writes: Mutex::new(()) }
    }

    /// Load the persisted identity. Leaves `Loading` in every case.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the snapshot does not
    /// parse; the store is then `Unauthenticated`.
    pub async fn rehydrate(&self) -> Result<Option<User>, SessionError> {
        let _guard = self.writes.lock().await;
        let restored = match self.storage.get(SESSION_KEY).await {
            Ok(Some(text)) => serde_json::from_str::<User>(&text).map(Some).map_err(SessionError::Corrupt),
            Ok(None) => Ok(None),
            Err(e) => Err(SessionError::Storage(e)),
        };

        match &restored {
            Ok(Some(user)) => {
                tracing::debug!(user_id = %user.id, "session restored");
                self.state.send_replace(SessionState::Authenticated(user.clone()));
            }
            Ok(None) => {
                self.state.send_replace(SessionState::Unauthenticated);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to restore session");
                self.state.send_replace(SessionState::Unauthenticated);
            }
        }
        restored
    }

    /// Authenticate and hold the returned identity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for malformed input,
    /// [`SessionError::Rejected`] with the backend's message when the
    /// credentials are refused, or a storage error if the identity cannot be
    /// persisted. State is unchanged on error.
    pub async fn login(&self, phone: &str, password: &str) -> Result<User, SessionError> {
        validate_login(phone, password)?;

        let request = Login { phone: phone.to_owned(), password: password.to_owned() };
        let user = self
            .client
            .try_request(&request)
            .await
            .map_err(|e| SessionError::Rejected(e.to_string()))?;

        let _guard = self.writes.lock().await;
        self.persist(&user).await?;
        self.state.send_replace(SessionState::Authenticated(user.clone()));
        tracing::info!(user_id = %user.id, role = ?user.role, "signed in");
        Ok(user)
    }

    /// Forget the identity in memory and in storage.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the durable copy could not be removed.
    /// Memory is cleared regardless.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let _guard = self.writes.lock().await;
        let removed = self.storage.remove(SESSION_KEY).await;
        self.state.send_replace(SessionState::Unauthenticated);
        if let Err(e) = removed {
            tracing::warn!(error = %e, "failed to clear stored session");
            return Err(e.into());
        }
        tracing::info!("signed out");
        Ok(())
    }

    /// Merge `patch` into the current identity, persist it, then publish it.
    /// Returns `Ok(None)` when nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged identity cannot be encoded or stored;
    /// memory keeps the previous identity in that case.
    pub async fn update_user_data(&self, patch: UserPatch) -> Result<Option<User>, SessionError> {
        let _guard = self.writes.lock().await;
        let Some(current) = self.current_user() else {
            return Ok(None);
        };

        let updated = current.merged(&patch).map_err(SessionError::Encode)?;
        if let Err(e) = self.persist(&updated).await {
            tracing::warn!(user_id = %current.id, error = %e, "failed to persist session update");
            return Err(e);
        }
        self.state.send_replace(SessionState::Authenticated(updated.clone()));
        Ok(Some(updated))
    }

    /// Replace the signed-in user's password and clear the first-login flag.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for unacceptable input,
    /// [`SessionError::NotAuthenticated`] when nobody is signed in, or
    /// [`SessionError::Rejected`] when the backend refuses the change.
    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> Result<User, SessionError> {
        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err(SessionError::Invalid("Please fill in all fields".to_owned()));
        }
        validate_new_password(new, confirm)?;
        let user = self.current_user().ok_or(SessionError::NotAuthenticated)?;

        let request =
            ChangePassword { user_id: user.id.clone(), old_password: current.to_owned(), new_password: new.to_owned() };
        let accepted = self
            .client
            .try_request(&request)
            .await
            .map_err(|e| SessionError::Rejected(e.to_string()))?;
        if !accepted {
            return Err(SessionError::Rejected("Failed to change password".to_owned()));
        }

        let patch = UserPatch { is_first_login: Some(false), ..UserPatch::default() };
        self.update_user_data(patch).await?.ok_or(SessionError::NotAuthenticated)
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Loading)
    }

    /// Whether the signed-in user still has to replace the initial password.
    #[must_use]
    pub fn requires_password_change(&self) -> bool {
        self.state.borrow().user().is_some_and(|user| user.is_first_login)
    }

    async fn persist(&self, user: &User) -> Result<(), SessionError> {
        let text = serde_json::to_string(user).map_err(SessionError::Encode)?;
        self.storage.set(SESSION_KEY, &text).await?;
        Ok(())
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// # Errors
///
/// Returns [`SessionError::Invalid`] unless `phone` is exactly ten ASCII
/// digits and `password` is non-empty.
pub fn validate_login(phone: &str, password: &str) -> Result<(), SessionError> {
    if phone.len() != 10 || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SessionError::Invalid("Please enter a valid 10-digit mobile number".to_owned()));
    }
    if password.is_empty() {
        return Err(SessionError::Invalid("Please enter your password".to_owned()));
    }
    Ok(())
}

/// # Errors
///
/// Returns [`SessionError::Invalid`] if the passwords differ, or if `new` is
/// empty or shorter than six characters.
pub fn validate_new_password(new: &str, confirm: &str) -> Result<(), SessionError> {
    if new.is_empty() {
        return Err(SessionError::Invalid("Please enter a new password".to_owned()));
    }
    if new != confirm {
        return Err(SessionError::Invalid("New passwords do not match".to_owned()));
    }
    if new.chars().count() < MIN_PASSWORD_LEN {
        return Err(SessionError::Invalid("Password must be at least 6 characters long".to_owned()));
    }
    Ok(())
}
