//! Signed-in user state and stored credentials.
//!
//! A 401 from the API ends the session: [`Session::expire`] clears the
//! credential store and forgets the current user so the app falls back to
//! the sign-in flow.

use std::sync::{Arc, PoisonError, RwLock};

use betterangels_core::types::ServerId;
use serde::{Deserialize, Serialize};

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: ServerId,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Where the API token lives between runs (keychain, file, memory).
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, token: &str) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Session handle shared by the API client and the screens.
pub struct Session {
    store: Arc<dyn CredentialStore>,
    user: RwLock<Option<CurrentUser>>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            user: RwLock::new(None),
        }
    }

    /// A session backed by a [`MemoryCredentialStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCredentialStore::new()))
    }

    /// Store the token and remember who signed in.
    pub fn sign_in(&self, token: &str, user: CurrentUser) {
        self.store.save(token);
        tracing::info!(user_id = %user.id, "Signed in");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    /// Store a token without a known user (e.g. from configuration).
    pub fn restore_token(&self, token: &str) {
        self.store.save(token);
    }

    pub fn token(&self) -> Option<String> {
        self.store.load()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// End the session after the API rejected our credentials.
    pub fn expire(&self) {
        let user = self
            .user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.store.clear();
        tracing::warn!(
            user_id = user.as_ref().map(|u| u.id.as_str()).unwrap_or("-"),
            "Session expired, credentials cleared"
        );
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("user", &self.current_user())
            .finish()
    }
}
