//! Logged-in user and bearer token, kept in local storage.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::RecipeApi;
use crate::error::{SessionError, StorageError};
use crate::storage::{self, KeyValueStore, AUTH_SESSION_KEY};
use crate::types::{AuthResponse, LoginRequest, RegisterRequest, UserProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

impl From<AuthResponse> for AuthSession {
    fn from(response: AuthResponse) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            user: response.user,
        }
    }
}

pub struct SessionStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn current(&self) -> Option<AuthSession> {
        match storage::get_json(&*self.store, AUTH_SESSION_KEY) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "session: discarding unreadable session");
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.access_token)
    }

    pub fn save(&self, session: &AuthSession) -> Result<(), StorageError> {
        storage::set_json(&*self.store, AUTH_SESSION_KEY, session)
    }

    /// Forget the session. Also used when the server rejects the token.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(AUTH_SESSION_KEY)
    }

    pub async fn login<A: RecipeApi + ?Sized>(
        &self,
        api: &A,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SessionError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let session = AuthSession::from(api.login(&request).await?);
        self.save(&session)?;
        tracing::info!(email = %session.user.email, "session: logged in");
        Ok(session)
    }

    /// Create an account and log straight into it.
    pub async fn register<A: RecipeApi + ?Sized>(
        &self,
        api: &A,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthSession, SessionError> {
        if password != confirm_password {
            return Err(SessionError::PasswordMismatch);
        }
        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        };
        let session = AuthSession::from(api.register(&request).await?);
        self.save(&session)?;
        tracing::info!(email = %session.user.email, "session: registered");
        Ok(session)
    }

    pub fn logout(&self) -> Result<bool, StorageError> {
        let had_session = self.current().is_some();
        self.clear()?;
        Ok(had_session)
    }
}
