//! Authentication session.
//!
//! Holds the bearer token and profile returned by `POST /auth/login`, and
//! persists them under `ryj_token` / `ryj_user` so a later session starts
//! logged in. The token is a [`SecretString`] and never shows up in `Debug`
//! output or logs.

use std::sync::Arc;

use ryj_core::{Email, EmailError, UserRole};
use secrecy::SecretString;
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiClient, ApiError, RegisterRequest, UserProfile};
use crate::storage::{self, SessionStorage, StorageError, keys};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email is not well formed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A required field was blank.
    #[error("{0} cannot be empty")]
    MissingField(&'static str),

    /// No user is logged in.
    #[error("not logged in")]
    NotLoggedIn,

    /// The logged-in user is not an admin.
    #[error("admin role required")]
    Forbidden,

    /// Backend request failed (including bad credentials).
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// The current login, if any.
pub struct AuthSession {
    token: Option<SecretString>,
    user: Option<UserProfile>,
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &self.token)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// A logged-out session.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            token: None,
            user: None,
            storage,
        }
    }

    /// Restore the persisted login. Missing or malformed records, or a token
    /// without a user (or the reverse), yield a logged-out session.
    #[must_use]
    pub fn restore(storage: Arc<dyn SessionStorage>) -> Self {
        let token = load_or_warn::<String>(storage.as_ref(), keys::TOKEN);
        let user = load_or_warn::<UserProfile>(storage.as_ref(), keys::USER);

        match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => Self {
                token: Some(SecretString::from(token)),
                user: Some(user),
                storage,
            },
            _ => Self::new(storage),
        }
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// The logged-in user.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// The bearer token.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Log in and persist the token and profile.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed input or if the backend rejects the
    /// credentials.
    #[instrument(skip(self, api, password))]
    pub async fn login(
        &mut self,
        api: &ApiClient,
        email: &str,
        password: &str,
    ) -> Result<&UserProfile, AuthError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let response = api.login(email.as_str(), password).await?;
        if response.token.is_empty() {
            return Err(AuthError::Api(ApiError::Unauthorized(
                "login response carried no token".to_string(),
            )));
        }

        self.persist(&response.token, &response.user);
        tracing::info!(user_id = %response.user.id, role = %response.user.role, "Logged in");

        self.token = Some(SecretString::from(response.token));
        Ok(self.user.insert(response.user))
    }

    /// Register a new account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns an error for blank fields, a malformed email, or if the
    /// backend rejects the registration.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(
        api: &ApiClient,
        request: &RegisterRequest,
    ) -> Result<serde_json::Value, AuthError> {
        for (field, value) in [
            ("name", &request.name),
            ("last_name", &request.last_name),
            ("password", &request.password),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::MissingField(field));
            }
        }
        Email::parse(&request.email)?;

        Ok(api.register(request).await?)
    }

    /// Forget the login, in memory and in storage.
    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove(key) {
                log_storage_failure(&e);
            }
        }
        tracing::info!("Logged out");
    }

    /// The token and profile of a logged-in admin.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotLoggedIn`] or [`AuthError::Forbidden`].
    pub fn require_admin(&self) -> Result<(&SecretString, &UserProfile), AuthError> {
        let (Some(token), Some(user)) = (self.token.as_ref(), self.user.as_ref()) else {
            return Err(AuthError::NotLoggedIn);
        };
        if user.role != UserRole::Admin {
            return Err(AuthError::Forbidden);
        }
        Ok((token, user))
    }

    fn persist(&self, token: &str, user: &UserProfile) {
        let result = storage::save_json(self.storage.as_ref(), keys::TOKEN, token)
            .and_then(|()| storage::save_json(self.storage.as_ref(), keys::USER, user));
        if let Err(e) = result {
            log_storage_failure(&e);
        }
    }
}

fn load_or_warn<T>(storage: &dyn SessionStorage, key: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned,
{
    storage::load_json(storage, key).unwrap_or_else(|e| {
        tracing::warn!(error = %e, key, "Ignoring unreadable login record");
        None
    })
}

fn log_storage_failure(error: &StorageError) {
    tracing::warn!(error = %error, "Failed to persist login");
}
