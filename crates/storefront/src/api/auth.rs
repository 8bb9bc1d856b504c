//! Account endpoints.

use tracing::instrument;

use super::wire::{LoginRequest, LoginResponse, RegisterRequest};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Exchange credentials for a bearer token and the user profile.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials, or an error
    /// if the request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint("auth/login")?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&LoginRequest { email, password });
        self.send_json(request).await
    }

    /// Register a new customer account. Returns the backend's response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration or the
    /// request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, ApiError> {
        let url = self.endpoint("auth/register")?;
        self.send_json(self.inner.client.post(url).json(request))
            .await
    }
}
