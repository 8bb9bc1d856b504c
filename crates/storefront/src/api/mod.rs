//! REST client for the storefront backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for products and accounts
//! - Product detail responses are cached in memory via `moka`
//!   (TTL from `RYJ_PRODUCT_CACHE_TTL_SECS`); admin writes invalidate them
//! - Listings are never cached, they feed the stock directory
//!
//! # Endpoints
//!
//! - `GET /products`, `GET /products/{id}`
//! - `POST /auth/login`, `POST /auth/register`
//! - `POST /products`, `PUT /products/{id}`, `POST /products/{id}/image`
//!   (bearer token)

mod auth;
mod products;
pub mod wire;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::StatusCode;
use ryj_core::{Product, ProductId};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::StorefrontConfig;

pub use wire::{
    LoginResponse, ProductPayload, RawProduct, RegisterRequest, UploadResponse, UserProfile,
};

const CACHE_CAPACITY: u64 = 1000;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Missing or rejected bearer token, or bad credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Client for the storefront backend.
///
/// Cheap to clone; clones share the connection pool and the product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Cache<ProductId, Product>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from the storefront configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("ryj-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let products = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: with_trailing_slash(config.api_base_url.clone()),
                products,
            }),
        })
    }

    /// The backend base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve a stored image reference to a fetchable URL.
    ///
    /// See [`resolve_image_url`].
    #[must_use]
    pub fn image_url(&self, reference: &str) -> Option<String> {
        resolve_image_url(&self.inner.base_url, reference)
    }

    /// Build an endpoint URL relative to the base. Path segments are joined
    /// with `/` and ids must already be percent-encoded.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Send a request and decode the JSON body.
    async fn send_json<T>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }
}

/// Map a non-success response to an error, preferring the backend's
/// `{ "message": ... }` body when present.
fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<wire::ErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect::<String>(),
        |e| e.message,
    );

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        _ => {
            tracing::error!(
                status = %status,
                message = %message,
                "Backend returned non-success status"
            );
            ApiError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Resolve a stored image reference against the backend base URL.
///
/// - absolute `http(s)://` URLs are returned unchanged
/// - `/path` references are appended to the base
/// - bare file names live under `/uploads/`
///
/// Blank references resolve to `None`.
#[must_use]
pub fn resolve_image_url(base_url: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return Some(reference.to_string());
    }

    let base = base_url.as_str().trim_end_matches('/');
    if reference.starts_with('/') {
        Some(format!("{base}{reference}"))
    } else {
        Some(format!("{base}/uploads/{reference}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = StorefrontConfig::new(Url::parse(base).unwrap(), ".ryj");
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_resolve_image_url() {
        let base = Url::parse("http://localhost:4000").unwrap();
        assert_eq!(
            resolve_image_url(&base, "https://cdn.ryj.pe/a.jpg").as_deref(),
            Some("https://cdn.ryj.pe/a.jpg")
        );
        assert_eq!(
            resolve_image_url(&base, "/uploads/a.jpg").as_deref(),
            Some("http://localhost:4000/uploads/a.jpg")
        );
        assert_eq!(
            resolve_image_url(&base, "a.jpg").as_deref(),
            Some("http://localhost:4000/uploads/a.jpg")
        );
        assert_eq!(resolve_image_url(&base, "  "), None);
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("https://ryj.pe/api");
        assert_eq!(api.base_url().as_str(), "https://ryj.pe/api/");
        assert_eq!(
            api.endpoint("/products").unwrap().as_str(),
            "https://ryj.pe/api/products"
        );
        assert_eq!(
            api.image_url("x.png").as_deref(),
            Some("https://ryj.pe/api/uploads/x.png")
        );
    }

    #[test]
    fn test_status_error_mapping() {
        let err = status_error(StatusCode::NOT_FOUND, r#"{"message":"Producto no encontrado"}"#);
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Producto no encontrado"));

        let err = status_error(StatusCode::UNAUTHORIZED, "nope");
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "nope"));

        let err = status_error(StatusCode::BAD_GATEWAY, r#"{"error":"upstream"}"#);
        assert!(matches!(err, ApiError::Api { status: 502, ref message } if message == "upstream"));
    }
}
