//! Unified error handling.
//!
//! Each concern has its own error enum; [`StorefrontError`] wraps them all so
//! session-level operations can use a single `Result` type.

use thiserror::Error;

use crate::admin::AdminError;
use crate::api::ApiError;
use crate::auth::AuthError;
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Storefront-level error type.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Catalog could not be read.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Session storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Checkout was refused.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Admin operation failed.
    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    /// Authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl StorefrontError {
    /// Whether this is an infrastructure failure worth reporting, as opposed
    /// to something the user can fix (bad input, missing login, unknown id).
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Api(e)
            | Self::Catalog(CatalogError::Api(e))
            | Self::Auth(AuthError::Api(e))
            | Self::Admin(AdminError::Api(e)) => is_internal_api(e),
            Self::Storage(_) | Self::Catalog(CatalogError::Io { .. }) => true,
            Self::Config(_)
            | Self::Catalog(_)
            | Self::Checkout(_)
            | Self::Admin(_)
            | Self::Auth(_) => false,
        }
    }
}

const fn is_internal_api(error: &ApiError) -> bool {
    !matches!(error, ApiError::NotFound(_) | ApiError::Unauthorized(_))
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
