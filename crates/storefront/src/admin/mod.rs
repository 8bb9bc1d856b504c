//! Admin product management.
//!
//! Drafts are edited locally, validated, then sent to the backend with the
//! logged-in admin's bearer token. Requires [`UserRole::Admin`].
//!
//! [`UserRole::Admin`]: ryj_core::UserRole::Admin

mod bulk;
mod draft;

use ryj_core::{Product, ProductId, SpecsError};
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiClient, ApiError};
use crate::auth::{AuthError, AuthSession};

pub use bulk::BulkImport;
pub use draft::ProductDraft;

/// Errors that can occur in admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("title is required")]
    MissingTitle,

    #[error("price cannot be negative")]
    NegativePrice,

    /// Edited specs text is not JSON.
    #[error("{0}")]
    Specs(#[from] SpecsError),

    /// Pasted bulk JSON is not an array of product objects.
    #[error("invalid bulk import: {0}")]
    Bulk(serde_json::Error),

    #[error("bulk import is empty")]
    EmptyBulk,

    /// Not logged in as an admin.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Create the draft's product, or update it when the draft has an id.
///
/// # Errors
///
/// Returns a validation error, [`AdminError::Auth`] when the session is not
/// an admin, or the backend's error.
#[instrument(skip_all, fields(title = %draft.title, product_id = ?draft.id))]
pub async fn save_product(
    api: &ApiClient,
    auth: &AuthSession,
    draft: &ProductDraft,
) -> Result<Product, AdminError> {
    let payload = draft.to_payload()?;
    let (token, _) = auth.require_admin()?;

    let product = match &draft.id {
        Some(id) => api.update_product(token, id, &payload).await?,
        None => api.create_product(token, &payload).await?,
    };
    Ok(product)
}

/// Upload an image for `id` and return the stored URL.
///
/// # Errors
///
/// Returns [`AdminError::Auth`] when the session is not an admin, or the
/// backend's error.
#[instrument(skip(api, auth, bytes), fields(product_id = %id))]
pub async fn upload_image(
    api: &ApiClient,
    auth: &AuthSession,
    id: &ProductId,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, AdminError> {
    let (token, _) = auth.require_admin()?;
    Ok(api.upload_product_image(token, id, file_name, bytes).await?)
}
