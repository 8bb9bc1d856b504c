//! Product catalog: sources, browsing helpers and the stock directory.
//!
//! A [`ProductSource`] yields product snapshots. Two sources exist: the REST
//! backend ([`ApiClient`]) and a static JSON file ([`StaticCatalog`]).
//! [`Catalog`] picks one at startup.

mod file;
mod search;
mod stock;

use std::future::Future;
use std::path::PathBuf;

use ryj_core::{Product, ProductId};
use thiserror::Error;

use crate::api::{ApiClient, ApiError};

pub use file::StaticCatalog;
pub use search::search;
pub use stock::{StockDirectory, StockSnapshot};

/// Errors that can occur when reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with this id.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Backend request failed.
    #[error("API error: {0}")]
    Api(ApiError),

    /// Catalog file could not be read.
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not valid JSON.
    #[error("Invalid catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ApiError> for CatalogError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

/// Something that can produce product snapshots.
pub trait ProductSource: Send + Sync {
    /// Every product currently offered.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, CatalogError>> + Send;

    /// A single product.
    ///
    /// Resolves to [`CatalogError::NotFound`] for unknown ids.
    fn get_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Product, CatalogError>> + Send;
}

impl ProductSource for ApiClient {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(Self::list_products(self).await?)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        match Self::get_product(self, id).await {
            Ok(product) => Ok(product),
            Err(ApiError::NotFound(_)) => Err(CatalogError::NotFound(id.clone())),
            Err(e) => Err(e.into()),
        }
    }
}

/// The product source chosen by configuration.
#[derive(Debug, Clone)]
pub enum Catalog {
    /// Live backend.
    Api(ApiClient),
    /// Static JSON file.
    File(StaticCatalog),
}

impl ProductSource for Catalog {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        match self {
            Self::Api(client) => ProductSource::list_products(client).await,
            Self::File(catalog) => catalog.list_products().await,
        }
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        match self {
            Self::Api(client) => ProductSource::get_product(client, id).await,
            Self::File(catalog) => catalog.get_product(id).await,
        }
    }
}

/// Featured products, in catalog order.
#[must_use]
pub fn featured(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.featured).collect()
}

/// Products listed under `category` (case-insensitive), in catalog order.
#[must_use]
pub fn in_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.in_category(category)).collect()
}

/// Up to `limit` other products sharing `product`'s first category.
#[must_use]
pub fn related<'a>(products: &'a [Product], product: &Product, limit: usize) -> Vec<&'a Product> {
    let Some(category) = product.categories.first() else {
        return Vec::new();
    };
    products
        .iter()
        .filter(|p| p.id != product.id && p.in_category(category))
        .take(limit)
        .collect()
}

/// Every category in use, first-seen order, case-insensitively unique.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    ryj_core::normalize_categories(products.iter().flat_map(|p| p.categories.iter().cloned()))
}
