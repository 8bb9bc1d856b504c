//! Catalog served from a JSON file.

use std::path::Path;
use std::sync::Arc;

use ryj_core::{Product, ProductId};
use serde::Deserialize;

use super::{CatalogError, ProductSource};
use crate::api::wire::{ProductList, RawProduct};

/// File layout: a product array, `{ "products": [...] }`, or separate
/// `products` and `services` arrays.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Sections {
        #[serde(default)]
        products: Vec<RawProduct>,
        #[serde(default)]
        services: Vec<RawProduct>,
    },
    List(ProductList),
}

/// An immutable in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Arc<Vec<Product>>,
}

impl StaticCatalog {
    /// Wrap an existing product list.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(products),
        }
    }

    /// Load a catalog file. Records use the same shape as the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a catalog.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let products = match file {
            CatalogFile::List(list) => list.into_products(),
            CatalogFile::Sections { products, services } => {
                ProductList::Bare(products.into_iter().chain(services).collect()).into_products()
            }
        };

        tracing::info!(path = %path.display(), count = products.len(), "Loaded static catalog");
        Ok(Self::new(products))
    }

    /// All products, in file order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

impl ProductSource for StaticCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.to_vec())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}
