//! Catalog products and services.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, Specs, StockLevel};

/// Whether an offering is a physical product or a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    #[default]
    Product,
    /// Services (repairs, maintenance) have no physical stock.
    Service,
}

/// A catalog entry as read from the backend.
///
/// The core only reads product snapshots; the backend owns their lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub kind: ProductKind,
    /// Unit price. For services this is the "from" price.
    pub price: Decimal,
    pub stock: StockLevel,
    /// Ordered, de-duplicated category names.
    pub categories: Vec<String>,
    /// Image reference as stored by the backend (URL, `/path` or file name).
    pub thumbnail: Option<String>,
    pub featured: bool,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub specs: Specs,
}

impl Product {
    /// Create a physical product with finite stock and no optional fields.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        price: Decimal,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ProductKind::Product,
            price,
            stock: StockLevel::Finite(stock),
            categories: Vec::new(),
            thumbnail: None,
            featured: false,
            summary: None,
            description: None,
            specs: Specs::default(),
        }
    }

    /// Create a service offering with unlimited stock.
    #[must_use]
    pub fn service(id: impl Into<ProductId>, title: impl Into<String>, price: Decimal) -> Self {
        Self {
            kind: ProductKind::Service,
            stock: StockLevel::Unlimited,
            ..Self::new(id, title, price, 0)
        }
    }

    /// Builder-style category assignment.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = normalize_categories(categories);
        self
    }

    /// Builder-style thumbnail assignment.
    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Builder-style featured flag.
    #[must_use]
    pub const fn featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    /// Whether the product can currently be added to a cart.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !self.stock.is_out_of_stock()
    }

    /// Whether the product is listed under `category` (case-insensitive).
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category.trim()))
    }
}

/// Trim, drop empties and drop case-insensitive duplicates, keeping order.
#[must_use]
pub fn normalize_categories<I, S>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for category in categories {
        let category: String = category.into();
        let category = category.trim();
        if category.is_empty() || out.iter().any(|c| c.eq_ignore_ascii_case(category)) {
            continue;
        }
        out.push(category.to_string());
    }
    out
}
