//! Cart rows.

use rust_decimal::Decimal;
use ryj_core::{Product, ProductId};
use serde::{Deserialize, Serialize};

/// One cart row.
///
/// Title, unit price and thumbnail are snapshots taken when the product was
/// first added; later catalog changes do not alter them.
///
/// Serialized with the persisted cart field names
/// (`id`, `title`, `price`, `thumb`, `qty`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub title: String,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(rename = "thumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "qty", default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

impl LineItem {
    /// A row for `product` with `quantity` units.
    #[must_use]
    pub fn new(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            unit_price: product.price,
            thumbnail: product.thumbnail.clone(),
            quantity,
        }
    }

    /// `unit_price × quantity`, unrounded. Saturates at the `Decimal` range.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }
}
