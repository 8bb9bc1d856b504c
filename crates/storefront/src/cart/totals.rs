//! Derived cart aggregates and the cart read model.

use rust_decimal::Decimal;
use ryj_core::{CurrencyCode, Price, ProductId};
use serde::Serialize;

use super::LineItem;

/// `Σ unit_price × quantity`, full precision. Saturates at the `Decimal`
/// range.
#[must_use]
pub fn subtotal(lines: &[LineItem]) -> Decimal {
    lines
        .iter()
        .fold(Decimal::ZERO, |acc, line| acc.saturating_add(line.line_total()))
}

/// `Σ quantity`.
#[must_use]
pub fn count(lines: &[LineItem]) -> u32 {
    lines
        .iter()
        .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
}

/// Cart row display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    pub thumbnail: Option<String>,
}

/// Cart display data: `{ items, subtotal, count }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Price,
    pub count: u32,
}

impl CartView {
    /// Build the read model from the current lines.
    #[must_use]
    pub fn new(lines: &[LineItem], currency: CurrencyCode) -> Self {
        Self {
            items: lines
                .iter()
                .map(|line| CartItemView {
                    product_id: line.product_id.clone(),
                    title: line.title.clone(),
                    quantity: line.quantity,
                    unit_price: Price::new(line.unit_price, currency),
                    line_total: Price::new(line.line_total(), currency),
                    thumbnail: line.thumbnail.clone(),
                })
                .collect(),
            subtotal: Price::new(subtotal(lines), currency),
            count: count(lines),
        }
    }

    /// Whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
