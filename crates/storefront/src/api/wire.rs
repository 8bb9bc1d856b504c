//! Wire shapes exchanged with the backend REST API.
//!
//! The backend is loose about types: ids may be strings or numbers, prices
//! may be numbers or strings, stock may be missing. Everything is normalized
//! here so the rest of the crate only sees [`Product`].

use std::str::FromStr;

use rust_decimal::Decimal;
use ryj_core::{
    Product, ProductId, ProductKind, Specs, StockLevel, UserId, UserRole, normalize_categories,
};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Product as returned by `GET /products` and `GET /products/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(alias = "_id", default)]
    pub id: Value,
    #[serde(alias = "name", default)]
    pub title: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub price_from: Value,
    #[serde(default)]
    pub stock: Value,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(alias = "image", default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specs: Specs,
}

impl RawProduct {
    /// Normalize into a [`Product`]. Returns `None` when the record has no id.
    #[must_use]
    pub fn into_product(self) -> Option<Product> {
        let id = id_text(&self.id)?;
        let kind = match self.kind.as_deref().map(str::trim) {
            Some(k) if k.eq_ignore_ascii_case("service") => ProductKind::Service,
            _ => ProductKind::Product,
        };

        let price = match kind {
            ProductKind::Service => decimal_from(&self.price)
                .or_else(|| decimal_from(&self.price_from))
                .unwrap_or_default(),
            ProductKind::Product => decimal_from(&self.price).unwrap_or_default(),
        };

        let stock = match kind {
            ProductKind::Service => StockLevel::Unlimited,
            ProductKind::Product => stock_from(&self.stock),
        };

        let categories = normalize_categories(
            self.category
                .into_iter()
                .chain(self.categories.unwrap_or_default()),
        );

        Some(Product {
            id: ProductId::new(id),
            title: self.title.trim().to_string(),
            kind,
            price,
            stock,
            categories,
            thumbnail: non_blank(self.thumb),
            featured: self.featured.unwrap_or(false),
            summary: non_blank(self.summary),
            description: non_blank(self.description),
            specs: self.specs,
        })
    }
}

/// Body of `GET /products`: either a bare array or `{ "products": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductList {
    Bare(Vec<RawProduct>),
    Wrapped { products: Vec<RawProduct> },
}

impl ProductList {
    /// Normalize every record, skipping the ones without an id.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        let raw = match self {
            Self::Bare(products) | Self::Wrapped { products } => products,
        };
        let total = raw.len();
        let products: Vec<Product> = raw.into_iter().filter_map(RawProduct::into_product).collect();
        if products.len() < total {
            tracing::warn!(
                skipped = total - products.len(),
                "Skipped product records without an id"
            );
        }
        products
    }
}

/// Body sent on product create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub title: String,
    pub kind: ProductKind,
    pub price: Decimal,
    pub stock: u32,
    /// Primary category, kept for backends that only read one.
    pub category: String,
    pub categories: Vec<String>,
    pub featured: bool,
    pub summary: String,
    pub description: String,
    pub specs: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
}

/// Body of `POST /products/{id}/image`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Body sent to `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body returned by `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Body sent to `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub last_name: String,
    /// ISO date (`YYYY-MM-DD`).
    pub birth_date: String,
    pub email: String,
    pub password: String,
}

/// Account details returned on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id", deserialize_with = "id_from_any")]
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

impl UserProfile {
    /// Name for greetings, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            _ => self.email.clone(),
        }
    }
}

/// Error body the backend sends alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(alias = "error")]
    pub message: String,
}

fn id_from_any<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let value = Value::deserialize(deserializer)?;
    id_text(&value)
        .map(T::from)
        .ok_or_else(|| D::Error::custom("expected a string or numeric id"))
}

pub(crate) fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn decimal_from(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Missing or non-numeric stock counts as out of stock.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn stock_from(value: &Value) -> StockLevel {
    let Value::Number(n) = value else {
        return StockLevel::OUT_OF_STOCK;
    };
    let units = n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| f.floor() as u64)
    });
    StockLevel::Finite(units.map_or(0, |u| u32::try_from(u).unwrap_or(u32::MAX)))
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
