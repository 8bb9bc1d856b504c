//! Editable product form.

use rust_decimal::Decimal;
use ryj_core::{Product, ProductId, ProductKind, ProductType, Specs, normalize_categories};
use serde::Deserialize;
use serde_json::Value;

use super::AdminError;
use crate::api::ProductPayload;
use crate::api::wire::{decimal_from, id_text, non_blank, stock_from};

/// A product being created or edited.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductDraft {
    /// Set when editing an existing product.
    pub id: Option<ProductId>,
    pub title: String,
    pub kind: ProductKind,
    pub price: Decimal,
    pub stock: u32,
    pub categories: Vec<String>,
    pub featured: bool,
    pub summary: String,
    pub description: String,
    pub specs: Specs,
    /// Image reference (`/uploads/x.jpg`, a file name or a full URL).
    pub thumbnail: Option<String>,
}

impl ProductDraft {
    /// A blank draft for a new product.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// A draft pre-filled from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: Some(product.id.clone()),
            title: product.title.clone(),
            kind: product.kind,
            price: product.price,
            stock: product.stock.ceiling().unwrap_or(0),
            categories: product.categories.clone(),
            featured: product.featured,
            summary: product.summary.clone().unwrap_or_default(),
            description: product.description.clone().unwrap_or_default(),
            specs: product.specs.clone(),
            thumbnail: product.thumbnail.clone(),
        }
    }

    /// Replace the categories (trimmed, de-duplicated).
    pub fn set_categories<I, S>(&mut self, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = normalize_categories(categories);
    }

    /// The specs as pretty-printed JSON, for editing as text.
    #[must_use]
    pub fn specs_json(&self) -> String {
        let value: Value = self.specs.clone().into();
        serde_json::to_string_pretty(&value).unwrap_or_default()
    }

    /// Replace the specs from edited JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Specs`] if the text is not valid JSON; the
    /// previous specs are kept.
    pub fn edit_specs_json(&mut self, text: &str) -> Result<(), AdminError> {
        self.specs = Specs::parse_json(text)?;
        Ok(())
    }

    /// Detect the product type from the categories and lay its spec
    /// template over the current specs.
    pub fn apply_spec_template(&mut self) -> Option<ProductType> {
        let product_type = ProductType::detect(self.categories.as_slice())?;
        self.specs = self.specs.with_template(product_type);
        Some(product_type)
    }

    /// Check the fields the backend requires.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MissingTitle`] or [`AdminError::NegativePrice`].
    pub fn validate(&self) -> Result<(), AdminError> {
        if self.title.trim().is_empty() {
            return Err(AdminError::MissingTitle);
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(AdminError::NegativePrice);
        }
        Ok(())
    }

    /// Build the request body.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the draft is not valid.
    pub fn to_payload(&self) -> Result<ProductPayload, AdminError> {
        self.validate()?;

        Ok(ProductPayload {
            title: self.title.trim().to_string(),
            kind: self.kind,
            price: self.price,
            stock: self.stock,
            category: self.categories.first().cloned().unwrap_or_default(),
            categories: self.categories.clone(),
            featured: self.featured,
            summary: self.summary.trim().to_string(),
            description: self.description.trim().to_string(),
            specs: self.specs.clone().into(),
            thumb: self.thumbnail.clone(),
        })
    }
}

/// Loose input shape used by bulk imports.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(super) struct RawDraft {
    #[serde(alias = "_id")]
    id: Value,
    #[serde(alias = "name")]
    title: String,
    kind: Option<String>,
    price: Value,
    price_from: Value,
    stock: Value,
    category: Option<String>,
    categories: Option<Vec<String>>,
    featured: Option<bool>,
    summary: Option<String>,
    description: Option<String>,
    specs: Specs,
    #[serde(alias = "image")]
    thumb: Option<String>,
}

impl From<RawDraft> for ProductDraft {
    fn from(raw: RawDraft) -> Self {
        let kind = match raw.kind.as_deref().map(str::trim) {
            Some(k) if k.eq_ignore_ascii_case("service") => ProductKind::Service,
            _ => ProductKind::Product,
        };

        Self {
            id: id_text(&raw.id).map(ProductId::new),
            title: raw.title.trim().to_string(),
            kind,
            price: decimal_from(&raw.price)
                .or_else(|| decimal_from(&raw.price_from))
                .unwrap_or_default(),
            stock: stock_from(&raw.stock).ceiling().unwrap_or(0),
            categories: normalize_categories(
                raw.category.into_iter().chain(raw.categories.unwrap_or_default()),
            ),
            featured: raw.featured.unwrap_or(false),
            summary: raw.summary.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            specs: raw.specs,
            thumbnail: non_blank(raw.thumb),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ryj_core::SpecEntry;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_validate() {
        assert!(matches!(ProductDraft::new("  ").validate(), Err(AdminError::MissingTitle)));

        let mut draft = ProductDraft::new("Laptop");
        draft.price = Decimal::new(-1, 0);
        assert!(matches!(draft.validate(), Err(AdminError::NegativePrice)));

        draft.price = Decimal::ZERO;
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_invalid_specs_json_keeps_previous() {
        let mut draft = ProductDraft::new("Laptop");
        draft.edit_specs_json(r#"{ "RAM": "16 GB" }"#).unwrap();
        assert!(draft.edit_specs_json("{ RAM: ").is_err());
        assert_eq!(draft.specs.get("RAM"), Some("16 GB"));
        assert!(draft.specs_json().contains("\"RAM\": \"16 GB\""));
    }

    #[test]
    fn test_apply_spec_template() {
        let mut draft = ProductDraft::new("Impresora Epson");
        draft.set_categories(["Impresoras"]);
        draft.specs = Specs::KeyValueList(vec![SpecEntry::new("Color", "Sí")]);

        assert_eq!(draft.apply_spec_template(), Some(ProductType::Printer));
        assert!(!draft.specs.is_empty());
        assert_eq!(draft.specs.get("Color"), Some("Sí"));

        let mut other = ProductDraft::new("Cable");
        other.set_categories(["Cables"]);
        assert_eq!(other.apply_spec_template(), None);
    }

    #[test]
    fn test_payload_uses_first_category() {
        let mut draft = ProductDraft::new(" Laptop ");
        draft.set_categories(["Laptops", "Gamer"]);
        let payload = draft.to_payload().unwrap();
        assert_eq!(payload.title, "Laptop");
        assert_eq!(payload.category, "Laptops");
        assert_eq!(payload.specs, json!({}));
    }

    #[test]
    fn test_from_product_roundtrip() {
        let product = Product::new("lap-1", "Laptop", Decimal::new(1000, 0), 4)
            .with_categories(["Laptops"]);
        let draft = ProductDraft::from_product(&product);
        assert_eq!(draft.id, Some(ProductId::new("lap-1")));
        assert_eq!(draft.stock, 4);
    }

    #[test]
    fn test_from_raw_draft() {
        let raw: RawDraft = serde_json::from_value(json!({
            "title": "Mouse",
            "price": "59.90",
            "stock": 12,
            "category": "Accesorios",
            "specs": ["DPI: 1000", "Inalámbrico"]
        }))
        .unwrap();
        let draft = ProductDraft::from(raw);

        assert!(draft.id.is_none());
        assert_eq!(draft.price, Decimal::new(5990, 2));
        assert_eq!(draft.stock, 12);
        assert_eq!(draft.specs.get("DPI"), Some("1000"));
        assert_eq!(draft.specs.get("Item 2"), Some("Inalámbrico"));
    }
}
