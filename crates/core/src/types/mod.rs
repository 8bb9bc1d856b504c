//! Core types for the RYJ storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod specs;
pub mod status;
pub mod stock;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{Product, ProductKind, normalize_categories};
pub use specs::{ProductType, SpecEntry, Specs, SpecsError};
pub use status::*;
pub use stock::StockLevel;
