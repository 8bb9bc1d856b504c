//! RYJ Core - Shared domain types.
//!
//! This crate provides the types shared by every RYJ component:
//! - `storefront` - Catalog, cart, checkout and admin logic
//! - `cli` - Command-line front end driving the storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and usable anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, stock levels, products, specs and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
