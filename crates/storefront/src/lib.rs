//! RYJ Computer storefront library.
//!
//! Everything a storefront front end needs, minus the UI:
//!
//! - [`catalog`] - product sources, search, timestamped stock directory
//! - [`cart`] - cart store with stock clamping, notifications, persistence
//! - [`checkout`] - checkout form validation and order hand-off
//! - [`auth`] - login session backed by the REST API
//! - [`admin`] - product drafts, bulk import, admin API calls
//! - [`session`] - ties the pieces together for one shopper
//!
//! # Example
//!
//! ```rust,ignore
//! use ryj_storefront::{StorefrontConfig, StorefrontSession};
//!
//! let config = StorefrontConfig::from_env()?;
//! let mut session = StorefrontSession::open(config).await?;
//!
//! let _added = session.cart().events().item_added.subscribe(|e| {
//!     tracing::info!(title = %e.title, "Added to cart");
//! });
//!
//! session.add_to_cart(&"lap-1".into(), 2).await?;
//! println!("{}", session.cart().view().subtotal);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;

pub use config::StorefrontConfig;
pub use error::{Result, StorefrontError};
pub use session::StorefrontSession;
