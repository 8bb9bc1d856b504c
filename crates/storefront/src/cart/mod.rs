//! Shopping cart.
//!
//! - [`CartStore`] - lines, stock enforcement, persistence
//! - [`CartEvents`] - `cart-item-added` / `cart-stock-error` notifications
//! - [`CartView`] - read model with formatted prices

mod events;
mod line_item;
mod store;
mod totals;

pub use events::{CartEvents, EventChannel, ItemAdded, StockError, Subscription};
pub use line_item::LineItem;
pub use store::{CartChange, CartStore, ClampDecision};
pub use totals::{CartItemView, CartView, count, subtotal};
