//! Cart commands.
//!
//! Stock limits are never errors: a clamped or rejected change is reported
//! through the cart's stock-error notifications and the command succeeds.

use ryj_core::ProductId;
use ryj_storefront::StorefrontSession;
use ryj_storefront::cart::{CartChange, ItemAdded, StockError, Subscription};

use super::{CliError, Output, add_breadcrumb};

/// Listeners printing cart notifications while a command runs.
#[must_use = "close the notifications once the command is done"]
pub struct Notifications {
    item_added: Subscription<ItemAdded>,
    stock_error: Subscription<StockError>,
}

impl Notifications {
    /// Detach both listeners.
    pub fn close(self) {
        self.item_added.unsubscribe();
        self.stock_error.unsubscribe();
    }
}

/// Print cart notifications as they are emitted.
pub fn watch(session: &StorefrontSession, out: Output) -> Notifications {
    let events = session.cart().events();

    let item_added = events.item_added.subscribe(move |event: &ItemAdded| {
        out.line(format!("Added to cart: {}", event.title));
    });
    let stock_error = events.stock_error.subscribe(move |event: &StockError| {
        out.line(format!("{}: {}", event.title, event.message));
    });

    Notifications {
        item_added,
        stock_error,
    }
}

/// Print the cart lines and totals.
pub fn show(session: &StorefrontSession, out: &Output) {
    let view = session.cart().view();

    out.render(&view, |out| {
        if view.is_empty() {
            out.line("Cart is empty.");
            return;
        }
        for item in &view.items {
            out.line(format!(
                "{:<24} {:<40} {:>4} x {:>14} = {:>14}",
                item.product_id.as_str(),
                item.title,
                item.quantity,
                item.unit_price,
                item.line_total,
            ));
        }
        out.line(format!("Items: {}  Subtotal: {}", view.count, view.subtotal));
    });
}

/// Fetch `id` and add `quantity` units.
pub async fn add(session: &mut StorefrontSession, id: &str, quantity: u32) -> Result<(), CliError> {
    let id = ProductId::new(id);
    let change = session.add_to_cart(&id, quantity).await?;
    record("add", &id, &change);
    Ok(())
}

pub fn increment(session: &mut StorefrontSession, id: &str) {
    let id = ProductId::new(id);
    let change = session.cart_mut().increment(&id);
    record("increment", &id, &change);
}

pub fn decrement(session: &mut StorefrontSession, id: &str) {
    let id = ProductId::new(id);
    let change = session.cart_mut().decrement(&id);
    record("decrement", &id, &change);
}

/// Set a quantity from user text (`"3"`, `"abc"`, `"-2"`).
pub fn set_quantity(session: &mut StorefrontSession, id: &str, quantity: &str) {
    let id = ProductId::new(id);
    let change = session.cart_mut().set_quantity_text(&id, quantity);
    record("set_quantity", &id, &change);
}

pub fn remove(session: &mut StorefrontSession, id: &str) {
    let id = ProductId::new(id);
    let change = session.cart_mut().remove(&id);
    record("remove", &id, &change);
}

pub fn clear(session: &mut StorefrontSession) {
    let change = session.cart_mut().clear();
    tracing::debug!(?change, "Cart cleared");
    add_breadcrumb("cart", "clear", &[]);
}

/// Refresh stock levels and report lines that had to shrink.
pub async fn refresh(session: &mut StorefrontSession, out: &Output) -> Result<(), CliError> {
    let change = session.refresh_stock().await?;
    if let CartChange::Reconciled(adjustments) = &change {
        for decision in adjustments {
            if decision.granted == 0 {
                out.line(format!("{} is no longer available; removed", decision.product_id));
            } else {
                out.line(format!(
                    "{} reduced from {} to {}",
                    decision.product_id, decision.requested, decision.granted
                ));
            }
        }
    }
    add_breadcrumb("cart", "refresh", &[]);
    Ok(())
}

fn record(action: &str, id: &ProductId, change: &CartChange) {
    if matches!(change, CartChange::Unchanged) {
        tracing::debug!(product_id = %id, action, "Cart unchanged");
    }
    add_breadcrumb("cart", action, &[("product_id", id.as_str())]);
}
