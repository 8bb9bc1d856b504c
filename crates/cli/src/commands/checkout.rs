//! Checkout command.
//!
//! Orders are written as JSON files under `<storage dir>/orders/` for the
//! shop to pick up. No payment is taken.

use std::path::PathBuf;

use ryj_storefront::StorefrontSession;
use ryj_storefront::checkout::{
    CheckoutError, CheckoutForm, OrderConfirmation, OrderHandler, OrderRequest,
};

use super::{CliError, Output, add_breadcrumb};

/// Writes each accepted order to `<dir>/<reference>.json`.
#[derive(Debug, Clone)]
pub struct FileOrderHandler {
    dir: PathBuf,
}

impl FileOrderHandler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl OrderHandler for FileOrderHandler {
    async fn submit(&self, order: &OrderRequest) -> Result<OrderConfirmation, CheckoutError> {
        let body = serde_json::to_vec_pretty(order)
            .map_err(|e| CheckoutError::Handler(e.to_string()))?;
        let path = self.dir.join(format!("{}.json", order.reference));

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CheckoutError::Handler(format!("{}: {e}", self.dir.display())))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| CheckoutError::Handler(format!("{}: {e}", path.display())))?;

        tracing::info!(reference = %order.reference, path = %path.display(), "Order written");

        Ok(OrderConfirmation {
            reference: order.reference,
            message: Some(format!(
                "Thank you, {}! We will contact you at {} to confirm your order.",
                order.form.full_name.trim(),
                order.form.phone.trim()
            )),
        })
    }
}

/// Submit the cart. The cart is emptied only when the order is written.
pub async fn submit(
    session: &mut StorefrontSession,
    out: &Output,
    form: &CheckoutForm,
) -> Result<(), CliError> {
    let summary = session.cart().view();
    let handler = FileOrderHandler::new(session.config().storage_dir.join("orders"));

    let confirmation = session.checkout(form, &handler).await?;
    add_breadcrumb(
        "checkout",
        "order submitted",
        &[("reference", &confirmation.reference.to_string())],
    );

    out.render(&confirmation, |out| {
        out.line(format!("Order {} placed.", confirmation.reference));
        out.line(format!("Items: {}  Total: {}", summary.count, summary.subtotal));
        if let Some(message) = &confirmation.message {
            out.line(message);
        }
    });
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use ryj_core::{CurrencyCode, Product};
    use ryj_storefront::cart::LineItem;
    use ryj_storefront::checkout::CheckoutSummary;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_file_handler_writes_order() {
        let dir = tempfile::tempdir().unwrap();
        let handler = FileOrderHandler::new(dir.path().join("orders"));

        let product = Product::new("lap-1", "Laptop", Decimal::new(1000, 0), 3);
        let lines = vec![LineItem::new(&product, 2)];
        let order = OrderRequest {
            reference: Uuid::new_v4(),
            placed_at: Utc::now(),
            form: CheckoutForm {
                full_name: "Ana Torres".to_string(),
                phone: "987654321".to_string(),
                ..CheckoutForm::default()
            },
            summary: CheckoutSummary::new(&lines, CurrencyCode::PEN),
            lines,
        };

        let confirmation = handler.submit(&order).await.unwrap();
        assert_eq!(confirmation.reference, order.reference);
        assert!(confirmation.message.unwrap().contains("Ana Torres"));

        let path = dir
            .path()
            .join("orders")
            .join(format!("{}.json", order.reference));
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["lines"][0]["qty"], 2);
        assert_eq!(written["summary"]["count"], 2);
    }
}
