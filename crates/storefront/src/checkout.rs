//! Checkout form submission.
//!
//! The form is checked for required fields (plus a structural email check),
//! then the validated form, the cart lines and the summary are handed to an
//! [`OrderHandler`]. What the handler does with the order (email, backend
//! call, ticket) is outside this crate; no payment is processed here.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use ryj_core::{CurrencyCode, DeliveryMethod, Email, PaymentMethod, Price};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::cart::{CartStore, LineItem};

/// Errors that can occur at checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// One or more fields failed validation.
    #[error("invalid checkout form: {}", format_field_errors(.0))]
    Invalid(Vec<FieldError>),

    /// The order handler refused or failed.
    #[error("order was not accepted: {0}")]
    Handler(String),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single form validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn required(field: &'static str) -> Self {
        Self {
            field,
            message: "is required".to_string(),
        }
    }
}

/// Buyer details collected at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    /// First and last names.
    pub full_name: String,
    /// National identity document (DNI) or similar.
    pub document_id: String,
    pub email: String,
    /// Mobile number.
    pub phone: String,
    pub delivery: DeliveryMethod,
    /// Required for home delivery.
    pub address: Option<String>,
    pub payment: PaymentMethod,
    pub notes: Option<String>,
}

impl CheckoutForm {
    /// Check required fields and the email shape. Reports every failure.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Invalid`] listing each failing field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("full_name", &self.full_name),
            ("document_id", &self.document_id),
            ("phone", &self.phone),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError::required(field));
            }
        }

        if self.email.trim().is_empty() {
            errors.push(FieldError::required("email"));
        } else if let Err(e) = Email::parse(&self.email) {
            errors.push(FieldError {
                field: "email",
                message: e.to_string(),
            });
        }

        let has_address = self
            .address
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());
        if self.delivery.requires_address() && !has_address {
            errors.push(FieldError {
                field: "address",
                message: "is required for home delivery".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CheckoutError::Invalid(errors))
        }
    }
}

/// Cart totals at the time of submission. No taxes or shipping are added,
/// so the total equals the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub subtotal: Price,
    pub total: Price,
    pub count: u32,
}

impl CheckoutSummary {
    /// Summarize `lines`.
    #[must_use]
    pub fn new(lines: &[LineItem], currency: CurrencyCode) -> Self {
        let subtotal: Decimal = crate::cart::subtotal(lines);
        Self {
            subtotal: Price::new(subtotal, currency),
            total: Price::new(subtotal, currency),
            count: crate::cart::count(lines),
        }
    }
}

/// Everything an order handler receives.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Client-generated reference for idempotent handling.
    pub reference: Uuid,
    pub placed_at: DateTime<Utc>,
    pub form: CheckoutForm,
    pub lines: Vec<LineItem>,
    pub summary: CheckoutSummary,
}

/// Handler response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub reference: Uuid,
    /// Message to show the buyer.
    pub message: Option<String>,
}

/// Receives submitted orders.
pub trait OrderHandler: Send + Sync {
    /// Accept or refuse an order.
    fn submit(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<OrderConfirmation, CheckoutError>> + Send;
}

/// Validate `form` and hand the cart to `handler`.
///
/// The cart itself is left untouched.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] for an empty cart,
/// [`CheckoutError::Invalid`] for form problems, or the handler's error.
#[instrument(skip_all, fields(lines = cart.lines().len()))]
pub async fn submit_order<H>(
    cart: &CartStore,
    form: &CheckoutForm,
    handler: &H,
) -> Result<OrderConfirmation, CheckoutError>
where
    H: OrderHandler,
{
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    form.validate()?;

    let order = OrderRequest {
        reference: Uuid::new_v4(),
        placed_at: Utc::now(),
        form: form.clone(),
        lines: cart.lines().to_vec(),
        summary: CheckoutSummary::new(cart.lines(), cart.currency()),
    };

    let confirmation = handler.submit(&order).await?;
    tracing::info!(
        reference = %confirmation.reference,
        total = %order.summary.total,
        delivery = %order.form.delivery,
        payment = %order.form.payment,
        "Order submitted"
    );
    Ok(confirmation)
}
