//! The cart store.
//!
//! Holds the cart lines and the stock snapshot they are enforced against.
//! Every mutation is synchronous and runs to completion:
//!
//! 1. Coerce the input (quantities below 1 become 1)
//! 2. Clamp against the stock ceiling of the current snapshot
//! 3. Apply the change and persist the whole cart
//! 4. Notify listeners
//!
//! No operation fails. Clamps and rejections are reported through
//! [`CartChange`] and the `cart-stock-error` channel; storage failures are
//! logged and absorbed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use ryj_core::{CurrencyCode, Product, ProductId, StockLevel};
use serde::{Deserialize, Serialize};

use super::events::{CartEvents, ItemAdded, StockError};
use super::{CartView, LineItem, totals};
use crate::catalog::StockSnapshot;
use crate::storage::{self, SessionStorage, StorageError, keys};

/// Persisted cart record: the lines and the snapshot they were last
/// reconciled with.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    stock: Option<StockSnapshot>,
}

/// Why a requested quantity was not granted in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampDecision {
    pub product_id: ProductId,
    /// Quantity the caller asked for (after coercion).
    pub requested: u32,
    /// Quantity the line ended up with. `0` means rejected or dropped.
    pub granted: u32,
    pub ceiling: StockLevel,
    /// When the snapshot that supplied the ceiling was taken.
    pub snapshot_taken_at: DateTime<Utc>,
}

/// Outcome of a cart operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// A line was inserted or its quantity grew.
    Added {
        product_id: ProductId,
        quantity: u32,
        clamp: Option<ClampDecision>,
    },
    /// An existing line changed quantity.
    Updated {
        product_id: ProductId,
        from: u32,
        to: u32,
        clamp: Option<ClampDecision>,
    },
    /// A line was removed.
    Removed { product_id: ProductId },
    /// All lines were removed.
    Cleared { lines: usize },
    /// The ceiling left no room; state is unchanged.
    Rejected(ClampDecision),
    /// A new snapshot was applied. Lists every line that was reduced or
    /// dropped.
    Reconciled(Vec<ClampDecision>),
    /// Nothing to do (unknown id, quantity already at the target).
    Unchanged,
}

impl CartChange {
    /// Whether the cart state changed.
    #[must_use]
    pub fn is_change(&self) -> bool {
        match self {
            Self::Added { .. }
            | Self::Updated { .. }
            | Self::Removed { .. }
            | Self::Cleared { .. } => true,
            Self::Reconciled(adjustments) => !adjustments.is_empty(),
            Self::Rejected(_) | Self::Unchanged => false,
        }
    }

    /// The clamp decision behind this change, if any.
    #[must_use]
    pub fn clamp(&self) -> Option<&ClampDecision> {
        match self {
            Self::Added { clamp, .. } | Self::Updated { clamp, .. } => clamp.as_ref(),
            Self::Rejected(decision) => Some(decision),
            _ => None,
        }
    }
}

/// Cart lines plus the stock snapshot they are enforced against.
pub struct CartStore {
    lines: Vec<LineItem>,
    snapshot: Arc<StockSnapshot>,
    storage: Arc<dyn SessionStorage>,
    events: CartEvents,
    currency: CurrencyCode,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .field("snapshot_taken_at", &self.snapshot.taken_at())
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// An empty cart enforced against an empty snapshot.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>, currency: CurrencyCode) -> Self {
        Self {
            lines: Vec::new(),
            snapshot: Arc::new(StockSnapshot::empty()),
            storage,
            events: CartEvents::default(),
            currency,
        }
    }

    /// Restore the persisted cart and the snapshot it was enforced against.
    ///
    /// Missing or malformed records yield an empty cart. Restored lines are
    /// re-clamped against the stored snapshot, so a record without one keeps
    /// no lines.
    #[must_use]
    pub fn restore(storage: Arc<dyn SessionStorage>, currency: CurrencyCode) -> Self {
        let stored = match storage::load_json::<StoredCart>(storage.as_ref(), keys::CART) {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not restore cart, starting empty");
                StoredCart::default()
            }
        };

        let mut cart = Self {
            lines: merge_duplicates(stored.items),
            ..Self::new(storage, currency)
        };
        let snapshot = stored.stock.unwrap_or_default();
        let taken_at = snapshot.taken_at();
        let change = cart.apply_snapshot(Arc::new(snapshot));

        tracing::debug!(
            lines = cart.lines.len(),
            snapshot_taken_at = %taken_at,
            adjusted = change.is_change(),
            "Restored cart"
        );
        cart
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `Σ unit_price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        totals::subtotal(&self.lines)
    }

    /// `Σ quantity`.
    #[must_use]
    pub fn count(&self) -> u32 {
        totals::count(&self.lines)
    }

    /// Read model for display.
    #[must_use]
    pub fn view(&self) -> CartView {
        CartView::new(&self.lines, self.currency)
    }

    /// Display currency.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// The snapshot quantities are enforced against.
    #[must_use]
    pub fn snapshot(&self) -> &StockSnapshot {
        &self.snapshot
    }

    /// Notification channels.
    #[must_use]
    pub const fn events(&self) -> &CartEvents {
        &self.events
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `requested` units of `product` (0 counts as 1).
    ///
    /// Re-adding merges into the existing line. The resulting quantity never
    /// exceeds the ceiling; any reduction emits a stock error. Products with a
    /// ceiling of zero are rejected.
    pub fn add(&mut self, product: &Product, requested: u32) -> CartChange {
        let requested = requested.max(1);
        let ceiling = self.snapshot.lookup(&product.id);

        let Some(index) = self.position(&product.id) else {
            if ceiling.is_out_of_stock() {
                return self.reject(&product.id, &product.title, requested, ceiling);
            }

            let quantity = ceiling.clamp(requested);
            self.lines.push(LineItem::new(product, quantity));
            self.persist();

            let clamp = self.clamped(&product.id, &product.title, requested, quantity, ceiling);
            self.notify_added(product);
            return CartChange::Added {
                product_id: product.id.clone(),
                quantity,
                clamp,
            };
        };

        let Some(line) = self.lines.get_mut(index) else {
            return CartChange::Unchanged;
        };
        let current = line.quantity;
        let wanted = current.saturating_add(requested);
        let next = ceiling.clamp(wanted);

        if next <= current {
            let title = line.title.clone();
            return self.reject(&product.id, &title, wanted, ceiling);
        }

        line.quantity = next;
        let title = line.title.clone();
        self.persist();

        let clamp = self.clamped(&product.id, &title, wanted, next, ceiling);
        self.notify_added(product);
        CartChange::Added {
            product_id: product.id.clone(),
            quantity: next,
            clamp,
        }
    }

    /// Add one unit, capped at the ceiling. At the ceiling this is a no-op
    /// that emits a stock error.
    pub fn increment(&mut self, product_id: &ProductId) -> CartChange {
        let ceiling = self.snapshot.lookup(product_id);
        let Some(line) = self.line_mut(product_id) else {
            return CartChange::Unchanged;
        };

        let from = line.quantity;
        let wanted = from.saturating_add(1);
        if !ceiling.allows(wanted) {
            let title = line.title.clone();
            return self.reject(product_id, &title, wanted, ceiling);
        }

        line.quantity = wanted;
        self.persist();
        CartChange::Updated {
            product_id: product_id.clone(),
            from,
            to: wanted,
            clamp: None,
        }
    }

    /// Remove one unit, never going below 1.
    pub fn decrement(&mut self, product_id: &ProductId) -> CartChange {
        let Some(line) = self.line_mut(product_id) else {
            return CartChange::Unchanged;
        };
        if line.quantity <= 1 {
            return CartChange::Unchanged;
        }

        let from = line.quantity;
        line.quantity = from - 1;
        self.persist();
        CartChange::Updated {
            product_id: product_id.clone(),
            from,
            to: from - 1,
            clamp: None,
        }
    }

    /// Set the quantity. Values below 1 become 1; values above the ceiling
    /// are clamped to it and emit a stock error.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> CartChange {
        let requested = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        let ceiling = self.snapshot.lookup(product_id);
        let Some(line) = self.line_mut(product_id) else {
            return CartChange::Unchanged;
        };

        let from = line.quantity;
        let granted = ceiling.clamp(requested);
        let title = line.title.clone();

        if granted == 0 {
            return self.reject(product_id, &title, requested, ceiling);
        }
        if granted == from {
            return if granted < requested {
                self.reject(product_id, &title, requested, ceiling)
            } else {
                CartChange::Unchanged
            };
        }

        line.quantity = granted;
        self.persist();

        let clamp = self.clamped(product_id, &title, requested, granted, ceiling);
        CartChange::Updated {
            product_id: product_id.clone(),
            from,
            to: granted,
            clamp,
        }
    }

    /// Set the quantity from free text (e.g., a quantity input box).
    ///
    /// Leading digits are used the way a browser `parseInt` would; text with
    /// no leading number counts as 1.
    pub fn set_quantity_text(&mut self, product_id: &ProductId, text: &str) -> CartChange {
        self.set_quantity(product_id, parse_quantity(text))
    }

    /// Delete the line. Removing an absent id does nothing.
    pub fn remove(&mut self, product_id: &ProductId) -> CartChange {
        let Some(index) = self.position(product_id) else {
            return CartChange::Unchanged;
        };

        self.lines.remove(index);
        self.persist();
        CartChange::Removed {
            product_id: product_id.clone(),
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) -> CartChange {
        if self.lines.is_empty() {
            return CartChange::Unchanged;
        }

        let lines = self.lines.len();
        self.lines.clear();
        self.persist();
        CartChange::Cleared { lines }
    }

    /// Swap in a new snapshot and re-clamp every line.
    ///
    /// Lines above their new ceiling are reduced to it; lines whose ceiling
    /// became zero are dropped. Each adjustment emits a stock error.
    pub fn apply_snapshot(&mut self, snapshot: Arc<StockSnapshot>) -> CartChange {
        self.snapshot = snapshot;

        let mut adjustments = Vec::new();
        let mut notices = Vec::new();
        let taken_at = self.snapshot.taken_at();

        self.lines.retain_mut(|line| {
            let ceiling = self.snapshot.lookup(&line.product_id);
            if ceiling.allows(line.quantity) {
                return true;
            }

            let granted = ceiling.clamp(line.quantity);
            adjustments.push(ClampDecision {
                product_id: line.product_id.clone(),
                requested: line.quantity,
                granted,
                ceiling,
                snapshot_taken_at: taken_at,
            });
            notices.push(line.title.clone());

            line.quantity = granted;
            granted > 0
        });

        if !adjustments.is_empty() || !self.lines.is_empty() {
            self.persist();
        }
        for (decision, title) in adjustments.iter().zip(notices) {
            self.notify_stock_error(decision, title);
        }

        CartChange::Reconciled(adjustments)
    }

    /// Drop every line and the persisted record. Used when a session ends.
    pub(crate) fn discard(&mut self) {
        self.lines.clear();
        if let Err(e) = self.storage.remove(keys::CART) {
            log_storage_failure(&e);
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|l| &l.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut LineItem> {
        self.lines.iter_mut().find(|l| &l.product_id == product_id)
    }

    /// Record and announce a request the ceiling left no room for.
    fn reject(
        &self,
        product_id: &ProductId,
        title: &str,
        requested: u32,
        ceiling: StockLevel,
    ) -> CartChange {
        let decision = self.decision(product_id, requested, 0, ceiling);
        log_decision(&decision, "Rejected cart quantity at stock ceiling");
        self.notify_stock_error(&decision, title.to_string());
        CartChange::Rejected(decision)
    }

    /// If `granted < requested`, record and announce the clamp.
    fn clamped(
        &self,
        product_id: &ProductId,
        title: &str,
        requested: u32,
        granted: u32,
        ceiling: StockLevel,
    ) -> Option<ClampDecision> {
        if granted >= requested {
            return None;
        }
        let decision = self.decision(product_id, requested, granted, ceiling);
        log_decision(&decision, "Clamped cart quantity to stock ceiling");
        self.notify_stock_error(&decision, title.to_string());
        Some(decision)
    }

    fn decision(
        &self,
        product_id: &ProductId,
        requested: u32,
        granted: u32,
        ceiling: StockLevel,
    ) -> ClampDecision {
        ClampDecision {
            product_id: product_id.clone(),
            requested,
            granted,
            ceiling,
            snapshot_taken_at: self.snapshot.taken_at(),
        }
    }

    fn notify_added(&self, product: &Product) {
        self.events.item_added.emit(&ItemAdded {
            title: product.title.clone(),
            thumbnail: product.thumbnail.clone(),
        });
    }

    fn notify_stock_error(&self, decision: &ClampDecision, title: String) {
        let ceiling = decision.ceiling.ceiling().unwrap_or(u32::MAX);
        let message = if ceiling == 0 {
            "Out of stock".to_string()
        } else {
            format!("Maximum stock: {ceiling}")
        };

        self.events.stock_error.emit(&StockError {
            title,
            message,
            ceiling,
            snapshot_taken_at: decision.snapshot_taken_at,
        });
    }

    /// Write the whole cart. Failures are logged, never surfaced.
    fn persist(&self) {
        let record = StoredCart {
            items: self.lines.clone(),
            stock: Some(self.snapshot.as_ref().clone()),
        };
        if let Err(e) = storage::save_json(self.storage.as_ref(), keys::CART, &record) {
            log_storage_failure(&e);
        }
    }
}

fn log_storage_failure(error: &StorageError) {
    tracing::warn!(error = %error, "Failed to persist cart");
}

fn log_decision(decision: &ClampDecision, message: &str) {
    tracing::info!(
        product_id = %decision.product_id,
        requested = decision.requested,
        granted = decision.granted,
        ceiling = %decision.ceiling,
        snapshot_taken_at = %decision.snapshot_taken_at,
        "{message}"
    );
}

/// Keep the first line per product, folding later duplicates into it.
fn merge_duplicates(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
    for mut item in items {
        item.quantity = item.quantity.max(1);
        match merged.iter_mut().find(|l| l.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => merged.push(item),
        }
    }
    merged
}

/// Leading optional sign plus digits; anything else is 1.
fn parse_quantity(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits.get(..end).map(str::parse::<i64>) {
        Some(Ok(n)) if negative => -n,
        Some(Ok(n)) => n,
        // Empty or overflowing digit runs.
        Some(Err(_)) | None => {
            if end > 0 && !negative {
                i64::MAX
            } else {
                1
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;

    use proptest::prelude::*;

    use super::*;
    use crate::storage::MemoryStorage;

    fn product(id: &str, price: i64, stock: u32) -> Product {
        Product::new(id, id.to_uppercase(), Decimal::new(price, 0), stock)
    }

    fn snapshot(levels: &[(&str, StockLevel)]) -> Arc<StockSnapshot> {
        Arc::new(StockSnapshot::new(
            levels.iter().map(|(id, level)| (ProductId::new(*id), *level)),
            Utc::now(),
        ))
    }

    struct Harness {
        cart: CartStore,
        storage: Arc<MemoryStorage>,
        added: Arc<Mutex<Vec<ItemAdded>>>,
        errors: Arc<Mutex<Vec<StockError>>>,
    }

    fn harness(levels: &[(&str, StockLevel)]) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let mut cart = CartStore::new(storage.clone(), CurrencyCode::PEN);
        cart.apply_snapshot(snapshot(levels));

        let added = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::clone(&added);
        let _ = cart.events().item_added.subscribe(move |e| a.lock().unwrap().push(e.clone()));
        let e = Arc::clone(&errors);
        let _ = cart.events().stock_error.subscribe(move |ev| e.lock().unwrap().push(ev.clone()));

        Harness {
            cart,
            storage,
            added,
            errors,
        }
    }

    impl Harness {
        fn errors(&self) -> usize {
            self.errors.lock().unwrap().len()
        }

        fn added(&self) -> usize {
            self.added.lock().unwrap().len()
        }

        fn qty(&self, id: &str) -> Option<u32> {
            self.cart.get(&ProductId::new(id)).map(|l| l.quantity)
        }
    }

    #[test]
    fn test_add_clamps_to_stock() {
        let mut h = harness(&[("p", StockLevel::Finite(5))]);
        let change = h.cart.add(&product("p", 10, 5), 8);

        assert_eq!(h.qty("p"), Some(5));
        assert_eq!(h.errors(), 1);
        assert_eq!(h.added(), 1);
        let clamp = change.clamp().unwrap();
        assert_eq!((clamp.requested, clamp.granted), (8, 5));
        assert_eq!(clamp.ceiling, StockLevel::Finite(5));
    }

    #[test]
    fn test_add_twice_merges_and_clamps() {
        let mut h = harness(&[("p", StockLevel::Finite(5))]);
        let p = product("p", 10, 5);

        h.cart.add(&p, 3);
        assert_eq!(h.errors(), 0);

        let change = h.cart.add(&p, 3);
        assert_eq!(h.qty("p"), Some(5));
        assert_eq!(h.errors(), 1);
        assert_eq!(h.added(), 2);
        assert_eq!(h.cart.lines().len(), 1);
        assert!(matches!(change, CartChange::Added { quantity: 5, clamp: Some(_), .. }));
    }

    #[test]
    fn test_add_at_ceiling_is_rejected() {
        let mut h = harness(&[("p", StockLevel::Finite(2))]);
        let p = product("p", 10, 2);
        h.cart.add(&p, 2);

        let change = h.cart.add(&p, 1);
        assert!(matches!(change, CartChange::Rejected(_)));
        assert_eq!(h.qty("p"), Some(2));
        assert_eq!(h.errors(), 1);
        assert_eq!(h.added(), 1);
        assert_eq!(h.errors.lock().unwrap()[0].message, "Maximum stock: 2");
    }

    #[test]
    fn test_add_zero_counts_as_one() {
        let mut h = harness(&[("p", StockLevel::Finite(5))]);
        h.cart.add(&product("p", 10, 5), 0);
        assert_eq!(h.qty("p"), Some(1));
    }

    #[test]
    fn test_add_out_of_stock_or_unknown_is_rejected() {
        let mut h = harness(&[("p", StockLevel::Finite(0))]);

        assert!(matches!(h.cart.add(&product("p", 10, 0), 1), CartChange::Rejected(_)));
        assert!(matches!(h.cart.add(&product("ghost", 10, 3), 1), CartChange::Rejected(_)));
        assert!(h.cart.is_empty());
        assert_eq!(h.errors(), 2);
        assert_eq!(h.added(), 0);
        assert_eq!(h.errors.lock().unwrap()[0].message, "Out of stock");
    }

    #[test]
    fn test_unlimited_never_clamps() {
        let mut h = harness(&[("srv", StockLevel::Unlimited)]);
        let service = Product::service("srv", "Mantenimiento", Decimal::new(79, 0));
        h.cart.add(&service, 500);
        h.cart.increment(&ProductId::new("srv"));
        assert_eq!(h.qty("srv"), Some(501));
        assert_eq!(h.errors(), 0);
    }

    #[test]
    fn test_increment_at_ceiling() {
        let mut h = harness(&[("p", StockLevel::Finite(2))]);
        let id = ProductId::new("p");
        h.cart.add(&product("p", 10, 2), 1);

        assert!(matches!(h.cart.increment(&id), CartChange::Updated { from: 1, to: 2, .. }));
        assert_eq!(h.errors(), 0);
        assert!(matches!(h.cart.increment(&id), CartChange::Rejected(_)));
        assert_eq!(h.qty("p"), Some(2));
        assert_eq!(h.errors(), 1);
    }

    #[test]
    fn test_decrement_floors_at_one() {
        let mut h = harness(&[("p", StockLevel::Finite(5))]);
        let id = ProductId::new("p");
        h.cart.add(&product("p", 10, 5), 2);

        h.cart.decrement(&id);
        assert_eq!(h.qty("p"), Some(1));
        assert_eq!(h.cart.decrement(&id), CartChange::Unchanged);
        assert_eq!(h.qty("p"), Some(1));
    }

    #[test]
    fn test_set_quantity_coerces() {
        let mut h = harness(&[("p", StockLevel::Finite(5))]);
        let id = ProductId::new("p");
        h.cart.add(&product("p", 10, 5), 3);

        h.cart.set_quantity(&id, -3);
        assert_eq!(h.qty("p"), Some(1));

        h.cart.set_quantity_text(&id, "4");
        assert_eq!(h.qty("p"), Some(4));
        h.cart.set_quantity_text(&id, "abc");
        assert_eq!(h.qty("p"), Some(1));
        assert_eq!(h.errors(), 0);

        let change = h.cart.set_quantity(&id, 9);
        assert_eq!(h.qty("p"), Some(5));
        assert_eq!(h.errors(), 1);
        assert!(matches!(change, CartChange::Updated { to: 5, clamp: Some(_), .. }));

        // Already at the ceiling: still reported.
        assert!(matches!(h.cart.set_quantity(&id, 9), CartChange::Rejected(_)));
        assert_eq!(h.errors(), 2);
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut h = harness(&[("p", StockLevel::Finite(5))]);
        let ghost = ProductId::new("ghost");
        assert_eq!(h.cart.increment(&ghost), CartChange::Unchanged);
        assert_eq!(h.cart.decrement(&ghost), CartChange::Unchanged);
        assert_eq!(h.cart.set_quantity(&ghost, 3), CartChange::Unchanged);
        assert_eq!(h.cart.remove(&ghost), CartChange::Unchanged);
        assert_eq!(h.errors(), 0);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut h = harness(&[("p", StockLevel::Finite(5)), ("q", StockLevel::Finite(5))]);
        h.cart.add(&product("p", 10, 5), 1);
        h.cart.add(&product("q", 10, 5), 1);
        let id = ProductId::new("p");

        assert!(matches!(h.cart.remove(&id), CartChange::Removed { .. }));
        let once = h.cart.lines().to_vec();
        assert_eq!(h.cart.remove(&id), CartChange::Unchanged);
        assert_eq!(h.cart.lines(), once.as_slice());
    }

    #[test]
    fn test_clear() {
        let mut h = harness(&[("p", StockLevel::Finite(5))]);
        h.cart.add(&product("p", 10, 5), 1);
        assert_eq!(h.cart.clear(), CartChange::Cleared { lines: 1 });
        assert_eq!(h.cart.clear(), CartChange::Unchanged);
        assert!(h.cart.is_empty());
    }

    #[test]
    fn test_apply_snapshot_reclamps_and_drops() {
        let mut h = harness(&[
            ("a", StockLevel::Finite(5)),
            ("b", StockLevel::Finite(5)),
            ("c", StockLevel::Finite(5)),
        ]);
        h.cart.add(&product("a", 10, 5), 4);
        h.cart.add(&product("b", 10, 5), 4);
        h.cart.add(&product("c", 10, 5), 1);

        let newer = snapshot(&[("a", StockLevel::Finite(2)), ("c", StockLevel::Finite(9))]);
        let CartChange::Reconciled(adjustments) = h.cart.apply_snapshot(newer) else {
            panic!("expected reconciliation");
        };

        assert_eq!(adjustments.len(), 2);
        assert_eq!(h.qty("a"), Some(2));
        assert_eq!(h.qty("b"), None);
        assert_eq!(h.qty("c"), Some(1));
        assert_eq!(h.errors(), 2);
        assert_eq!(adjustments[1].granted, 0);
    }

    #[test]
    fn test_unbounded_service_quantity_keeps_totals_finite() {
        let mut h = harness(&[("srv", StockLevel::Unlimited)]);
        let id = ProductId::new("srv");
        h.cart.add(&Product::service("srv", "Soporte", Decimal::MAX), 1);

        h.cart.set_quantity_text(&id, "99999999999");
        assert_eq!(h.qty("srv"), Some(u32::MAX));
        assert_eq!(h.cart.subtotal(), Decimal::MAX);
        assert_eq!(h.cart.view().count, u32::MAX);
    }

    #[test]
    fn test_totals() {
        let mut h = harness(&[("a", StockLevel::Finite(9)), ("b", StockLevel::Finite(9))]);
        h.cart.add(&product("a", 10, 9), 2);
        h.cart.add(&product("b", 5, 9), 3);
        assert_eq!(h.cart.subtotal(), Decimal::new(35, 0));
        assert_eq!(h.cart.count(), 5);
        assert_eq!(h.cart.view().subtotal.display(), "S/ 35.00");
    }

    #[test]
    fn test_unit_price_is_snapshot_at_add_time() {
        let mut h = harness(&[("a", StockLevel::Finite(9))]);
        h.cart.add(&product("a", 10, 9), 1);
        h.cart.add(&product("a", 99, 9), 1);
        assert_eq!(h.cart.get(&ProductId::new("a")).unwrap().unit_price, Decimal::new(10, 0));
    }

    #[test]
    fn test_persist_and_restore() {
        let mut h = harness(&[("a", StockLevel::Finite(9)), ("b", StockLevel::Finite(9))]);
        h.cart.add(&product("a", 10, 9), 2);
        h.cart.add(&product("b", 5, 9), 3);

        let restored = CartStore::restore(h.storage.clone(), CurrencyCode::PEN);
        assert_eq!(restored.lines(), h.cart.lines());
    }

    #[test]
    fn test_restore_malformed_is_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write(keys::CART, "{\"items\": 42").unwrap();
        assert!(CartStore::restore(storage.clone(), CurrencyCode::PEN).is_empty());

        storage.write(keys::CART, "[]").unwrap();
        assert!(CartStore::restore(storage, CurrencyCode::PEN).is_empty());
    }

    fn stored_cart(items: &str, stock: Option<&[(&str, StockLevel)]>) -> String {
        let stock = stock.map(|levels| serde_json::to_value(snapshot(levels).as_ref()).unwrap());
        let items: serde_json::Value = serde_json::from_str(items).unwrap();
        serde_json::json!({ "items": items, "stock": stock }).to_string()
    }

    #[test]
    fn test_restore_merges_duplicate_lines() {
        let storage = Arc::new(MemoryStorage::new());
        let record = stored_cart(
            r#"[
                {"id":"a","title":"A","price":"10","thumb":null,"qty":1},
                {"id":"a","title":"A","price":"10","thumb":null,"qty":2},
                {"id":"b","title":"B","price":"5","thumb":null,"qty":0}
            ]"#,
            Some(&[("a", StockLevel::Finite(9)), ("b", StockLevel::Finite(9))]),
        );
        storage.write(keys::CART, &record).unwrap();

        let cart = CartStore::restore(storage, CurrencyCode::PEN);
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.lines()[1].quantity, 1);
    }

    #[test]
    fn test_restore_clamps_to_stored_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let record = stored_cart(
            r#"[
                {"id":"a","title":"A","price":"10","thumb":null,"qty":50},
                {"id":"b","title":"B","price":"5","thumb":null,"qty":2}
            ]"#,
            Some(&[("a", StockLevel::Finite(3))]),
        );
        storage.write(keys::CART, &record).unwrap();

        let cart = CartStore::restore(storage.clone(), CurrencyCode::PEN);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.get(&ProductId::new("a")).unwrap().quantity, 3);
        assert_eq!(cart.snapshot().lookup(&ProductId::new("a")), StockLevel::Finite(3));

        // The clamped cart was written back.
        let again = CartStore::restore(storage, CurrencyCode::PEN);
        assert_eq!(again.lines(), cart.lines());
    }

    #[test]
    fn test_restore_without_snapshot_keeps_no_lines() {
        let storage = Arc::new(MemoryStorage::new());
        let record = stored_cart(
            r#"[{"id":"a","title":"A","price":"10","thumb":null,"qty":50}]"#,
            None,
        );
        storage.write(keys::CART, &record).unwrap();

        let cart = CartStore::restore(storage, CurrencyCode::PEN);
        assert!(cart.is_empty());
        assert!(cart.snapshot().is_empty());
    }

    #[test]
    fn test_storage_failure_is_absorbed() {
        struct BrokenStorage;

        impl SessionStorage for BrokenStorage {
            fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
                Err(StorageError::InvalidKey("broken".to_string()))
            }

            fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
                Err(StorageError::InvalidKey("broken".to_string()))
            }

            fn remove(&self, _key: &str) -> Result<(), StorageError> {
                Err(StorageError::InvalidKey("broken".to_string()))
            }
        }

        let mut cart = CartStore::restore(Arc::new(BrokenStorage), CurrencyCode::PEN);
        cart.apply_snapshot(snapshot(&[("a", StockLevel::Finite(3))]));
        cart.add(&product("a", 10, 3), 2);
        assert_eq!(cart.count(), 2);
        cart.discard();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_no_write_without_change() {
        let storage = Arc::new(MemoryStorage::new());
        let mut cart = CartStore::new(storage.clone(), CurrencyCode::PEN);
        cart.apply_snapshot(snapshot(&[("a", StockLevel::Finite(3))]));
        cart.decrement(&ProductId::new("a"));
        cart.clear();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("12"), 12);
        assert_eq!(parse_quantity(" 7 "), 7);
        assert_eq!(parse_quantity("12abc"), 12);
        assert_eq!(parse_quantity("-3"), -3);
        assert_eq!(parse_quantity("abc"), 1);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("99999999999999999999999"), i64::MAX);
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize, u32),
        Increment(usize),
        Decrement(usize),
        Set(usize, i64),
        SetText(usize, String),
        Remove(usize),
        Clear,
        Restock(Vec<Option<u32>>),
    }

    const IDS: [&str; 4] = ["a", "b", "c", "srv"];

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..IDS.len(), 0u32..12).prop_map(|(i, n)| Op::Add(i, n)),
            (0..IDS.len()).prop_map(Op::Increment),
            (0..IDS.len()).prop_map(Op::Decrement),
            (0..IDS.len(), -5i64..20).prop_map(|(i, n)| Op::Set(i, n)),
            (0..IDS.len(), "[a-z0-9-]{0,4}").prop_map(|(i, s)| Op::SetText(i, s)),
            (0..IDS.len()).prop_map(Op::Remove),
            Just(Op::Clear),
            proptest::collection::vec(proptest::option::of(0u32..8), IDS.len())
                .prop_map(Op::Restock),
        ]
    }

    fn levels(stocks: &[Option<u32>]) -> Arc<StockSnapshot> {
        Arc::new(StockSnapshot::new(
            IDS.iter().zip(stocks).map(|(id, stock)| {
                let level = if *id == "srv" {
                    StockLevel::Unlimited
                } else {
                    stock.map_or(StockLevel::OUT_OF_STOCK, StockLevel::Finite)
                };
                (ProductId::new(*id), level)
            }),
            Utc::now(),
        ))
    }

    fn assert_within_ceiling(cart: &CartStore) -> Result<(), TestCaseError> {
        for line in cart.lines() {
            prop_assert!(line.quantity >= 1);
            prop_assert!(cart.snapshot().lookup(&line.product_id).allows(line.quantity));
        }
        let mut ids: Vec<&str> = cart.lines().iter().map(|l| l.product_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), cart.lines().len());
        Ok(())
    }

    fn stored_line(id: &str, qty: u32) -> serde_json::Value {
        serde_json::json!({ "id": id, "title": id, "price": "10", "thumb": null, "qty": qty })
    }

    proptest! {
        #[test]
        fn prop_quantities_stay_within_ceiling(
            restored in proptest::collection::vec((0..IDS.len(), 0u32..60), 0..6),
            stored_stock in proptest::option::of(
                proptest::collection::vec(proptest::option::of(0u32..8), IDS.len())
            ),
            ops in proptest::collection::vec(op(), 1..40)
        ) {
            let storage = Arc::new(MemoryStorage::new());
            let items: Vec<_> = restored.iter().map(|(i, n)| stored_line(IDS[*i], *n)).collect();
            let stock = stored_stock.map(|s| serde_json::to_value(levels(&s).as_ref()).unwrap());
            let record = serde_json::json!({ "items": items, "stock": stock });
            storage.write(keys::CART, &record.to_string()).unwrap();

            let mut cart = CartStore::restore(storage.clone(), CurrencyCode::PEN);
            assert_within_ceiling(&cart)?;

            for op in ops {
                match op {
                    Op::Add(i, n) => { cart.add(&product(IDS[i], 10, 0), n); }
                    Op::Increment(i) => { cart.increment(&ProductId::new(IDS[i])); }
                    Op::Decrement(i) => { cart.decrement(&ProductId::new(IDS[i])); }
                    Op::Set(i, n) => { cart.set_quantity(&ProductId::new(IDS[i]), n); }
                    Op::SetText(i, s) => { cart.set_quantity_text(&ProductId::new(IDS[i]), &s); }
                    Op::Remove(i) => { cart.remove(&ProductId::new(IDS[i])); }
                    Op::Clear => { cart.clear(); }
                    Op::Restock(stocks) => { cart.apply_snapshot(levels(&stocks)); }
                }

                assert_within_ceiling(&cart)?;
            }

            let restored = CartStore::restore(storage, CurrencyCode::PEN);
            prop_assert_eq!(restored.lines(), cart.lines());
        }
    }
}
