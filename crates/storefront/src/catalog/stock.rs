//! Timestamped stock snapshots.
//!
//! The stock directory answers "how many units of X can be bought" from the
//! last successful product listing. It is authoritative but possibly stale:
//! every answer can be traced back to the instant its snapshot was taken.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use ryj_core::{Product, ProductId, StockLevel};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{CatalogError, ProductSource};

/// Point-in-time mapping from product id to stock level.
///
/// Persisted alongside the cart so a restored cart is enforced against the
/// snapshot it was last reconciled with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockSnapshot {
    levels: HashMap<ProductId, StockLevel>,
    taken_at: DateTime<Utc>,
}

impl StockSnapshot {
    /// An empty snapshot. Every lookup answers out of stock.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from explicit levels.
    #[must_use]
    pub fn new<I>(levels: I, taken_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (ProductId, StockLevel)>,
    {
        Self {
            levels: levels.into_iter().collect(),
            taken_at,
        }
    }

    /// Build a snapshot from a product listing taken now.
    #[must_use]
    pub fn from_products<'a, I>(products: I) -> Self
    where
        I: IntoIterator<Item = &'a Product>,
    {
        Self::new(
            products.into_iter().map(|p| (p.id.clone(), p.stock)),
            Utc::now(),
        )
    }

    /// Stock level for `id`. Unknown ids are out of stock.
    #[must_use]
    pub fn lookup(&self, id: &ProductId) -> StockLevel {
        self.levels
            .get(id)
            .copied()
            .unwrap_or(StockLevel::OUT_OF_STOCK)
    }

    /// Whether `id` was part of the listing.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.levels.contains_key(id)
    }

    /// When the listing was fetched.
    #[must_use]
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Number of known products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether no product is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Holds the most recent successful [`StockSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct StockDirectory {
    snapshot: Arc<StockSnapshot>,
}

impl StockDirectory {
    /// A directory with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory seeded with `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: StockSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    /// Stock level for `id` in the current snapshot.
    #[must_use]
    pub fn lookup(&self, id: &ProductId) -> StockLevel {
        self.snapshot.lookup(id)
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<StockSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// How old the current snapshot is.
    #[must_use]
    pub fn age(&self) -> TimeDelta {
        Utc::now() - self.snapshot.taken_at()
    }

    /// Rebuild the snapshot from `source`.
    ///
    /// On failure the previous snapshot stays in place.
    ///
    /// # Errors
    ///
    /// Returns the source's error if the listing cannot be fetched.
    #[instrument(skip_all)]
    pub async fn refresh<S>(&mut self, source: &S) -> Result<Arc<StockSnapshot>, CatalogError>
    where
        S: ProductSource,
    {
        match source.list_products().await {
            Ok(products) => {
                let snapshot = StockSnapshot::from_products(&products);
                tracing::info!(
                    products = snapshot.len(),
                    taken_at = %snapshot.taken_at(),
                    "Refreshed stock snapshot"
                );
                self.snapshot = Arc::new(snapshot);
                Ok(self.snapshot())
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kept_taken_at = %self.snapshot.taken_at(),
                    "Stock refresh failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    struct FailingSource;

    impl ProductSource for FailingSource {
        async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
            Err(CatalogError::NotFound(ProductId::new("listing")))
        }

        async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
            Err(CatalogError::NotFound(id.clone()))
        }
    }

    fn catalog() -> crate::catalog::StaticCatalog {
        crate::catalog::StaticCatalog::new(vec![
            Product::new("lap-1", "Laptop", Decimal::new(1000, 0), 5),
            Product::service("srv-1", "Mantenimiento", Decimal::new(79, 0)),
        ])
    }

    #[test]
    fn test_unknown_id_is_out_of_stock() {
        let directory = StockDirectory::new();
        assert_eq!(
            directory.lookup(&ProductId::new("ghost")),
            StockLevel::OUT_OF_STOCK
        );
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let mut directory = StockDirectory::new();
        let snapshot = directory.refresh(&catalog()).await.unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(directory.lookup(&ProductId::new("lap-1")), StockLevel::Finite(5));
        assert_eq!(directory.lookup(&ProductId::new("srv-1")), StockLevel::Unlimited);
        assert!(directory.age() >= TimeDelta::zero());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let mut directory = StockDirectory::new();
        directory.refresh(&catalog()).await.unwrap();
        let before = directory.snapshot();

        assert!(directory.refresh(&FailingSource).await.is_err());
        assert_eq!(directory.snapshot(), before);
        assert_eq!(directory.lookup(&ProductId::new("lap-1")), StockLevel::Finite(5));
    }

    #[test]
    fn test_snapshot_records_time() {
        let taken_at = DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let snapshot = StockSnapshot::new([(ProductId::new("a"), StockLevel::Finite(1))], taken_at);
        assert_eq!(snapshot.taken_at(), taken_at);
        assert!(snapshot.contains(&ProductId::new("a")));
        assert!(!snapshot.contains(&ProductId::new("b")));
    }

    #[test]
    fn test_snapshot_survives_json() {
        let snapshot = StockSnapshot::new(
            [
                (ProductId::new("lap-1"), StockLevel::Finite(3)),
                (ProductId::new("srv-1"), StockLevel::Unlimited),
            ],
            Utc::now(),
        );
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: StockSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.lookup(&ProductId::new("srv-1")), StockLevel::Unlimited);
    }
}
