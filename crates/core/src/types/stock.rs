//! Stock levels and the stock ceiling policy.
//!
//! A stock level is either a finite count of units on hand or
//! [`StockLevel::Unlimited`] for service offerings that have no physical
//! inventory. This is the single ceiling policy used by the cart.

use serde::{Deserialize, Serialize};

/// Units available for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "units")]
pub enum StockLevel {
    /// A finite number of units. `Finite(0)` means out of stock.
    Finite(u32),
    /// No ceiling (services).
    Unlimited,
}

impl StockLevel {
    /// Stock level used for unknown products.
    pub const OUT_OF_STOCK: Self = Self::Finite(0);

    /// The finite ceiling, or `None` when unlimited.
    #[must_use]
    pub const fn ceiling(self) -> Option<u32> {
        match self {
            Self::Finite(units) => Some(units),
            Self::Unlimited => None,
        }
    }

    /// Whether this level has no ceiling.
    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Whether nothing can be purchased.
    #[must_use]
    pub const fn is_out_of_stock(self) -> bool {
        matches!(self, Self::Finite(0))
    }

    /// Reduce `requested` to the ceiling.
    #[must_use]
    pub fn clamp(self, requested: u32) -> u32 {
        match self {
            Self::Finite(units) => requested.min(units),
            Self::Unlimited => requested,
        }
    }

    /// Whether `quantity` units fit under the ceiling.
    #[must_use]
    pub const fn allows(self, quantity: u32) -> bool {
        match self {
            Self::Finite(units) => quantity <= units,
            Self::Unlimited => true,
        }
    }
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finite(units) => write!(f, "{units}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_finite() {
        assert_eq!(StockLevel::Finite(5).clamp(8), 5);
        assert_eq!(StockLevel::Finite(5).clamp(3), 3);
        assert_eq!(StockLevel::OUT_OF_STOCK.clamp(1), 0);
    }

    #[test]
    fn test_clamp_unlimited() {
        assert_eq!(StockLevel::Unlimited.clamp(u32::MAX), u32::MAX);
        assert!(StockLevel::Unlimited.allows(1_000_000));
        assert_eq!(StockLevel::Unlimited.ceiling(), None);
    }

    #[test]
    fn test_out_of_stock() {
        assert!(StockLevel::Finite(0).is_out_of_stock());
        assert!(!StockLevel::Finite(1).is_out_of_stock());
        assert!(!StockLevel::Unlimited.is_out_of_stock());
    }

    #[test]
    fn test_display() {
        assert_eq!(StockLevel::Finite(7).to_string(), "7");
        assert_eq!(StockLevel::Unlimited.to_string(), "unlimited");
    }
}
