//! Status and choice enums shared across the storefront.

use serde::{Deserialize, Serialize};

/// Account role returned by the backend on login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    #[serde(alias = "user")]
    Customer,
    /// Can create and edit catalog products.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" | "user" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// How the order reaches the buyer. Exactly one is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Pick up at the store (default).
    #[default]
    StorePickup,
    /// Ship to the buyer's address.
    HomeDelivery,
}

impl DeliveryMethod {
    /// Whether a delivery address must be provided.
    #[must_use]
    pub const fn requires_address(self) -> bool {
        matches!(self, Self::HomeDelivery)
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorePickup => write!(f, "store_pickup"),
            Self::HomeDelivery => write!(f, "home_delivery"),
        }
    }
}

impl std::str::FromStr for DeliveryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store_pickup" | "pickup" => Ok(Self::StorePickup),
            "home_delivery" | "shipping" => Ok(Self::HomeDelivery),
            _ => Err(format!("invalid delivery method: {s}")),
        }
    }
}

/// How the buyer intends to pay. Exactly one is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card (default).
    #[default]
    Card,
    /// Mobile wallet transfer (Yape/Plin).
    MobileWallet,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::MobileWallet => write!(f, "mobile_wallet"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "mobile_wallet" | "yape" | "plin" => Ok(Self::MobileWallet),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [UserRole::Customer, UserRole::Admin] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_deserializes_from_backend() {
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);

        let role: UserRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, UserRole::Customer);
    }

    #[test]
    fn test_delivery_requires_address() {
        assert!(DeliveryMethod::HomeDelivery.requires_address());
        assert!(!DeliveryMethod::StorePickup.requires_address());
        assert_eq!(DeliveryMethod::default(), DeliveryMethod::StorePickup);
    }

    #[test]
    fn test_payment_aliases() {
        assert_eq!("yape".parse::<PaymentMethod>().unwrap(), PaymentMethod::MobileWallet);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Card);
    }
}
