//! Product record as served by the inventory API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Category, Price, ProductId, UserId};

/// A sellable inventory item.
///
/// Owned by the server; the client only holds cached copies that the store
/// replaces wholesale on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    pub price: Price,
    #[serde(default)]
    pub quantity: u32,
    /// Absolute URL or server-relative path (`/media/product/x.png`).
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

const fn default_active() -> bool {
    true
}

impl Product {
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Stock value: price times quantity on hand.
    #[must_use]
    pub fn total_value(&self) -> Decimal {
        self.price.amount() * Decimal::from(self.quantity)
    }

    /// Status label shown in listings.
    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        if self.is_active { "Active" } else { "Inactive" }
    }
}
