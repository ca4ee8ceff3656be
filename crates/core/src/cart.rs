//! The client-local cart.
//!
//! The cart lives entirely on the client until order creation; there is no
//! server record of it. Prices here are a snapshot taken when the item was
//! added, and order creation submits these snapshot prices rather than
//! re-deriving them from the live catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, VariantId};

/// One line in the local cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub name: String,
    /// Unit price snapshot taken when the item was added.
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Variant size label, when the product has sizes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Variant color label, when the product has colors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Stock level observed when the item was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl CartItem {
    /// Subtotal for this line: unit price times quantity.
    #[must_use]
    pub fn line_subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The whole cart: an ordered list of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Create a cart from a list of items.
    #[must_use]
    pub const fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line subtotals, before shipping.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_subtotal).sum()
    }
}
