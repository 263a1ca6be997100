use crate::model::{CartId, CartItemId, CurrencyCode, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A server-owned cart snapshot.
///
/// The client never patches a `Cart` and never computes `total_amount`; every
/// successful cart call returns a complete replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub items: Vec<CartItem>,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
}

impl Cart {
    /// Sum of item quantities, for badge counts.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One line of a cart. Owned by its [`Cart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub variant: Variant,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub currency: CurrencyCode,
    pub name: String,
}

/// Selected product options such as size or color, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(BTreeMap<String, String>);

impl Variant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, option: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(option.into(), value.into());
        self
    }

    pub fn get(&self, option: &str) -> Option<&str> {
        self.0.get(option).map(String::as_str)
    }
}

/// Mutations accepted by the cart service. Each one yields a full [`Cart`].
#[derive(Debug, Clone, PartialEq)]
pub enum CartMutation {
    AddItem {
        product_id: ProductId,
        quantity: u32,
        variant: Variant,
    },
    UpdateQuantity {
        item_id: CartItemId,
        quantity: u32,
    },
    RemoveItem {
        item_id: CartItemId,
    },
    Clear,
    SwitchCurrency(CurrencyCode),
}

impl CartMutation {
    /// Verb phrase used in user-facing failure messages.
    pub fn action(&self) -> &'static str {
        match self {
            Self::AddItem { .. } => "add item to cart",
            Self::UpdateQuantity { .. } => "update cart item",
            Self::RemoveItem { .. } => "remove item from cart",
            Self::Clear => "clear cart",
            Self::SwitchCurrency(_) => "switch currency",
        }
    }
}
