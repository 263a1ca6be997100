use crate::model::{AddressId, CartId, CurrencyCode, Identity, OrderId, StoreId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

/// Represents an order created at checkout.
///
/// Serializable so that it can be carried through the recovery slot while the
/// browser is away at the payment gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Public identifier, safe to put in a URL.
    pub order_number: String,
    pub store_id: StoreId,
    pub shipping_address_id: AddressId,
    pub shipping_rate_code: String,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

/// Payload for creating an order. At most one order exists per `idempotency_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub cart_id: CartId,
    pub shipping_address_id: AddressId,
    pub store_id: StoreId,
    pub shipping_rate_code: String,
    pub idempotency_key: String,
}

/// Payload for opening a payment session.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub payer: Identity,
    pub return_url: Url,
}

/// Where the gateway wants the browser sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSession {
    pub redirect_url: Url,
}
