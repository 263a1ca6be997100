//! Contracts for the remote collaborators the stores depend on.
//!
//! Transport is out of scope here: each trait describes only what the
//! collaborator promises. [`memory`] has in-process implementations of every
//! contract and [`mock`] has scripted stand-ins for tests.

pub mod memory;
pub mod mock;

use crate::model::{
    Cart, CartMutation, Identity, Order, OrderId, OrderRequest, PaymentRequest, PaymentSession,
    RateQuoteRequest, SessionId, ShippingAddress, ShippingRate, StoreId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    /// The collaborator refused the request and said why.
    #[error("{0}")]
    Rejected(String),

    /// The referenced resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request never got a usable answer.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    /// The collaborator's own message, when it sent one worth showing a shopper.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Rejected(msg) => Some(msg),
            Self::NotFound(_) | Self::Transport(_) => None,
        }
    }
}

/// Every cart call is scoped to one store and one browsing session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartScope {
    pub store_id: StoreId,
    pub session_id: SessionId,
}

/// Server-owned cart. Every call answers with a full snapshot.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Returns the session's cart, creating an empty one if none exists yet.
    async fn fetch(&self, scope: &CartScope) -> Result<Cart, ServiceError>;

    async fn mutate(&self, scope: &CartScope, mutation: CartMutation) -> Result<Cart, ServiceError>;
}

#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn list(&self, identity: &Identity) -> Result<Vec<ShippingAddress>, ServiceError>;

    /// Persists the address and returns it with its assigned id.
    async fn create(
        &self,
        identity: &Identity,
        address: ShippingAddress,
    ) -> Result<ShippingAddress, ServiceError>;
}

#[async_trait]
pub trait RateService: Send + Sync {
    /// Ranked options. Ordering is the service's responsibility.
    async fn quote(&self, request: RateQuoteRequest) -> Result<Vec<ShippingRate>, ServiceError>;
}

#[async_trait]
pub trait OrderService: Send + Sync {
    /// Must return the existing order when the idempotency key was seen before.
    async fn create(&self, request: OrderRequest) -> Result<Order, ServiceError>;

    /// Cancels an order that has not been paid.
    async fn cancel(&self, order_id: &OrderId) -> Result<Order, ServiceError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: PaymentRequest) -> Result<PaymentSession, ServiceError>;
}

/// Same-tab storage that survives a full navigation away and back.
///
/// A browser build backs this with session storage; a server-rendered build can
/// back it with a server session or a signed query parameter.
#[async_trait]
pub trait RecoverySlot: Send + Sync {
    async fn write(&self, key: &str, value: String) -> Result<(), ServiceError>;

    /// Returns the stored value, if any, and removes it in the same step.
    async fn read_once_and_clear(&self, key: &str) -> Result<Option<String>, ServiceError>;
}

/// The full set of collaborators a checkout session is wired with.
#[derive(Clone)]
pub struct Services {
    pub cart: Arc<dyn CartService>,
    pub addresses: Arc<dyn AddressRepository>,
    pub rates: Arc<dyn RateService>,
    pub orders: Arc<dyn OrderService>,
    pub payments: Arc<dyn PaymentGateway>,
    pub recovery: Arc<dyn RecoverySlot>,
}
