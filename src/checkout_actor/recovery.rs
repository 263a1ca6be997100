//! Persistence of the created order across the payment redirect.

use super::error::CheckoutError;
use crate::model::Order;
use crate::services::{RecoverySlot, ServiceError};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// The single recovery slot entry owned by a checkout session.
///
/// Only the created order is stored. Everything else in checkout state is
/// rebuilt by the shopper if they come back without paying.
#[derive(Clone)]
pub struct PendingOrderSlot {
    slot: Arc<dyn RecoverySlot>,
    key: String,
}

impl PendingOrderSlot {
    pub fn new(slot: Arc<dyn RecoverySlot>, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
        }
    }

    pub async fn stash(&self, order: &Order) -> Result<(), CheckoutError> {
        let json = serde_json::to_string(order)
            .map_err(|e| CheckoutError::RecoveryFailed(ServiceError::Transport(e.to_string())))?;
        self.slot
            .write(&self.key, json)
            .await
            .map_err(CheckoutError::RecoveryFailed)?;
        debug!(order_id = %order.id, key = %self.key, "Pending order stashed");
        Ok(())
    }

    /// Reads and clears the slot. Unreadable entries are dropped.
    pub async fn take(&self) -> Option<Order> {
        let json = match self.slot.read_once_and_clear(&self.key).await {
            Ok(json) => json?,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Could not read pending order");
                return None;
            }
        };
        match serde_json::from_str::<Order>(&json) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable pending order");
                None
            }
        }
    }
}

/// The gateway sends the shopper back here with the order number appended.
pub fn return_url_for(base: &Url, order: &Order) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("order", &order.order_number);
    url
}
