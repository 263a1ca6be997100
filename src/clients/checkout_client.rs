//! # Checkout Client
//!
//! High-level API over the checkout orchestrator.
use crate::checkout_actor::{
    CheckoutCommand, CheckoutError, CheckoutOutcome, CheckoutState, PaymentHandoff,
};
use crate::clients::actor_client::StoreClient;
use crate::framework::SessionClient;
use crate::model::{Order, ShippingAddress};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Client for interacting with the Checkout actor.
///
/// Clones share one in-flight flag, so a second `place_order` issued while
/// the first is still running fails with [`CheckoutError::Busy`] instead of
/// queueing behind it.
#[derive(Clone)]
pub struct CheckoutClient {
    inner: SessionClient<CheckoutState>,
    placing: Arc<AtomicBool>,
}

/// Releases the in-flight flag when the call finishes or is dropped.
struct PlacingGuard(Arc<AtomicBool>);

impl Drop for PlacingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CheckoutClient {
    pub fn new(inner: SessionClient<CheckoutState>) -> Self {
        Self {
            inner,
            placing: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn update(&self, command: CheckoutCommand) -> Result<(), CheckoutError> {
        self.inner.send(command).await.map(|_| ())
    }

    #[instrument(skip(self))]
    pub async fn load_addresses(&self) -> Result<(), CheckoutError> {
        debug!("Sending request");
        self.update(CheckoutCommand::LoadAddresses).await
    }

    /// Selects a destination and re-quotes shipping for it.
    #[instrument(skip(self, address), fields(address_id = ?address.id))]
    pub async fn select_shipping_address(&self, address: ShippingAddress) -> Result<(), CheckoutError> {
        debug!(?address, "Sending request");
        self.update(CheckoutCommand::SelectShippingAddress(address)).await
    }

    #[instrument(skip(self, address))]
    pub async fn create_address(&self, address: ShippingAddress) -> Result<(), CheckoutError> {
        debug!(?address, "Sending request");
        self.update(CheckoutCommand::CreateAddress(address)).await
    }

    #[instrument(skip(self, address), fields(address_id = ?address.id))]
    pub async fn select_billing_address(&self, address: ShippingAddress) -> Result<(), CheckoutError> {
        self.update(CheckoutCommand::SelectBillingAddress(address)).await
    }

    pub async fn set_use_same_address(&self, same: bool) -> Result<(), CheckoutError> {
        self.update(CheckoutCommand::SetUseSameAddress(same)).await
    }

    #[instrument(skip(self))]
    pub async fn select_shipping_rate(&self, code: &str) -> Result<(), CheckoutError> {
        self.update(CheckoutCommand::SelectShippingRate(code.to_string()))
            .await
    }

    pub async fn proceed_to_payment(&self) -> Result<(), CheckoutError> {
        self.update(CheckoutCommand::ProceedToPayment).await
    }

    pub async fn back_to_shipping(&self) -> Result<(), CheckoutError> {
        self.update(CheckoutCommand::BackToShipping).await
    }

    /// Runs the place-order sequence and returns where to send the browser.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<PaymentHandoff, CheckoutError> {
        if self
            .placing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Place order already in flight");
            return Err(CheckoutError::Busy);
        }
        let _guard = PlacingGuard(self.placing.clone());

        info!("Sending place_order to actor");
        match self.inner.send(CheckoutCommand::PlaceOrder).await? {
            CheckoutOutcome::HandedOff(handoff) => Ok(handoff),
            _ => unreachable!("PlaceOrder must return HandedOff"),
        }
    }

    /// Cancels any pending order. Returns the cancelled order.
    #[instrument(skip(self))]
    pub async fn abandon(&self) -> Result<Option<Order>, CheckoutError> {
        debug!("Sending request");
        match self.inner.send(CheckoutCommand::AbandonCheckout).await? {
            CheckoutOutcome::Abandoned(order) => Ok(order),
            _ => unreachable!("AbandonCheckout must return Abandoned"),
        }
    }

    pub async fn clear_error(&self) -> Result<(), CheckoutError> {
        self.update(CheckoutCommand::ClearError).await
    }
}

impl StoreClient<CheckoutState> for CheckoutClient {
    fn inner(&self) -> &SessionClient<CheckoutState> {
        &self.inner
    }
}
