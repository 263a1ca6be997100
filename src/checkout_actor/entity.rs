//! SessionEntity implementation for the checkout orchestrator.
//!
//! Synchronous transitions live on [`CheckoutState`] in `state.rs`; this file
//! holds the sequences that call collaborators. Every failure is recorded in
//! `error` as the shopper should see it and also returned to the caller.

use super::error::CheckoutError;
use super::recovery::{return_url_for, PendingOrderSlot};
use super::state::{AttemptInputs, CheckoutState, CheckoutStep};
use crate::clients::{CartClient, StoreClient};
use crate::framework::{SessionEntity, StatePublisher};
use crate::model::{
    Cart, Identity, Order, OrderRequest, PaymentRequest, ShippingAddress, ShippingRate, StoreId,
};
use crate::rates::{RateResolution, ShippingRateResolver};
use crate::services::{AddressRepository, OrderService, PaymentGateway};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone)]
pub enum CheckoutCommand {
    LoadAddresses,
    SelectShippingAddress(ShippingAddress),
    /// Saves a new address and selects it for shipping.
    CreateAddress(ShippingAddress),
    SelectBillingAddress(ShippingAddress),
    SetUseSameAddress(bool),
    SelectShippingRate(String),
    ProceedToPayment,
    BackToShipping,
    PlaceOrder,
    /// Cancels the pending order, if any, and forgets the current attempt.
    AbandonCheckout,
    ClearError,
}

#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    Updated,
    HandedOff(PaymentHandoff),
    /// The order that was cancelled, if there was one.
    Abandoned(Option<Order>),
}

/// Everything the view needs to leave for the payment gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentHandoff {
    pub order: Order,
    pub amount: Decimal,
    pub redirect_url: Url,
}

/// Produces the id of a new checkout attempt.
pub type AttemptIdFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Collaborators injected into the checkout actor.
pub struct CheckoutContext {
    pub identity: Identity,
    pub store_id: StoreId,
    pub addresses: Arc<dyn AddressRepository>,
    pub rates: ShippingRateResolver,
    pub orders: Arc<dyn OrderService>,
    pub payments: Arc<dyn PaymentGateway>,
    pub recovery: PendingOrderSlot,
    /// Read-only here: checkout takes the cart snapshot, it never mutates it.
    pub cart: CartClient,
    pub return_url: Url,
    pub next_attempt_id: AttemptIdFn,
}

/// Random attempt ids.
pub fn random_attempt_id() -> AttemptIdFn {
    Arc::new(|| uuid::Uuid::new_v4().simple().to_string())
}

impl CheckoutState {
    fn fail(&mut self, error: CheckoutError) -> CheckoutError {
        self.error = Some(error.user_message());
        error
    }

    /// Lists saved addresses and, if nothing is selected yet, picks the default.
    async fn load_addresses(
        &mut self,
        ctx: &CheckoutContext,
        publisher: &StatePublisher<Self>,
    ) -> Result<(), CheckoutError> {
        let addresses = ctx
            .addresses
            .list(&ctx.identity)
            .await
            .map_err(|e| self.fail(CheckoutError::AddressLoadFailed(e)))?;
        debug!(count = addresses.len(), "Saved addresses loaded");
        let default = addresses.iter().find(|address| address.is_default).cloned();
        self.saved_addresses = addresses;

        match default {
            Some(address) if self.shipping_address.is_none() => {
                self.choose_shipping_address(address, ctx, publisher).await
            }
            _ => Ok(()),
        }
    }

    async fn choose_shipping_address(
        &mut self,
        address: ShippingAddress,
        ctx: &CheckoutContext,
        publisher: &StatePublisher<Self>,
    ) -> Result<(), CheckoutError> {
        self.select_shipping_address(address.clone());
        if !address.is_quotable() {
            return Ok(());
        }

        self.loading = true;
        publisher.publish(self);
        let resolution = ctx.rates.resolve(&address).await;
        self.loading = false;

        match resolution {
            Ok(RateResolution::Skipped) => Ok(()),
            Ok(RateResolution::Quoted { rates, default }) => {
                self.shipping_rates = rates;
                self.selected_shipping_rate = default;
                self.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail(CheckoutError::RateQuoteFailed(e))),
        }
    }

    async fn create_address(
        &mut self,
        mut address: ShippingAddress,
        ctx: &CheckoutContext,
    ) -> Result<ShippingAddress, CheckoutError> {
        address.is_default = self.saved_addresses.is_empty();
        let created = ctx
            .addresses
            .create(&ctx.identity, address)
            .await
            .map_err(|e| self.fail(CheckoutError::AddressCreationFailed(e)))?;
        info!(address_id = ?created.id, "Address saved");
        Ok(created)
    }

    async fn place_order(
        &mut self,
        ctx: &CheckoutContext,
        publisher: &StatePublisher<Self>,
    ) -> Result<PaymentHandoff, CheckoutError> {
        let (address, rate) = self.ready_to_place().map_err(|e| self.fail(e))?;
        let cart = ctx
            .cart
            .snapshot()
            .cart
            .filter(|cart| !cart.is_empty())
            .ok_or_else(|| self.fail(CheckoutError::EmptyCart))?;
        let amount = self.total_with_shipping(&cart).map_err(|e| self.fail(e))?;
        let inputs = AttemptInputs::new(&address, &rate, &cart, amount);

        self.step = CheckoutStep::Processing;
        self.placing_order = true;
        self.loading = true;
        self.error = None;
        publisher.publish(self);

        let result = self.run_place_order(address, rate, cart, inputs, ctx).await;
        self.placing_order = false;
        self.loading = false;

        match result {
            Ok(handoff) => {
                info!(order_id = %handoff.order.id, amount = %handoff.amount, "Handing off to payment");
                self.payment_redirect = Some(handoff.redirect_url.clone());
                Ok(handoff)
            }
            Err(e) => {
                warn!(error = %e, step = %self.step, "Order placement failed");
                self.step = CheckoutStep::Payment;
                Err(self.fail(e))
            }
        }
    }

    /// Retires an attempt placed with different inputs, cancelling its unpaid
    /// order first.
    async fn supersede_attempt(
        &mut self,
        inputs: &AttemptInputs,
        ctx: &CheckoutContext,
    ) -> Result<(), CheckoutError> {
        let Some(previous) = self.superseded_attempt(inputs).cloned() else {
            return Ok(());
        };
        if let Some(order_id) = &previous.order_id {
            let cancelled = ctx
                .orders
                .cancel(order_id)
                .await
                .map_err(CheckoutError::CancellationFailed)?;
            info!(order_id = %cancelled.id, attempt = %previous.id, "Superseded order cancelled");
            if self.created_order.as_ref().is_some_and(|order| &order.id == order_id) {
                self.created_order = None;
            }
            let _ = ctx.recovery.take().await;
        }
        debug!(attempt = %previous.id, "Attempt superseded");
        self.attempt = None;
        Ok(())
    }

    async fn run_place_order(
        &mut self,
        address: ShippingAddress,
        rate: ShippingRate,
        cart: Cart,
        inputs: AttemptInputs,
        ctx: &CheckoutContext,
    ) -> Result<PaymentHandoff, CheckoutError> {
        self.supersede_attempt(&inputs, ctx).await?;
        let amount = inputs.amount;
        let attempt = self.begin_attempt(inputs, || (ctx.next_attempt_id)(), &ctx.identity.user_id);
        info!(attempt = %attempt.id, cart_id = %cart.id, "Placing order");

        // 1. Persist the shipping address if it has never been saved.
        let address = if address.is_persisted() {
            address
        } else {
            let created = self.create_address(address, ctx).await?;
            self.adopt_persisted_address(created.clone());
            created
        };
        let Some(shipping_address_id) = address.id.clone() else {
            return Err(CheckoutError::incomplete("Shipping address was not saved"));
        };

        // 2. Create the order under the attempt's key.
        let order = ctx
            .orders
            .create(OrderRequest {
                cart_id: cart.id.clone(),
                shipping_address_id,
                store_id: ctx.store_id.clone(),
                shipping_rate_code: rate.code.clone(),
                idempotency_key: attempt.idempotency_key,
            })
            .await
            .map_err(CheckoutError::OrderCreationFailed)?;
        debug!(order_id = %order.id, order_number = %order.order_number, "Order created");
        if let Some(current) = self.attempt.as_mut() {
            current.order_id = Some(order.id.clone());
        }
        self.created_order = Some(order.clone());

        // 3. Survive the redirect.
        ctx.recovery.stash(&order).await?;

        // 4. Open the payment session for the total checked up front.
        let session = ctx
            .payments
            .create_session(PaymentRequest {
                amount,
                currency: cart.currency.clone(),
                payer: ctx.identity.clone(),
                return_url: return_url_for(&ctx.return_url, &order),
            })
            .await
            .map_err(CheckoutError::PaymentInitiationFailed)?;

        // 5. Ready to leave.
        Ok(PaymentHandoff {
            order,
            amount,
            redirect_url: session.redirect_url,
        })
    }

    async fn abandon(&mut self, ctx: &CheckoutContext) -> Result<Option<Order>, CheckoutError> {
        if self.placing_order {
            return Err(self.fail(CheckoutError::Busy));
        }
        let cancelled = match self.created_order.clone() {
            Some(order) => {
                let cancelled = ctx
                    .orders
                    .cancel(&order.id)
                    .await
                    .map_err(|e| self.fail(CheckoutError::CancellationFailed(e)))?;
                info!(order_id = %cancelled.id, "Pending order cancelled");
                Some(cancelled)
            }
            None => None,
        };
        // Clear whatever is still stashed for this order.
        let _ = ctx.recovery.take().await;

        self.created_order = None;
        self.attempt = None;
        self.payment_redirect = None;
        self.error = None;
        if self.step == CheckoutStep::Processing {
            self.step = CheckoutStep::Payment;
        }
        Ok(cancelled)
    }
}

#[async_trait]
impl SessionEntity for CheckoutState {
    type Command = CheckoutCommand;
    type Outcome = CheckoutOutcome;
    type Error = CheckoutError;
    type Context = CheckoutContext;

    async fn on_mount(&mut self, ctx: &CheckoutContext, publisher: &StatePublisher<Self>) {
        if let Some(order) = ctx.recovery.take().await {
            info!(order_id = %order.id, order_number = %order.order_number, "Resumed pending order");
            self.created_order = Some(order);
        }
        if let Err(e) = self.load_addresses(ctx, publisher).await {
            warn!(error = %e, "Saved addresses unavailable");
        }
    }

    async fn handle(
        &mut self,
        command: CheckoutCommand,
        ctx: &CheckoutContext,
        publisher: &StatePublisher<Self>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        match command {
            CheckoutCommand::LoadAddresses => {
                self.load_addresses(ctx, publisher).await?;
            }
            CheckoutCommand::SelectShippingAddress(address) => {
                self.choose_shipping_address(address, ctx, publisher).await?;
            }
            CheckoutCommand::CreateAddress(address) => {
                let created = self.create_address(address, ctx).await?;
                self.saved_addresses.push(created.clone());
                self.choose_shipping_address(created, ctx, publisher).await?;
            }
            CheckoutCommand::SelectBillingAddress(address) => {
                self.select_billing_address(address);
            }
            CheckoutCommand::SetUseSameAddress(same) => {
                self.set_use_same_address(same);
            }
            CheckoutCommand::SelectShippingRate(code) => {
                self.select_shipping_rate(&code).map_err(|e| self.fail(e))?;
            }
            CheckoutCommand::ProceedToPayment => {
                self.proceed_to_payment().map_err(|e| self.fail(e))?;
                self.error = None;
            }
            CheckoutCommand::BackToShipping => {
                self.back_to_shipping().map_err(|e| self.fail(e))?;
            }
            CheckoutCommand::PlaceOrder => {
                return self.place_order(ctx, publisher).await.map(CheckoutOutcome::HandedOff);
            }
            CheckoutCommand::AbandonCheckout => {
                return self.abandon(ctx).await.map(CheckoutOutcome::Abandoned);
            }
            CheckoutCommand::ClearError => {
                self.error = None;
            }
        }
        Ok(CheckoutOutcome::Updated)
    }
}
