use crate::cart_actor::CartContext;
use crate::checkout_actor::{random_attempt_id, AttemptIdFn, CheckoutContext, PendingOrderSlot};
use crate::clients::{CartClient, CheckoutClient};
use crate::config::CheckoutConfig;
use crate::model::Identity;
use crate::rates::ShippingRateResolver;
use crate::services::{CartScope, Services};
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("Actor task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

/// Both stores of one mounted checkout page.
///
/// `CheckoutSession` is responsible for:
/// - **Lifecycle Management**: Starting the cart and checkout actors and stopping them
/// - **Dependency Wiring**: The checkout actor reads the cart through a clone of `cart`
///
/// Each actor runs its mount hook before its first command: the cart loads the
/// server cart, the checkout store reads the recovery slot once and lists saved
/// addresses. Commands sent right after `mount` queue behind those hooks.
///
/// Dropping the session aborts both actors. Any collaborator call still in
/// flight is dropped with them and its result never reaches the state.
///
/// # Example
///
/// ```ignore
/// let session = CheckoutSession::mount(services, identity, scope, &config);
///
/// session.cart.add_item(product_id, 1, Variant::new()).await?;
/// session.checkout.select_shipping_address(address).await?;
/// session.checkout.proceed_to_payment().await?;
/// let handoff = session.checkout.place_order().await?;
///
/// session.shutdown().await?;
/// ```
pub struct CheckoutSession {
    pub cart: CartClient,
    pub checkout: CheckoutClient,
    /// Checkout first: it holds a cart client, so the cart actor outlives it.
    handles: Vec<JoinHandle<()>>,
}

impl CheckoutSession {
    /// Mounts a session with random checkout attempt ids.
    pub fn mount(
        services: Services,
        identity: Identity,
        scope: CartScope,
        config: &CheckoutConfig,
    ) -> Self {
        Self::mount_with_attempt_ids(services, identity, scope, config, random_attempt_id())
    }

    /// Mounts a session whose checkout attempts are named by `next_attempt_id`.
    pub fn mount_with_attempt_ids(
        services: Services,
        identity: Identity,
        scope: CartScope,
        config: &CheckoutConfig,
        next_attempt_id: AttemptIdFn,
    ) -> Self {
        info!(user_id = %identity.user_id, store_id = %config.store_id, "Mounting checkout session");

        // 1. Create actors (no dependencies yet)
        let (cart_actor, cart) = crate::cart_actor::new(config.command_buffer);
        let (checkout_actor, checkout) = crate::checkout_actor::new(config.command_buffer);

        // 2. Start actors with injected context
        let cart_handle = tokio::spawn(cart_actor.run(CartContext {
            service: services.cart,
            scope,
        }));
        let checkout_handle = tokio::spawn(checkout_actor.run(CheckoutContext {
            identity,
            store_id: config.store_id.clone(),
            addresses: services.addresses,
            rates: ShippingRateResolver::new(services.rates, config.origin.clone(), config.parcel),
            orders: services.orders,
            payments: services.payments,
            recovery: PendingOrderSlot::new(services.recovery, config.recovery_key.clone()),
            cart: cart.clone(),
            return_url: config.return_url.clone(),
            next_attempt_id,
        }));

        Self {
            cart,
            checkout,
            handles: vec![checkout_handle, cart_handle],
        }
    }

    /// Stops both actors once every outstanding command has been answered.
    ///
    /// Clones of the clients held elsewhere keep their actor alive, so drop
    /// those first.
    pub async fn shutdown(mut self) -> Result<(), ShutdownError> {
        info!("Shutting down checkout session...");
        let handles = std::mem::take(&mut self.handles);

        // Dropping the clients closes the channels; each actor then exits its loop.
        drop(self);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(e.into());
            }
        }

        info!("Checkout session shut down.");
        Ok(())
    }
}

impl Drop for CheckoutSession {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
