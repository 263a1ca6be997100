//! SessionEntity implementation for the cart state.
//!
//! The cart store mirrors a server-owned cart. Each command issues exactly one
//! cart service call and, on success, swaps in the returned snapshot wholesale.
//! Nothing is applied optimistically, so a failure only has to record an error.

use super::error::CartError;
use crate::framework::{SessionEntity, StatePublisher};
use crate::model::{Cart, CartMutation};
use crate::services::{CartScope, CartService};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

/// What the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    /// Last snapshot the server confirmed. `None` until the first load succeeds.
    pub cart: Option<Cart>,
    pub loading: bool,
    pub error: Option<String>,
    pub summary_open: bool,
}

impl CartState {
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, Cart::item_count)
    }

    pub fn total_amount(&self) -> Option<Decimal> {
        self.cart.as_ref().map(|cart| cart.total_amount)
    }
}

#[derive(Debug, Clone)]
pub enum CartCommand {
    Refresh,
    Mutate(CartMutation),
    OpenSummary,
    CloseSummary,
    ClearError,
}

#[derive(Debug, Clone)]
pub enum CartOutcome {
    /// The server's snapshot after a refresh or mutation.
    Cart(Cart),
    /// A local-only command completed.
    Done,
}

/// Collaborators injected into the cart actor.
#[derive(Clone)]
pub struct CartContext {
    pub service: Arc<dyn CartService>,
    pub scope: CartScope,
}

impl CartState {
    async fn sync(
        &mut self,
        ctx: &CartContext,
        publisher: &StatePublisher<Self>,
        mutation: Option<CartMutation>,
    ) -> Result<Cart, CartError> {
        let action = mutation.as_ref().map_or("load cart", CartMutation::action);
        self.loading = true;
        publisher.publish(self);

        let result = match mutation {
            None => ctx.service.fetch(&ctx.scope).await,
            Some(mutation) => ctx.service.mutate(&ctx.scope, mutation).await,
        };
        self.loading = false;

        match result {
            Ok(cart) => {
                debug!(cart_id = %cart.id, items = cart.items.len(), total = %cart.total_amount, "Snapshot replaced");
                self.cart = Some(cart.clone());
                self.error = None;
                Ok(cart)
            }
            Err(source) => {
                let error = CartError::Failed { action, source };
                self.error = Some(error.user_message());
                Err(error)
            }
        }
    }
}

#[async_trait]
impl SessionEntity for CartState {
    type Command = CartCommand;
    type Outcome = CartOutcome;
    type Error = CartError;
    type Context = CartContext;

    async fn on_mount(&mut self, ctx: &CartContext, publisher: &StatePublisher<Self>) {
        if self.sync(ctx, publisher, None).await.is_ok() {
            info!(store_id = %ctx.scope.store_id, "Cart loaded");
        }
    }

    async fn handle(
        &mut self,
        command: CartCommand,
        ctx: &CartContext,
        publisher: &StatePublisher<Self>,
    ) -> Result<CartOutcome, CartError> {
        match command {
            CartCommand::Refresh => self.sync(ctx, publisher, None).await.map(CartOutcome::Cart),
            CartCommand::Mutate(mutation) => {
                let opens_summary = matches!(mutation, CartMutation::AddItem { .. });
                let cart = self.sync(ctx, publisher, Some(mutation)).await?;
                if opens_summary {
                    self.summary_open = true;
                }
                Ok(CartOutcome::Cart(cart))
            }
            CartCommand::OpenSummary => {
                self.summary_open = true;
                Ok(CartOutcome::Done)
            }
            CartCommand::CloseSummary => {
                self.summary_open = false;
                Ok(CartOutcome::Done)
            }
            CartCommand::ClearError => {
                self.error = None;
                Ok(CartOutcome::Done)
            }
        }
    }
}
