//! # Cart Client
//!
//! High-level API over the cart store. Every mutation resolves to the server's
//! snapshot once the store has replaced its own.
use crate::cart_actor::{CartCommand, CartError, CartOutcome, CartState};
use crate::clients::actor_client::StoreClient;
use crate::framework::SessionClient;
use crate::model::{Cart, CartItemId, CartMutation, CurrencyCode, ProductId, Variant};
use tracing::{debug, instrument};

/// Client for interacting with the Cart actor.
#[derive(Clone)]
pub struct CartClient {
    inner: SessionClient<CartState>,
}

impl CartClient {
    pub fn new(inner: SessionClient<CartState>) -> Self {
        Self { inner }
    }

    async fn sync(&self, command: CartCommand) -> Result<Cart, CartError> {
        match self.inner.send(command).await? {
            CartOutcome::Cart(cart) => Ok(cart),
            CartOutcome::Done => unreachable!("Cart service commands must return a snapshot"),
        }
    }

    async fn local(&self, command: CartCommand) -> Result<(), CartError> {
        self.inner.send(command).await.map(|_| ())
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Cart, CartError> {
        debug!("Sending request");
        self.sync(CartCommand::Refresh).await
    }

    #[instrument(skip(self, variant))]
    pub async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        variant: Variant,
    ) -> Result<Cart, CartError> {
        debug!(?variant, "Sending request");
        self.sync(CartCommand::Mutate(CartMutation::AddItem {
            product_id,
            quantity,
            variant,
        }))
        .await
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(&self, item_id: CartItemId, quantity: u32) -> Result<Cart, CartError> {
        debug!("Sending request");
        self.sync(CartCommand::Mutate(CartMutation::UpdateQuantity { item_id, quantity }))
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<Cart, CartError> {
        debug!("Sending request");
        self.sync(CartCommand::Mutate(CartMutation::RemoveItem { item_id }))
            .await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart, CartError> {
        debug!("Sending request");
        self.sync(CartCommand::Mutate(CartMutation::Clear)).await
    }

    /// Reprices the cart in another currency. The server does the conversion.
    #[instrument(skip(self))]
    pub async fn switch_currency(&self, currency: CurrencyCode) -> Result<Cart, CartError> {
        debug!("Sending request");
        self.sync(CartCommand::Mutate(CartMutation::SwitchCurrency(currency)))
            .await
    }

    pub async fn open_summary(&self) -> Result<(), CartError> {
        self.local(CartCommand::OpenSummary).await
    }

    pub async fn close_summary(&self) -> Result<(), CartError> {
        self.local(CartCommand::CloseSummary).await
    }

    pub async fn clear_error(&self) -> Result<(), CartError> {
        self.local(CartCommand::ClearError).await
    }
}

impl StoreClient<CartState> for CartClient {
    fn inner(&self) -> &SessionClient<CartState> {
        &self.inner
    }
}
