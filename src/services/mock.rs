//! # Scripted Collaborators
//!
//! Expectation-queue stand-ins for the collaborator contracts.
//!
//! Each mock answers calls in the order its expectations were queued, records
//! every request it receives, and panics on a call nobody scripted. A reply can
//! also be *held*: the call then waits until the test releases it, which makes
//! in-flight states (loading flags, busy guards) observable.
//!
//! # Example
//! ```ignore
//! let rates = Arc::new(MockRateService::new());
//! rates.expect().return_ok(vec![standard_rate()]);
//!
//! // ... drive the orchestrator ...
//!
//! assert_eq!(rates.call_count(), 1);
//! rates.verify(); // every scripted reply was consumed
//! ```

use super::{
    AddressRepository, CartScope, CartService, OrderService, PaymentGateway, RateService,
    ServiceError,
};
use crate::model::{
    Cart, CartMutation, Identity, Order, OrderId, OrderRequest, PaymentRequest, PaymentSession,
    RateQuoteRequest, ShippingAddress, ShippingRate,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type Reply<T> = Result<T, ServiceError>;

enum Scripted<T> {
    Ready(Reply<T>),
    Held(oneshot::Receiver<Reply<T>>),
}

/// One scripted endpoint: a reply queue plus a log of received requests.
pub struct Script<Req, Resp> {
    replies: Arc<Mutex<VecDeque<Scripted<Resp>>>>,
    calls: Arc<Mutex<Vec<Req>>>,
}

impl<Req, Resp> Default for Script<Req, Resp> {
    fn default() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<Req: Clone + Send, Resp: Send> Script<Req, Resp> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the reply for the next unanswered call.
    pub fn expect(&self) -> ReplyBuilder<Resp> {
        ReplyBuilder {
            replies: self.replies.clone(),
        }
    }

    pub fn calls(&self) -> Vec<Req> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Panics unless every queued reply was consumed.
    pub fn verify(&self) {
        let remaining = self.replies.lock().unwrap().len();
        if remaining != 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }

    async fn respond(&self, request: Req) -> Reply<Resp> {
        self.calls.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Held(receiver)) => receiver
                .await
                .unwrap_or_else(|_| Err(ServiceError::Transport("held reply dropped".into()))),
            None => panic!("Unexpected call: no reply scripted"),
        }
    }
}

/// Builder returned by [`Script::expect`].
pub struct ReplyBuilder<Resp> {
    replies: Arc<Mutex<VecDeque<Scripted<Resp>>>>,
}

impl<Resp> ReplyBuilder<Resp> {
    pub fn return_ok(self, value: Resp) {
        self.push(Scripted::Ready(Ok(value)));
    }

    pub fn return_err(self, error: ServiceError) {
        self.push(Scripted::Ready(Err(error)));
    }

    /// The call will wait until the returned sender is used (or dropped).
    pub fn hold(self) -> oneshot::Sender<Reply<Resp>> {
        let (sender, receiver) = oneshot::channel();
        self.push(Scripted::Held(receiver));
        sender
    }

    fn push(self, reply: Scripted<Resp>) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

// =============================================================================
// CONTRACT MOCKS
// =============================================================================

#[derive(Default)]
pub struct MockCartService {
    pub fetch: Script<CartScope, Cart>,
    pub mutate: Script<CartMutation, Cart>,
}

impl MockCartService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartService for MockCartService {
    async fn fetch(&self, scope: &CartScope) -> Result<Cart, ServiceError> {
        self.fetch.respond(scope.clone()).await
    }

    async fn mutate(&self, _scope: &CartScope, mutation: CartMutation) -> Result<Cart, ServiceError> {
        self.mutate.respond(mutation).await
    }
}

#[derive(Default)]
pub struct MockAddressRepository {
    pub list: Script<Identity, Vec<ShippingAddress>>,
    pub create: Script<ShippingAddress, ShippingAddress>,
}

impl MockAddressRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressRepository for MockAddressRepository {
    async fn list(&self, identity: &Identity) -> Result<Vec<ShippingAddress>, ServiceError> {
        self.list.respond(identity.clone()).await
    }

    async fn create(
        &self,
        _identity: &Identity,
        address: ShippingAddress,
    ) -> Result<ShippingAddress, ServiceError> {
        self.create.respond(address).await
    }
}

pub type MockRateService = Script<RateQuoteRequest, Vec<ShippingRate>>;

#[async_trait]
impl RateService for Script<RateQuoteRequest, Vec<ShippingRate>> {
    async fn quote(&self, request: RateQuoteRequest) -> Result<Vec<ShippingRate>, ServiceError> {
        self.respond(request).await
    }
}

#[derive(Default)]
pub struct MockOrderService {
    pub create: Script<OrderRequest, Order>,
    pub cancel: Script<OrderId, Order>,
}

impl MockOrderService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderService for MockOrderService {
    async fn create(&self, request: OrderRequest) -> Result<Order, ServiceError> {
        self.create.respond(request).await
    }

    async fn cancel(&self, order_id: &OrderId) -> Result<Order, ServiceError> {
        self.cancel.respond(order_id.clone()).await
    }
}

pub type MockPaymentGateway = Script<PaymentRequest, PaymentSession>;

#[async_trait]
impl PaymentGateway for Script<PaymentRequest, PaymentSession> {
    async fn create_session(&self, request: PaymentRequest) -> Result<PaymentSession, ServiceError> {
        self.respond(request).await
    }
}
