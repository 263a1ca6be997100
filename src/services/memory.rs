//! # In-Memory Collaborators
//!
//! In-process implementations of every contract in [`crate::services`]. They
//! keep their state behind a `Mutex` and honour the same promises a remote
//! service makes: carts are priced server side, orders are unique per
//! idempotency key, and the recovery slot is read at most once.
//!
//! They back the full-session integration tests and can stand in for the real
//! services when embedding the engine somewhere without a backend.

use super::{
    AddressRepository, CartScope, CartService, OrderService, PaymentGateway, RateService,
    RecoverySlot, ServiceError,
};
use crate::model::{
    AddressId, Cart, CartId, CartItem, CartItemId, CartMutation, CurrencyCode, Identity, Order,
    OrderId, OrderRequest, OrderStatus, PaymentRequest, PaymentSession, ProductId,
    RateQuoteRequest, ShippingAddress, ShippingRate, UserId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use url::Url;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// CART
// =============================================================================

/// A product the in-memory cart can sell, priced in the base currency.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: String,
    pub price: Decimal,
}

pub struct MemoryCartService {
    base_currency: CurrencyCode,
    catalog: HashMap<ProductId, CatalogEntry>,
    exchange_rates: HashMap<CurrencyCode, Decimal>,
    carts: Mutex<HashMap<CartScope, Cart>>,
    next_id: AtomicU64,
    calls: AtomicUsize,
}

impl MemoryCartService {
    pub fn new(base_currency: impl Into<CurrencyCode>) -> Self {
        Self {
            base_currency: base_currency.into(),
            catalog: HashMap::new(),
            exchange_rates: HashMap::new(),
            carts: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_product(
        mut self,
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
    ) -> Self {
        self.catalog.insert(
            id.into(),
            CatalogEntry {
                name: name.into(),
                price,
            },
        );
        self
    }

    /// Units of `currency` per unit of the base currency.
    pub fn with_exchange_rate(mut self, currency: impl Into<CurrencyCode>, rate: Decimal) -> Self {
        self.exchange_rates.insert(currency.into(), rate);
        self
    }

    /// Number of requests served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cart_by_id(&self, id: &CartId) -> Option<Cart> {
        lock(&self.carts).values().find(|cart| &cart.id == id).cloned()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn rate_for(&self, currency: &CurrencyCode) -> Result<Decimal, ServiceError> {
        if currency == &self.base_currency {
            return Ok(Decimal::ONE);
        }
        self.exchange_rates
            .get(currency)
            .copied()
            .ok_or_else(|| ServiceError::Rejected(format!("Unsupported currency {currency}")))
    }

    fn reprice(&self, cart: &mut Cart) -> Result<(), ServiceError> {
        let rate = self.rate_for(&cart.currency)?;
        let mut total = Decimal::ZERO;
        for item in &mut cart.items {
            let entry = self
                .catalog
                .get(&item.product_id)
                .ok_or_else(|| ServiceError::NotFound(item.product_id.to_string()))?;
            item.unit_price = (entry.price * rate).round_dp(2);
            item.currency = cart.currency.clone();
            total += item.unit_price * Decimal::from(item.quantity);
        }
        cart.total_amount = total;
        Ok(())
    }

    fn empty_cart(&self) -> Cart {
        Cart {
            id: CartId::new(self.next_id("cart")),
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            currency: self.base_currency.clone(),
        }
    }

    fn apply(&self, cart: &mut Cart, mutation: CartMutation) -> Result<(), ServiceError> {
        match mutation {
            CartMutation::AddItem {
                product_id,
                quantity,
                variant,
            } => {
                if quantity == 0 {
                    return Err(ServiceError::Rejected("Quantity must be at least 1".into()));
                }
                let entry = self.catalog.get(&product_id).ok_or_else(|| {
                    ServiceError::Rejected(format!("Product {product_id} is not available"))
                })?;
                match cart
                    .items
                    .iter_mut()
                    .find(|item| item.product_id == product_id && item.variant == variant)
                {
                    Some(item) => item.quantity += quantity,
                    None => cart.items.push(CartItem {
                        id: CartItemId::new(self.next_id("item")),
                        product_id,
                        variant,
                        quantity,
                        unit_price: entry.price,
                        currency: cart.currency.clone(),
                        name: entry.name.clone(),
                    }),
                }
            }
            CartMutation::UpdateQuantity { item_id, quantity } => {
                if quantity == 0 {
                    return Err(ServiceError::Rejected("Quantity must be at least 1".into()));
                }
                let item = cart
                    .items
                    .iter_mut()
                    .find(|item| item.id == item_id)
                    .ok_or_else(|| ServiceError::NotFound(item_id.to_string()))?;
                item.quantity = quantity;
            }
            CartMutation::RemoveItem { item_id } => {
                let before = cart.items.len();
                cart.items.retain(|item| item.id != item_id);
                if cart.items.len() == before {
                    return Err(ServiceError::NotFound(item_id.to_string()));
                }
            }
            CartMutation::Clear => cart.items.clear(),
            CartMutation::SwitchCurrency(currency) => {
                self.rate_for(&currency)?;
                cart.currency = currency;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CartService for MemoryCartService {
    async fn fetch(&self, scope: &CartScope) -> Result<Cart, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut carts = lock(&self.carts);
        if let Some(cart) = carts.get(scope) {
            return Ok(cart.clone());
        }
        let cart = self.empty_cart();
        debug!(cart_id = %cart.id, "Cart created");
        carts.insert(scope.clone(), cart.clone());
        Ok(cart)
    }

    async fn mutate(&self, scope: &CartScope, mutation: CartMutation) -> Result<Cart, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut carts = lock(&self.carts);
        // Work on a copy so a rejected mutation leaves the stored cart alone.
        let mut cart = match carts.get(scope) {
            Some(cart) => cart.clone(),
            None => self.empty_cart(),
        };
        self.apply(&mut cart, mutation)?;
        self.reprice(&mut cart)?;
        carts.insert(scope.clone(), cart.clone());
        Ok(cart)
    }
}

// =============================================================================
// ADDRESSES
// =============================================================================

#[derive(Default)]
pub struct MemoryAddressBook {
    books: Mutex<HashMap<UserId, Vec<ShippingAddress>>>,
    next_id: AtomicU64,
}

impl MemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a saved address for `user_id`.
    pub fn with_address(self, user_id: impl Into<UserId>, mut address: ShippingAddress) -> Self {
        if address.id.is_none() {
            address.id = Some(self.next_id());
        }
        lock(&self.books)
            .entry(user_id.into())
            .or_default()
            .push(address);
        self
    }

    pub fn addresses_of(&self, user_id: &UserId) -> Vec<ShippingAddress> {
        lock(&self.books).get(user_id).cloned().unwrap_or_default()
    }

    fn next_id(&self) -> AddressId {
        AddressId::new(format!("addr_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

#[async_trait]
impl AddressRepository for MemoryAddressBook {
    async fn list(&self, identity: &Identity) -> Result<Vec<ShippingAddress>, ServiceError> {
        Ok(self.addresses_of(&identity.user_id))
    }

    async fn create(
        &self,
        identity: &Identity,
        mut address: ShippingAddress,
    ) -> Result<ShippingAddress, ServiceError> {
        if address.line1.trim().is_empty() || address.country.trim().is_empty() {
            return Err(ServiceError::Rejected(
                "Address line and country are required".into(),
            ));
        }
        address.id = Some(self.next_id());
        let mut books = lock(&self.books);
        let book = books.entry(identity.user_id.clone()).or_default();
        if address.is_default {
            for saved in book.iter_mut() {
                saved.is_default = false;
            }
        }
        book.push(address.clone());
        Ok(address)
    }
}

// =============================================================================
// RATES
// =============================================================================

/// Quotes the same ranked table for every quotable destination.
pub struct TableRateService {
    rates: Vec<ShippingRate>,
    requests: Mutex<Vec<RateQuoteRequest>>,
}

impl TableRateService {
    pub fn new(rates: Vec<ShippingRate>) -> Self {
        Self {
            rates,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RateQuoteRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// The table entry for `code`, as an order backend would look it up.
    pub fn rate(&self, code: &str) -> Option<&ShippingRate> {
        self.rates.iter().find(|rate| rate.code == code)
    }
}

#[async_trait]
impl RateService for TableRateService {
    async fn quote(&self, request: RateQuoteRequest) -> Result<Vec<ShippingRate>, ServiceError> {
        let quotable = request.destination.is_quotable();
        lock(&self.requests).push(request);
        if !quotable {
            return Err(ServiceError::Rejected(
                "Destination city and state are required".into(),
            ));
        }
        Ok(self.rates.clone())
    }
}

// =============================================================================
// ORDERS
// =============================================================================

#[derive(Default)]
struct OrderBook {
    orders: HashMap<OrderId, Order>,
    by_key: HashMap<String, OrderId>,
    next_number: u64,
}

struct Pricing {
    carts: Arc<MemoryCartService>,
    rates: Arc<TableRateService>,
}

/// Order backend with one order per idempotency key.
///
/// When built [`with_pricing`](Self::with_pricing) the order total is the
/// referenced cart's total plus the shipping rate's chargeable price; otherwise
/// orders are created with a zero total.
#[derive(Default)]
pub struct MemoryOrderService {
    pricing: Option<Pricing>,
    book: Mutex<OrderBook>,
}

impl MemoryOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pricing(carts: Arc<MemoryCartService>, rates: Arc<TableRateService>) -> Self {
        Self {
            pricing: Some(Pricing { carts, rates }),
            book: Mutex::new(OrderBook::default()),
        }
    }

    pub fn orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = lock(&self.book).orders.values().cloned().collect();
        orders.sort_by(|a, b| a.id.cmp(&b.id));
        orders
    }

    /// Records a completed payment, as a gateway webhook would.
    pub fn mark_paid(&self, id: &OrderId) -> Option<Order> {
        let mut book = lock(&self.book);
        let order = book.orders.get_mut(id)?;
        order.status = OrderStatus::Paid;
        Some(order.clone())
    }

    fn price(&self, request: &OrderRequest) -> Result<(Decimal, CurrencyCode), ServiceError> {
        let Some(pricing) = &self.pricing else {
            return Ok((Decimal::ZERO, CurrencyCode::new("USD")));
        };
        let cart = pricing
            .carts
            .cart_by_id(&request.cart_id)
            .ok_or_else(|| ServiceError::NotFound(request.cart_id.to_string()))?;
        let shipping = pricing
            .rates
            .rate(&request.shipping_rate_code)
            .and_then(ShippingRate::chargeable_price)
            .ok_or_else(|| {
                ServiceError::Rejected(format!(
                    "Unknown shipping rate {}",
                    request.shipping_rate_code
                ))
            })?;
        if shipping.currency != cart.currency {
            return Err(ServiceError::Rejected(
                "Shipping rate currency does not match the cart".into(),
            ));
        }
        Ok((cart.total_amount + shipping.amount, cart.currency))
    }
}

#[async_trait]
impl OrderService for MemoryOrderService {
    async fn create(&self, request: OrderRequest) -> Result<Order, ServiceError> {
        let (total, currency) = self.price(&request)?;
        let mut book = lock(&self.book);
        if let Some(existing) = book
            .by_key
            .get(&request.idempotency_key)
            .and_then(|id| book.orders.get(id))
        {
            debug!(order_id = %existing.id, key = %request.idempotency_key, "Replayed order");
            return Ok(existing.clone());
        }

        book.next_number += 1;
        let number = book.next_number;
        let order = Order {
            id: OrderId::new(format!("ord_{number}")),
            order_number: format!("ORD{number}"),
            store_id: request.store_id,
            shipping_address_id: request.shipping_address_id,
            shipping_rate_code: request.shipping_rate_code,
            total,
            currency,
            status: OrderStatus::Pending,
        };
        book.by_key
            .insert(request.idempotency_key, order.id.clone());
        book.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn cancel(&self, order_id: &OrderId) -> Result<Order, ServiceError> {
        let mut book = lock(&self.book);
        let order = book
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ServiceError::NotFound(order_id.to_string()))?;
        if order.status == OrderStatus::Paid {
            return Err(ServiceError::Rejected(format!(
                "Order {} is already paid",
                order.order_number
            )));
        }
        order.status = OrderStatus::Cancelled;
        Ok(order.clone())
    }
}

// =============================================================================
// PAYMENTS
// =============================================================================

/// Hands out redirect URLs under a fixed base and remembers every request.
pub struct MemoryPaymentGateway {
    base: Url,
    requests: Mutex<Vec<PaymentRequest>>,
}

impl MemoryPaymentGateway {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl PaymentGateway for MemoryPaymentGateway {
    async fn create_session(&self, request: PaymentRequest) -> Result<PaymentSession, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::Rejected("Amount must be positive".into()));
        }
        let mut requests = lock(&self.requests);
        requests.push(request);
        let redirect_url = self
            .base
            .join(&format!("session/ps_{}", requests.len()))
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(PaymentSession { redirect_url })
    }
}

// =============================================================================
// RECOVERY SLOT
// =============================================================================

#[derive(Default)]
pub struct MemoryRecoverySlot {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryRecoverySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks at the stored value without consuming it.
    pub fn peek(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }
}

#[async_trait]
impl RecoverySlot for MemoryRecoverySlot {
    async fn write(&self, key: &str, value: String) -> Result<(), ServiceError> {
        lock(&self.values).insert(key.to_string(), value);
        Ok(())
    }

    async fn read_once_and_clear(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(lock(&self.values).remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Money, SessionId, StoreId, Variant};

    fn scope() -> CartScope {
        CartScope {
            store_id: StoreId::new("store_1"),
            session_id: SessionId::new("sess_1"),
        }
    }

    fn add(product: &str, quantity: u32) -> CartMutation {
        CartMutation::AddItem {
            product_id: ProductId::new(product),
            quantity,
            variant: Variant::new(),
        }
    }

    #[tokio::test]
    async fn test_cart_totals_are_computed_server_side() {
        let service = MemoryCartService::new("USD")
            .with_product("P1", "Tee", Decimal::new(1250, 2))
            .with_product("P2", "Cap", Decimal::new(800, 2));

        service.mutate(&scope(), add("P1", 2)).await.unwrap();
        let cart = service.mutate(&scope(), add("P2", 1)).await.unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.total_amount, Decimal::new(3300, 2));
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_mutation_leaves_cart_untouched() {
        let service = MemoryCartService::new("USD").with_product("P1", "Tee", Decimal::TEN);
        let before = service.mutate(&scope(), add("P1", 1)).await.unwrap();

        let result = service.mutate(&scope(), add("missing", 1)).await;
        assert!(matches!(result, Err(ServiceError::Rejected(_))));
        assert_eq!(service.fetch(&scope()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_switch_currency_reprices_items() {
        let service = MemoryCartService::new("USD")
            .with_product("P1", "Tee", Decimal::TEN)
            .with_exchange_rate("NGN", Decimal::from(1500));
        service.mutate(&scope(), add("P1", 2)).await.unwrap();

        let cart = service
            .mutate(&scope(), CartMutation::SwitchCurrency("NGN".into()))
            .await
            .unwrap();
        assert_eq!(cart.currency.as_str(), "NGN");
        assert_eq!(cart.total_amount, Decimal::from(30000));

        let unsupported = service
            .mutate(&scope(), CartMutation::SwitchCurrency("EUR".into()))
            .await;
        assert!(unsupported.is_err());
    }

    #[tokio::test]
    async fn test_order_service_returns_one_order_per_key() {
        let orders = MemoryOrderService::new();
        let request = OrderRequest {
            cart_id: CartId::new("cart_1"),
            shipping_address_id: AddressId::new("addr_1"),
            store_id: StoreId::new("store_1"),
            shipping_rate_code: "std".into(),
            idempotency_key: "checkout-a1-user_1".into(),
        };

        let first = orders.create(request.clone()).await.unwrap();
        let second = orders.create(request.clone()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(orders.orders().len(), 1);

        let other = orders
            .create(OrderRequest {
                idempotency_key: "checkout-a2-user_1".into(),
                ..request
            })
            .await
            .unwrap();
        assert_ne!(other.id, first.id);
        assert_eq!(orders.orders().len(), 2);
    }

    #[tokio::test]
    async fn test_order_total_includes_shipping() {
        let carts = Arc::new(MemoryCartService::new("USD").with_product("P1", "Tee", Decimal::new(2000, 2)));
        let cart = carts.mutate(&scope(), add("P1", 1)).await.unwrap();
        let rates = Arc::new(TableRateService::new(vec![ShippingRate {
            code: "std".into(),
            carrier: "GIG".into(),
            service_name: "Standard".into(),
            prices: vec![Money::from_minor(500, "USD")],
            estimated_days: None,
        }]));
        let orders = MemoryOrderService::with_pricing(carts, rates);
        let request = OrderRequest {
            cart_id: cart.id,
            shipping_address_id: AddressId::new("addr_1"),
            store_id: StoreId::new("store_1"),
            shipping_rate_code: "std".into(),
            idempotency_key: "checkout-a1-user_1".into(),
        };

        let order = orders.create(request.clone()).await.unwrap();
        assert_eq!(order.total, Decimal::new(2500, 2));
        assert_eq!(order.currency.as_str(), "USD");

        let unknown = orders
            .create(OrderRequest {
                shipping_rate_code: "overnight".into(),
                idempotency_key: "checkout-a2-user_1".into(),
                ..request
            })
            .await;
        assert!(matches!(unknown, Err(ServiceError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_paid_order_cannot_be_cancelled() {
        let orders = MemoryOrderService::new();
        let order = orders
            .create(OrderRequest {
                cart_id: CartId::new("cart_1"),
                shipping_address_id: AddressId::new("addr_1"),
                store_id: StoreId::new("store_1"),
                shipping_rate_code: "std".into(),
                idempotency_key: "k".into(),
            })
            .await
            .unwrap();
        orders.mark_paid(&order.id);

        assert!(orders.cancel(&order.id).await.is_err());
    }

    #[tokio::test]
    async fn test_recovery_slot_reads_once() {
        let slot = MemoryRecoverySlot::new();
        slot.write("pending", "value".into()).await.unwrap();

        assert_eq!(
            slot.read_once_and_clear("pending").await.unwrap(),
            Some("value".to_string())
        );
        assert_eq!(slot.read_once_and_clear("pending").await.unwrap(), None);
    }
}
