use checkout_engine::cart_actor::{CartContext, CartError};
use checkout_engine::clients::{CartClient, StoreClient};
use checkout_engine::model::{Cart, CartId, CartItem, CartMutation, CurrencyCode, Variant};
use checkout_engine::services::mock::MockCartService;
use checkout_engine::services::{CartScope, ServiceError};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Starts a real Cart actor against a scripted cart service.
/// Script `fetch` first: the cart is loaded on mount.
fn start(service: Arc<MockCartService>) -> (CartClient, JoinHandle<()>) {
    let (actor, client) = checkout_engine::cart_actor::new(10);
    let handle = tokio::spawn(actor.run(CartContext {
        service,
        scope: CartScope {
            store_id: "store_1".into(),
            session_id: "sess_1".into(),
        },
    }));
    (client, handle)
}

fn cart(lines: &[(&str, u32, i64)]) -> Cart {
    let items: Vec<CartItem> = lines
        .iter()
        .map(|(product, quantity, minor)| CartItem {
            id: format!("item_{product}").into(),
            product_id: (*product).into(),
            variant: Variant::new(),
            quantity: *quantity,
            unit_price: Decimal::new(*minor, 2),
            currency: CurrencyCode::new("USD"),
            name: product.to_string(),
        })
        .collect();
    let total_amount = items
        .iter()
        .map(|item| item.unit_price * Decimal::from(item.quantity))
        .sum();
    Cart {
        id: CartId::new("cart_1"),
        items,
        total_amount,
        currency: CurrencyCode::new("USD"),
    }
}

#[tokio::test]
async fn test_mount_loads_cart_and_mutations_replace_it() {
    let service = Arc::new(MockCartService::new());
    service.fetch.expect().return_ok(cart(&[("tee", 1, 2000)]));
    let (client, handle) = start(service.clone());

    // The server's snapshot wins, even where it disagrees with what was asked for.
    let repriced = cart(&[("tee", 3, 1800)]);
    service.mutate.expect().return_ok(repriced.clone());
    let result = client.update_quantity("item_tee".into(), 3).await.unwrap();

    assert_eq!(result, repriced);
    let state = client.snapshot();
    assert_eq!(state.cart, Some(repriced));
    assert_eq!(state.item_count(), 3);
    assert_eq!(state.total_amount(), Some(Decimal::new(5400, 2)));
    assert_eq!(service.fetch.call_count(), 1);
    assert_eq!(
        service.mutate.calls(),
        vec![CartMutation::UpdateQuantity {
            item_id: "item_tee".into(),
            quantity: 3,
        }]
    );

    service.fetch.verify();
    service.mutate.verify();
    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_loading_is_published_while_the_call_is_in_flight() {
    let service = Arc::new(MockCartService::new());
    service.fetch.expect().return_ok(cart(&[("tee", 1, 2000)]));
    let (client, handle) = start(service.clone());
    client.clear_error().await.unwrap();

    let release = service.mutate.expect().hold();
    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.remove_item("item_tee".into()).await })
    };
    let mut states = client.subscribe();
    states.wait_for(|state| state.loading).await.unwrap();
    assert_eq!(client.snapshot().item_count(), 1);

    release.send(Ok(cart(&[]))).unwrap();
    let emptied = pending.await.unwrap().unwrap();
    assert!(emptied.is_empty());

    let state = client.snapshot();
    assert!(!state.loading);
    assert_eq!(state.item_count(), 0);

    service.mutate.verify();
    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_failed_load_and_mutation_keep_last_snapshot() {
    let service = Arc::new(MockCartService::new());
    service
        .fetch
        .expect()
        .return_err(ServiceError::Transport("connection refused".into()));
    let (client, handle) = start(service.clone());

    client.clear_error().await.unwrap();
    assert!(client.snapshot().cart.is_none());

    let loaded = cart(&[("mug", 2, 1250)]);
    service.fetch.expect().return_ok(loaded.clone());
    client.refresh().await.unwrap();

    service
        .mutate
        .expect()
        .return_err(ServiceError::Rejected("Cart is locked".into()));
    let error = client.clear().await.unwrap_err();
    assert!(matches!(error, CartError::Failed { action: "clear cart", .. }));

    let state = client.snapshot();
    assert_eq!(state.cart, Some(loaded));
    assert_eq!(state.error.as_deref(), Some("Failed to clear cart"));
    assert!(!state.loading);

    service.fetch.verify();
    service.mutate.verify();
    drop(client);
    handle.await.unwrap();
}
