//! # Checkout Engine Demo
//!
//! Walks one shopper from an empty cart to the payment hand-off against the
//! in-memory collaborators:
//! 1.  Mounting a [`CheckoutSession`].
//! 2.  Adding items and switching currency.
//! 3.  Choosing an address and rate, then placing the order.
//!
//! Reads `CHECKOUT_*` variables (see [`checkout_engine::config`]) and falls
//! back to a demo store when they are missing.

use checkout_engine::clients::StoreClient;
use checkout_engine::config::CheckoutConfig;
use checkout_engine::lifecycle::{setup_tracing, CheckoutSession};
use checkout_engine::model::{Identity, Money, ShippingAddress, ShippingRate, Variant};
use checkout_engine::services::memory::{
    MemoryAddressBook, MemoryCartService, MemoryOrderService, MemoryPaymentGateway,
    MemoryRecoverySlot, TableRateService,
};
use checkout_engine::services::{CartScope, Services};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use url::Url;

fn demo_config() -> Result<CheckoutConfig, url::ParseError> {
    let origin = ShippingAddress {
        line1: "12 Warehouse Rd".into(),
        city: Some("Lagos".into()),
        state: Some("LA".into()),
        country: "NG".into(),
        ..Default::default()
    };
    Ok(CheckoutConfig::new(
        "demo_store",
        origin,
        Url::parse("http://localhost:3000/checkout")?,
    ))
}

fn demo_services() -> Result<Services, url::ParseError> {
    let cart = Arc::new(
        MemoryCartService::new("USD")
            .with_product("tee", "Logo Tee", Decimal::new(2000, 2))
            .with_product("mug", "Enamel Mug", Decimal::new(1250, 2))
            .with_exchange_rate("EUR", Decimal::new(92, 2)),
    );
    let rates = TableRateService::new(vec![
        ShippingRate {
            code: "standard".into(),
            carrier: "GIG".into(),
            service_name: "Standard".into(),
            prices: vec![Money::from_minor(500, "USD")],
            estimated_days: Some(5),
        },
        ShippingRate {
            code: "express".into(),
            carrier: "DHL".into(),
            service_name: "Express".into(),
            prices: vec![Money::from_minor(1500, "USD")],
            estimated_days: Some(2),
        },
    ]);
    let rates = Arc::new(rates);
    Ok(Services {
        orders: Arc::new(MemoryOrderService::with_pricing(cart.clone(), rates.clone())),
        cart,
        addresses: Arc::new(MemoryAddressBook::new()),
        rates,
        payments: Arc::new(MemoryPaymentGateway::new(Url::parse(
            "https://pay.example/",
        )?)),
        recovery: Arc::new(MemoryRecoverySlot::new()),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = match CheckoutConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Using demo configuration");
            demo_config()?
        }
    };
    let identity = Identity::new("user_1", "ada@example.com", "Ada Obi");
    let scope = CartScope {
        store_id: config.store_id.clone(),
        session_id: "demo_session".into(),
    };

    let session = CheckoutSession::mount(demo_services()?, identity, scope, &config);

    let span = tracing::info_span!("shopping");
    async {
        session
            .cart
            .add_item("tee".into(), 2, Variant::new().with("size", "M"))
            .await?;
        session.cart.add_item("mug".into(), 1, Variant::new()).await?;
        let cart = session.cart.switch_currency("EUR".into()).await?;
        info!(total = %cart.total_amount, currency = %cart.currency, "Cart repriced");
        // Rates are quoted in USD and checkout refuses to mix currencies.
        session.cart.switch_currency("USD".into()).await?;
        Ok::<_, Box<dyn std::error::Error>>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("checkout");
    let handoff = async {
        session
            .checkout
            .create_address(ShippingAddress {
                first_name: "Ada".into(),
                last_name: "Obi".into(),
                email: "ada@example.com".into(),
                line1: "4 Admiralty Way".into(),
                city: Some("Lekki".into()),
                state: Some("LA".into()),
                country: "NG".into(),
                ..Default::default()
            })
            .await?;
        let rates = session.checkout.snapshot().shipping_rates;
        info!(count = rates.len(), "Rates available");
        session.checkout.select_shipping_rate("express").await?;
        session.checkout.proceed_to_payment().await?;
        Ok::<_, Box<dyn std::error::Error>>(session.checkout.place_order().await?)
    }
    .instrument(span)
    .await?;

    info!(
        order = %handoff.order.order_number,
        amount = %handoff.amount,
        redirect = %handoff.redirect_url,
        "Ready to redirect"
    );

    session.shutdown().await?;
    info!("Demo completed successfully");
    Ok(())
}
