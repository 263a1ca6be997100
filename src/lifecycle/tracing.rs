//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate.
//!
//! ## Configuration
//!
//! Log lines use the compact format and hide the module prefix
//! (`with_target(false)`); actor lines carry an `entity_type` field instead.
//! Levels come from `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=info   # mount, order placement, hand-off
//! RUST_LOG=debug  # every command, snapshot replacement, collaborator payloads
//! RUST_LOG=checkout_engine::rates=debug
//! ```
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: `Actor started`, `Mounted`, `Shutdown` per store
//! - **Commands**: one `Command` line per command at debug, `Command failed` at warn
//! - **Client Calls**: typed client methods open a span named after the method
//! - **Checkout**: attempt id, created order and hand-off amount at info
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO Mounting checkout session user_id=user_1 store_id=store_1
//! INFO Actor started entity_type="CartState"
//! INFO Actor started entity_type="CheckoutState"
//! INFO Cart loaded store_id=store_1
//! INFO place_order: Sending place_order to actor
//! INFO Placing order attempt=5f0c... cart_id=cart_1
//! INFO Handing off to payment order_id=ord_1 amount=25.00
//! ```
//!
//! **With `RUST_LOG=debug`** the same flow adds:
//!
//! ```text
//! DEBUG Command entity_type="CheckoutState" command=PlaceOrder
//! DEBUG Order created order_id=ord_1 order_number=ORD1
//! DEBUG Pending order stashed order_id=ord_1 key=pending_order
//! DEBUG Command ok entity_type="CheckoutState"
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Don't show module paths - we use entity_type instead
        .compact()
        .init();
}
