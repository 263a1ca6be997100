//! # Checkout Engine
//!
//! > **Cart state and checkout orchestration for a headless storefront.**
//!
//! This crate holds the client-side half of a store's checkout: a cart store that
//! mirrors the server-owned cart, and a checkout orchestrator that walks the
//! shopper from shipping details to a payment-gateway hand-off. Both are actors
//! built on one small engine, so each owns its state, processes commands one at a
//! time and publishes every state change to whoever is rendering it.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Server-authoritative cart
//! The cart store never computes a total or applies a change locally. Every
//! mutation goes to the [`CartService`](services::CartService) and the returned
//! snapshot replaces the local one wholesale. A failure leaves the last good
//! snapshot in place and records an error.
//!
//! ### Collaborators behind traits
//! Address book, rate quoting, orders, payments and the recovery slot are all
//! traits in [`services`]. Transport is somebody else's problem; this crate only
//! sequences the calls.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Each store defines its own error type ([`CartError`](cart_actor::CartError),
//! [`CheckoutError`](checkout_actor::CheckoutError)). Collaborator failures keep
//! their [`ServiceError`](services::ServiceError) as the source, and
//! `user_message()` decides what the shopper is shown.
//!
//! ### 2. Async Context Injection
//! Collaborators are injected when an actor is started via `run()`, not when its
//! state is created. The checkout actor's context carries a cart client, which is
//! how it reads the payable total.
//!
//! ### 3. Concurrency Model
//! Each store runs in its own Tokio task and handles commands sequentially, so two
//! cart mutations fired back to back reach the server in order and the later
//! snapshot is the one displayed. A second "place order" while one is running is
//! refused with [`CheckoutError::Busy`](checkout_actor::CheckoutError::Busy).
//!
//! ### 4. Observability
//! `tracing` throughout; see [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic [`SessionActor`](framework::SessionActor) and the
//! [`SessionEntity`](framework::SessionEntity) trait a store implements.
//!
//! ### 2. The Stores ([`cart_actor`], [`checkout_actor`])
//! Cart mirroring, and the checkout step machine with its place-order sequence.
//! Shipping quotes go through the [`rates`] resolver.
//!
//! ### 3. The Interface ([`clients`])
//! Typed wrappers: [`CartClient`](clients::CartClient) and
//! [`CheckoutClient`](clients::CheckoutClient).
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! [`CheckoutSession`](lifecycle::CheckoutSession) mounts both stores for a page
//! and tears them down with it.
//!
//! ### 5. Data and Collaborators ([`model`], [`services`], [`config`])
//! Value types, the collaborator contracts with in-memory and scripted
//! implementations, and environment-driven configuration.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo against in-memory collaborators
//! RUST_LOG=info cargo run
//!
//! cargo test
//! ```

pub mod cart_actor;
pub mod checkout_actor;
pub mod clients;
pub mod config;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod rates;
pub mod services;
