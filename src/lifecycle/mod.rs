//! # Session Lifecycle
//!
//! Starting, wiring and stopping the two stores behind one checkout page.
//!
//! ## The Wiring
//!
//! The cart actor has no dependencies beyond its cart service. The checkout
//! actor needs the cart (to read the payable total), so it is started second
//! with a clone of the cart client in its context:
//!
//! ```rust,ignore
//! let (cart_actor, cart) = cart_actor::new(buffer);
//! let (checkout_actor, checkout) = checkout_actor::new(buffer);
//!
//! let cart_handle = tokio::spawn(cart_actor.run(cart_context));
//! let checkout_handle = tokio::spawn(checkout_actor.run(CheckoutContext {
//!     cart: cart.clone(),
//!     // ...
//! }));
//! ```
//!
//! ## Main Components
//!
//! - [`CheckoutSession`] - Owns both actors for as long as the page is mounted
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod checkout_session;
pub mod tracing;

pub use checkout_session::*;
pub use tracing::*;
