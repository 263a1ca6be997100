//! Checkout orchestrator: step state machine and the place-order sequence.

pub mod entity;
pub mod error;
pub mod recovery;
pub mod state;

pub use entity::*;
pub use error::*;
pub use recovery::*;
pub use state::*;

use crate::clients::CheckoutClient;
use crate::framework::SessionActor;

/// Creates a new Checkout actor and its client.
pub fn new(buffer_size: usize) -> (SessionActor<CheckoutState>, CheckoutClient) {
    let (actor, generic_client) = SessionActor::new(buffer_size, CheckoutState::default());
    (actor, CheckoutClient::new(generic_client))
}
