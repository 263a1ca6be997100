//! Cart store: session-scoped mirror of the server-owned cart.

pub mod entity;
pub mod error;

pub use entity::*;
pub use error::*;

use crate::clients::CartClient;
use crate::framework::SessionActor;

/// Creates a new Cart actor and its client.
pub fn new(buffer_size: usize) -> (SessionActor<CartState>, CartClient) {
    let (actor, generic_client) = SessionActor::new(buffer_size, CartState::default());
    (actor, CartClient::new(generic_client))
}
