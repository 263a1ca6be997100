//! Type-safe wrappers around [`SessionClient`](crate::framework::SessionClient).

pub mod actor_client;
pub mod cart_client;
pub mod checkout_client;

pub use actor_client::*;
pub use cart_client::*;
pub use checkout_client::*;
