//! # StoreClient Trait
//!
//! Common read side for the typed store clients: every store can be
//! snapshotted and subscribed to the same way.
use crate::framework::{SessionClient, SessionEntity};
use tokio::sync::watch;

/// Trait for store-specific clients to inherit the state accessors.
pub trait StoreClient<T: SessionEntity>: Send + Sync {
    /// Access the inner generic SessionClient.
    fn inner(&self) -> &SessionClient<T>;

    /// Latest published state.
    fn snapshot(&self) -> T {
        self.inner().snapshot()
    }

    /// Notified after every command, and mid-command when a handler publishes.
    fn subscribe(&self) -> watch::Receiver<T> {
        self.inner().subscribe()
    }
}
