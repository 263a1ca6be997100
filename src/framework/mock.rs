//! # Mock Framework
//!
//! Utilities for testing typed clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and the receiving end of its
//! command channel. Then use [`expect_command`] to pull the next request,
//! assert on it, and answer it by hand. No actor is spawned, so the response
//! (success, failure, delay) is entirely under the test's control.
//!
//! To test the collaborators an actor depends on, see [`crate::services::mock`].

use crate::framework::{SessionClient, SessionEntity, SessionRequest};
use tokio::sync::{mpsc, watch};

/// Creates a mock client and a receiver for asserting requests.
///
/// The returned `watch::Sender` lets the test drive what the client sees in
/// [`SessionClient::snapshot`].
pub fn create_mock_client<T: SessionEntity>(
    buffer_size: usize,
    initial: T,
) -> (
    SessionClient<T>,
    mpsc::Receiver<SessionRequest<T>>,
    watch::Sender<T>,
) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (state_tx, state_rx) = watch::channel(initial);
    (SessionClient::new(sender, state_rx), receiver, state_tx)
}

/// Helper to pull the next request off the mock channel.
pub async fn expect_command<T: SessionEntity>(
    receiver: &mut mpsc::Receiver<SessionRequest<T>>,
) -> Option<SessionRequest<T>> {
    receiver.recv().await
}
