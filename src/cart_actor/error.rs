//! Error types for the Cart actor.

use crate::framework::FrameworkError;
use crate::services::ServiceError;
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    /// The cart service failed; nothing was applied locally.
    #[error("Failed to {action}")]
    Failed {
        action: &'static str,
        #[source]
        source: ServiceError,
    },

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(#[from] FrameworkError),
}

impl CartError {
    /// Message shown to the shopper.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
