//! Error types for the Checkout actor.

use super::state::CheckoutStep;
use crate::framework::FrameworkError;
use crate::model::CurrencyCode;
use crate::services::ServiceError;
use thiserror::Error;

/// Errors that can occur while driving checkout.
///
/// Collaborator failures keep the underlying [`ServiceError`] as their source;
/// [`CheckoutError::user_message`] decides what the shopper sees.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckoutError {
    /// A guard failed; completing the form fixes it.
    #[error("{0}")]
    IncompleteInput(String),

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: CheckoutStep, to: CheckoutStep },

    #[error("Unknown shipping rate: {0}")]
    UnknownRate(String),

    #[error("Your cart is empty")]
    EmptyCart,

    /// The cart was repriced after the rates were quoted.
    #[error("Shipping is priced in {rate} but your cart is in {cart}")]
    CurrencyMismatch { rate: CurrencyCode, cart: CurrencyCode },

    #[error("Failed to load saved addresses")]
    AddressLoadFailed(#[source] ServiceError),

    #[error("Failed to save shipping address")]
    AddressCreationFailed(#[source] ServiceError),

    /// The previous rate list, if any, is left in place.
    #[error("Failed to fetch shipping rates")]
    RateQuoteFailed(#[source] ServiceError),

    #[error("Failed to create order")]
    OrderCreationFailed(#[source] ServiceError),

    #[error("Failed to save checkout progress")]
    RecoveryFailed(#[source] ServiceError),

    /// The order exists at this point; retrying reuses it.
    #[error("Failed to initiate payment")]
    PaymentInitiationFailed(#[source] ServiceError),

    #[error("Failed to cancel order")]
    CancellationFailed(#[source] ServiceError),

    #[error("Order placement already in progress")]
    Busy,

    #[error("Checkout was already handed off to the payment gateway")]
    AlreadyHandedOff,

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(#[from] FrameworkError),
}

impl CheckoutError {
    pub(crate) fn incomplete(message: &str) -> Self {
        Self::IncompleteInput(message.to_string())
    }

    /// The collaborator's own message when it sent one, otherwise this error's text.
    pub fn user_message(&self) -> String {
        let source = match self {
            Self::AddressLoadFailed(e)
            | Self::AddressCreationFailed(e)
            | Self::RateQuoteFailed(e)
            | Self::OrderCreationFailed(e)
            | Self::RecoveryFailed(e)
            | Self::PaymentInitiationFailed(e)
            | Self::CancellationFailed(e) => e.message(),
            _ => None,
        };
        source.map_or_else(|| self.to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_collaborator_text() {
        let declined =
            CheckoutError::PaymentInitiationFailed(ServiceError::Rejected("Card declined".into()));
        assert_eq!(declined.user_message(), "Card declined");

        let timeout = CheckoutError::PaymentInitiationFailed(ServiceError::Transport("timeout".into()));
        assert_eq!(timeout.user_message(), "Failed to initiate payment");
    }

    #[test]
    fn test_invalid_transition_display() {
        let error = CheckoutError::InvalidTransition {
            from: CheckoutStep::Shipping,
            to: CheckoutStep::Processing,
        };
        assert_eq!(error.to_string(), "Cannot move from shipping to processing");
    }
}
