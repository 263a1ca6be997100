//! Checkout state and its synchronous transitions.
//!
//! Everything here is pure: no collaborator is called. The async sequences in
//! [`super::entity`] call these to change state, so guards are enforced in one
//! place.

use super::error::CheckoutError;
use crate::model::{
    Cart, CartId, CurrencyCode, Order, OrderId, ShippingAddress, ShippingRate, UserId,
};
use rust_decimal::Decimal;
use std::fmt::Display;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Processing,
}

impl Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Shipping => "shipping",
            Self::Payment => "payment",
            Self::Processing => "processing",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletedSteps {
    pub shipping: bool,
    pub payment: bool,
}

/// What an order is placed for. An attempt only covers one set of inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptInputs {
    pub shipping_address: ShippingAddress,
    pub rate_code: String,
    pub cart_id: CartId,
    /// Cart total plus shipping, in `currency`.
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

impl AttemptInputs {
    pub fn new(shipping_address: &ShippingAddress, rate: &ShippingRate, cart: &Cart, amount: Decimal) -> Self {
        Self {
            shipping_address: shipping_address.clone(),
            rate_code: rate.code.clone(),
            cart_id: cart.id.clone(),
            amount,
            currency: cart.currency.clone(),
        }
    }
}

/// One logical "place order" attempt. Retries with the same inputs reuse it and
/// its key.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutAttempt {
    pub id: String,
    pub idempotency_key: String,
    pub inputs: AttemptInputs,
    /// Set once the order service has answered for this key.
    pub order_id: Option<OrderId>,
}

impl CheckoutAttempt {
    pub fn new(id: impl Into<String>, user_id: &UserId, inputs: AttemptInputs) -> Self {
        let id = id.into();
        let idempotency_key = format!("checkout-{id}-{user_id}");
        Self {
            id,
            idempotency_key,
            inputs,
            order_id: None,
        }
    }
}

/// The orchestrator's state. Lost when the page goes away; only
/// `created_order` survives, through the recovery slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutState {
    pub step: CheckoutStep,
    pub shipping_address: Option<ShippingAddress>,
    pub billing_address: Option<ShippingAddress>,
    pub use_same_address: bool,
    pub saved_addresses: Vec<ShippingAddress>,
    pub shipping_rates: Vec<ShippingRate>,
    pub selected_shipping_rate: Option<ShippingRate>,
    pub loading: bool,
    pub placing_order: bool,
    pub error: Option<String>,
    pub created_order: Option<Order>,
    pub attempt: Option<CheckoutAttempt>,
    /// Set once the gateway has handed back a URL to leave for.
    pub payment_redirect: Option<Url>,
}

impl Default for CheckoutState {
    fn default() -> Self {
        Self {
            step: CheckoutStep::Shipping,
            shipping_address: None,
            billing_address: None,
            use_same_address: true,
            saved_addresses: Vec::new(),
            shipping_rates: Vec::new(),
            selected_shipping_rate: None,
            loading: false,
            placing_order: false,
            error: None,
            created_order: None,
            attempt: None,
            payment_redirect: None,
        }
    }
}

impl CheckoutState {
    // --- Derived values ---

    pub fn completed_steps(&self) -> CompletedSteps {
        CompletedSteps {
            shipping: self.shipping_address.is_some() && self.selected_shipping_rate.is_some(),
            payment: matches!(self.step, CheckoutStep::Payment | CheckoutStep::Processing),
        }
    }

    pub fn can_proceed_to_payment(&self) -> bool {
        self.shipping_address.is_some()
            && self.selected_shipping_rate.is_some()
            && self.billing_address.is_some()
    }

    /// Cart total plus the selected rate's chargeable price.
    ///
    /// Fails when the rate was quoted in a different currency than the cart is
    /// priced in.
    pub fn total_with_shipping(&self, cart: &Cart) -> Result<Decimal, CheckoutError> {
        let Some(price) = self
            .selected_shipping_rate
            .as_ref()
            .and_then(ShippingRate::chargeable_price)
        else {
            return Ok(cart.total_amount);
        };
        if price.currency != cart.currency {
            return Err(CheckoutError::CurrencyMismatch {
                rate: price.currency.clone(),
                cart: cart.currency.clone(),
            });
        }
        Ok(cart.total_amount + price.amount)
    }

    // --- Transitions ---

    /// Selecting a new destination invalidates the chosen rate.
    pub fn select_shipping_address(&mut self, address: ShippingAddress) {
        if self.use_same_address {
            self.billing_address = Some(address.clone());
        }
        if self.shipping_address.as_ref() != Some(&address) {
            self.selected_shipping_rate = None;
        }
        self.shipping_address = Some(address);
    }

    pub fn select_billing_address(&mut self, address: ShippingAddress) {
        self.use_same_address = false;
        self.billing_address = Some(address);
    }

    pub fn set_use_same_address(&mut self, same: bool) {
        self.use_same_address = same;
        if same {
            self.billing_address = self.shipping_address.clone();
        }
    }

    pub fn select_shipping_rate(&mut self, code: &str) -> Result<(), CheckoutError> {
        let rate = self
            .shipping_rates
            .iter()
            .find(|rate| rate.code == code)
            .cloned()
            .ok_or_else(|| CheckoutError::UnknownRate(code.to_string()))?;
        self.selected_shipping_rate = Some(rate);
        Ok(())
    }

    pub fn proceed_to_payment(&mut self) -> Result<(), CheckoutError> {
        if self.step != CheckoutStep::Shipping {
            return Err(CheckoutError::InvalidTransition {
                from: self.step,
                to: CheckoutStep::Payment,
            });
        }
        if self.shipping_address.is_none() || self.selected_shipping_rate.is_none() {
            return Err(CheckoutError::incomplete("Incomplete shipping information"));
        }
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    pub fn back_to_shipping(&mut self) -> Result<(), CheckoutError> {
        if self.step == CheckoutStep::Processing {
            return Err(CheckoutError::InvalidTransition {
                from: self.step,
                to: CheckoutStep::Shipping,
            });
        }
        self.step = CheckoutStep::Shipping;
        Ok(())
    }

    /// Checks the place-order guards and returns what the sequence needs.
    pub fn ready_to_place(&self) -> Result<(ShippingAddress, ShippingRate), CheckoutError> {
        if self.payment_redirect.is_some() {
            return Err(CheckoutError::AlreadyHandedOff);
        }
        if self.placing_order {
            return Err(CheckoutError::Busy);
        }
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::InvalidTransition {
                from: self.step,
                to: CheckoutStep::Processing,
            });
        }
        let (Some(address), Some(rate)) = (&self.shipping_address, &self.selected_shipping_rate)
        else {
            return Err(CheckoutError::incomplete("Incomplete shipping information"));
        };
        if self.billing_address.is_none() {
            return Err(CheckoutError::incomplete("Billing address is required"));
        }
        if rate.chargeable_price().is_none() {
            return Err(CheckoutError::incomplete("Selected shipping rate has no price"));
        }
        Ok((address.clone(), rate.clone()))
    }

    /// The current attempt when it was placed with other inputs than these.
    pub fn superseded_attempt(&self, inputs: &AttemptInputs) -> Option<&CheckoutAttempt> {
        self.attempt.as_ref().filter(|attempt| &attempt.inputs != inputs)
    }

    /// Returns the attempt for `inputs`, minting one if there is none or the
    /// current one was placed with different inputs.
    pub fn begin_attempt(
        &mut self,
        inputs: AttemptInputs,
        next_id: impl FnOnce() -> String,
        user_id: &UserId,
    ) -> CheckoutAttempt {
        match &self.attempt {
            Some(attempt) if attempt.inputs == inputs => attempt.clone(),
            _ => {
                let attempt = CheckoutAttempt::new(next_id(), user_id, inputs);
                self.attempt = Some(attempt.clone());
                attempt
            }
        }
    }

    /// Records a persisted shipping address in place of the unsaved one.
    ///
    /// The current attempt follows it, so a retry with nothing changed still
    /// matches.
    pub fn adopt_persisted_address(&mut self, address: ShippingAddress) {
        if self.use_same_address {
            self.billing_address = Some(address.clone());
        }
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.inputs.shipping_address = address.clone();
        }
        self.saved_addresses.push(address.clone());
        self.shipping_address = Some(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressId, Money};

    fn address(id: Option<&str>) -> ShippingAddress {
        ShippingAddress {
            id: id.map(AddressId::new),
            line1: "1 Marina".into(),
            city: Some("Lagos".into()),
            state: Some("LA".into()),
            country: "NG".into(),
            ..Default::default()
        }
    }

    fn rate(code: &str, minor: i64) -> ShippingRate {
        ShippingRate {
            code: code.into(),
            carrier: "GIG".into(),
            service_name: code.into(),
            prices: vec![Money::from_minor(minor, "USD"), Money::from_minor(minor * 2, "USD")],
            estimated_days: None,
        }
    }

    fn ready_state() -> CheckoutState {
        let mut state = CheckoutState {
            shipping_rates: vec![rate("std", 500)],
            ..Default::default()
        };
        state.select_shipping_address(address(Some("addr_1")));
        state.select_shipping_rate("std").unwrap();
        state
    }

    #[test]
    fn test_can_proceed_requires_all_three_selections() {
        let mut state = CheckoutState {
            use_same_address: false,
            shipping_rates: vec![rate("std", 500)],
            ..Default::default()
        };
        assert!(!state.can_proceed_to_payment());

        state.select_shipping_address(address(None));
        state.select_shipping_rate("std").unwrap();
        assert!(!state.can_proceed_to_payment());

        state.select_billing_address(address(None));
        assert!(state.can_proceed_to_payment());

        state.selected_shipping_rate = None;
        assert!(!state.can_proceed_to_payment());
    }

    #[test]
    fn test_proceed_to_payment_guard() {
        let mut state = CheckoutState::default();
        let error = state.proceed_to_payment().unwrap_err();
        assert_eq!(error.to_string(), "Incomplete shipping information");
        assert_eq!(state.step, CheckoutStep::Shipping);

        let mut state = ready_state();
        state.proceed_to_payment().unwrap();
        assert_eq!(state.step, CheckoutStep::Payment);
        assert_eq!(
            state.completed_steps(),
            CompletedSteps {
                shipping: true,
                payment: true
            }
        );
    }

    #[test]
    fn test_new_address_clears_selected_rate() {
        let mut state = ready_state();
        let mut other = address(Some("addr_2"));
        other.city = Some("Abuja".into());
        state.select_shipping_address(other.clone());

        assert!(state.selected_shipping_rate.is_none());
        assert_eq!(state.billing_address, Some(other));
        assert_eq!(state.shipping_rates.len(), 1);
    }

    fn cart(minor: i64, currency: &str) -> Cart {
        Cart {
            id: CartId::new("cart_1"),
            items: Vec::new(),
            total_amount: Decimal::new(minor, 2),
            currency: CurrencyCode::new(currency),
        }
    }

    #[test]
    fn test_total_with_shipping_uses_first_tier() {
        let state = ready_state();
        assert_eq!(
            state.total_with_shipping(&cart(2000, "USD")),
            Ok(Decimal::new(2500, 2))
        );
    }

    #[test]
    fn test_total_with_shipping_refuses_mixed_currencies() {
        let state = ready_state();
        assert_eq!(
            state.total_with_shipping(&cart(3600, "EUR")),
            Err(CheckoutError::CurrencyMismatch {
                rate: CurrencyCode::new("USD"),
                cart: CurrencyCode::new("EUR"),
            })
        );

        let no_rate = CheckoutState::default();
        assert_eq!(
            no_rate.total_with_shipping(&cart(3600, "EUR")),
            Ok(Decimal::new(3600, 2))
        );
    }

    #[test]
    fn test_attempt_is_reused_only_for_the_same_inputs() {
        let mut state = ready_state();
        let user = UserId::new("user_1");
        let shipping = state.shipping_address.clone().unwrap();
        let inputs = AttemptInputs::new(&shipping, &rate("std", 500), &cart(2000, "USD"), Decimal::new(2500, 2));

        let first = state.begin_attempt(inputs.clone(), || "a1".into(), &user);
        assert_eq!(first.idempotency_key, "checkout-a1-user_1");
        assert!(state.superseded_attempt(&inputs).is_none());
        assert_eq!(state.begin_attempt(inputs.clone(), || "a2".into(), &user), first);

        let changed = AttemptInputs::new(&shipping, &rate("express", 1500), &cart(3250, "USD"), Decimal::new(4750, 2));
        assert_eq!(state.superseded_attempt(&changed), Some(&first));
        let second = state.begin_attempt(changed, || "a2".into(), &user);
        assert_eq!(second.idempotency_key, "checkout-a2-user_1");
        assert_eq!(second.inputs.rate_code, "express");
    }

    #[test]
    fn test_persisted_address_keeps_attempt_matching() {
        let mut state = ready_state();
        let user = UserId::new("user_1");
        let unsaved = address(None);
        let std = rate("std", 500);
        let inputs = AttemptInputs::new(&unsaved, &std, &cart(2000, "USD"), Decimal::new(2500, 2));
        state.begin_attempt(inputs, || "a1".into(), &user);

        let saved = address(Some("addr_9"));
        state.adopt_persisted_address(saved.clone());

        let retry = AttemptInputs::new(&saved, &std, &cart(2000, "USD"), Decimal::new(2500, 2));
        assert!(state.superseded_attempt(&retry).is_none());
    }

    #[test]
    fn test_ready_to_place_requires_payment_step_and_billing() {
        let mut state = ready_state();
        assert!(matches!(
            state.ready_to_place(),
            Err(CheckoutError::InvalidTransition { .. })
        ));

        state.proceed_to_payment().unwrap();
        state.set_use_same_address(false);
        state.billing_address = None;
        assert_eq!(
            state.ready_to_place().unwrap_err().to_string(),
            "Billing address is required"
        );

        state.set_use_same_address(true);
        let (shipping, rate) = state.ready_to_place().unwrap();
        assert_eq!(shipping.id, Some(AddressId::new("addr_1")));
        assert_eq!(rate.code, "std");
    }
}
