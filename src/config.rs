//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKOUT_STORE_ID` - Store the session checks out against
//! - `CHECKOUT_RETURN_URL` - Page the payment gateway sends the shopper back to
//! - `CHECKOUT_ORIGIN_CITY`, `CHECKOUT_ORIGIN_STATE`, `CHECKOUT_ORIGIN_COUNTRY` - Ship-from address
//!
//! ## Optional
//! - `CHECKOUT_ORIGIN_LINE1`, `CHECKOUT_ORIGIN_POSTAL_CODE`
//! - `CHECKOUT_PARCEL_WEIGHT_GRAMS` (default: 1000)
//! - `CHECKOUT_PARCEL_LENGTH_CM` / `_WIDTH_CM` / `_HEIGHT_CM` (default: 30 / 20 / 10)
//! - `CHECKOUT_RECOVERY_KEY` - Recovery slot key (default: `pending_order`)
//! - `CHECKOUT_COMMAND_BUFFER` - Per-store command queue depth (default: 32)

use crate::model::{ParcelProfile, ShippingAddress, StoreId};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub const DEFAULT_RECOVERY_KEY: &str = "pending_order";
pub const DEFAULT_COMMAND_BUFFER: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Store-wide settings shared by every checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub store_id: StoreId,
    /// Fixed ship-from address used for every quote.
    pub origin: ShippingAddress,
    pub parcel: ParcelProfile,
    /// Base of the URL the gateway returns to; `?order=<number>` is appended.
    pub return_url: Url,
    pub recovery_key: String,
    pub command_buffer: usize,
}

impl CheckoutConfig {
    /// Settings with defaults for everything but the store, origin and return URL.
    pub fn new(store_id: impl Into<StoreId>, origin: ShippingAddress, return_url: Url) -> Self {
        Self {
            store_id: store_id.into(),
            origin,
            parcel: ParcelProfile::default(),
            return_url,
            recovery_key: DEFAULT_RECOVERY_KEY.to_string(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let origin = ShippingAddress {
            line1: vars.optional("CHECKOUT_ORIGIN_LINE1").unwrap_or_default(),
            city: Some(vars.required("CHECKOUT_ORIGIN_CITY")?),
            state: Some(vars.required("CHECKOUT_ORIGIN_STATE")?),
            country: vars.required("CHECKOUT_ORIGIN_COUNTRY")?,
            postal_code: vars.optional("CHECKOUT_ORIGIN_POSTAL_CODE"),
            ..Default::default()
        };
        let defaults = ParcelProfile::default();
        let parcel = ParcelProfile {
            weight_grams: vars.parsed("CHECKOUT_PARCEL_WEIGHT_GRAMS", defaults.weight_grams)?,
            length_cm: vars.parsed("CHECKOUT_PARCEL_LENGTH_CM", defaults.length_cm)?,
            width_cm: vars.parsed("CHECKOUT_PARCEL_WIDTH_CM", defaults.width_cm)?,
            height_cm: vars.parsed("CHECKOUT_PARCEL_HEIGHT_CM", defaults.height_cm)?,
        };
        let return_url = Url::parse(&vars.required("CHECKOUT_RETURN_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("CHECKOUT_RETURN_URL".to_string(), e.to_string())
        })?;
        let command_buffer = vars.parsed("CHECKOUT_COMMAND_BUFFER", DEFAULT_COMMAND_BUFFER)?;
        if command_buffer == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_COMMAND_BUFFER".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            store_id: StoreId::new(vars.required("CHECKOUT_STORE_ID")?),
            origin,
            parcel,
            return_url,
            recovery_key: vars
                .optional("CHECKOUT_RECOVERY_KEY")
                .unwrap_or_else(|| DEFAULT_RECOVERY_KEY.to_string()),
            command_buffer,
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Unset and blank are treated the same.
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.optional(name)
            .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
            None => Ok(default),
        }
    }
}
