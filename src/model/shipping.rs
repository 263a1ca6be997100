use crate::model::{AddressId, Money, ShippingAddress};
use serde::{Deserialize, Serialize};

/// A carrier-quoted shipping option.
///
/// Immutable once quoted; it belongs to the origin, destination and parcel that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRate {
    pub code: String,
    pub carrier: String,
    pub service_name: String,
    pub prices: Vec<Money>,
    pub estimated_days: Option<u32>,
}

impl ShippingRate {
    /// The first price tier is the one that gets charged.
    pub fn chargeable_price(&self) -> Option<&Money> {
        self.prices.first()
    }
}

/// Weight (grams) and dimensions (centimetres) of the store's standard parcel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParcelProfile {
    pub weight_grams: u32,
    pub length_cm: u32,
    pub width_cm: u32,
    pub height_cm: u32,
}

impl Default for ParcelProfile {
    fn default() -> Self {
        Self {
            weight_grams: 1000,
            length_cm: 30,
            width_cm: 20,
            height_cm: 10,
        }
    }
}

/// Input to [`RateService::quote`](crate::services::RateService::quote).
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuoteRequest {
    pub origin: ShippingAddress,
    pub destination: ShippingAddress,
    pub parcel: ParcelProfile,
    pub address_id: Option<AddressId>,
}
