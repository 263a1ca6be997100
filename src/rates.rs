//! Shipping rate resolution against the store's fixed origin and parcel.

use crate::model::{ParcelProfile, RateQuoteRequest, ShippingAddress, ShippingRate};
use crate::services::{RateService, ServiceError};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Result of asking the resolver for rates.
#[derive(Debug, Clone, PartialEq)]
pub enum RateResolution {
    /// The destination lacks a city or state; no request was made.
    Skipped,
    /// The rate service answered. `default` is the first entry, if any.
    Quoted {
        rates: Vec<ShippingRate>,
        default: Option<ShippingRate>,
    },
}

/// Maps a destination address to the rate service's ranked options.
///
/// The resolver does not re-sort: ranking belongs to the rate service.
#[derive(Clone)]
pub struct ShippingRateResolver {
    service: Arc<dyn RateService>,
    origin: ShippingAddress,
    parcel: ParcelProfile,
}

impl ShippingRateResolver {
    pub fn new(service: Arc<dyn RateService>, origin: ShippingAddress, parcel: ParcelProfile) -> Self {
        Self {
            service,
            origin,
            parcel,
        }
    }

    #[instrument(skip(self, destination), fields(address_id = ?destination.id))]
    pub async fn resolve(&self, destination: &ShippingAddress) -> Result<RateResolution, ServiceError> {
        if !destination.is_quotable() {
            debug!("Destination missing city or state, skipping quote");
            return Ok(RateResolution::Skipped);
        }

        let request = RateQuoteRequest {
            origin: self.origin.clone(),
            destination: destination.clone(),
            parcel: self.parcel,
            address_id: destination.id.clone(),
        };
        let rates = self.service.quote(request).await?;
        debug!(count = rates.len(), "Rates quoted");
        let default = rates.first().cloned();
        Ok(RateResolution::Quoted { rates, default })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressId, Money};
    use crate::services::mock::MockRateService;

    fn rate(code: &str, minor: i64) -> ShippingRate {
        ShippingRate {
            code: code.into(),
            carrier: "DHL".into(),
            service_name: code.into(),
            prices: vec![Money::from_minor(minor, "USD")],
            estimated_days: Some(3),
        }
    }

    fn destination(city: Option<&str>, state: Option<&str>) -> ShippingAddress {
        ShippingAddress {
            id: Some(AddressId::new("addr_9")),
            city: city.map(Into::into),
            state: state.map(Into::into),
            country: "NG".into(),
            ..Default::default()
        }
    }

    fn resolver(service: Arc<MockRateService>) -> ShippingRateResolver {
        ShippingRateResolver::new(service, ShippingAddress::default(), ParcelProfile::default())
    }

    #[tokio::test]
    async fn test_no_request_without_city_or_state() {
        let service = Arc::new(MockRateService::new());
        let resolver = resolver(service.clone());

        let no_city = resolver.resolve(&destination(None, Some("LA"))).await.unwrap();
        let no_state = resolver.resolve(&destination(Some("Ikeja"), Some(""))).await.unwrap();

        assert_eq!(no_city, RateResolution::Skipped);
        assert_eq!(no_state, RateResolution::Skipped);
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_first_rate_is_default_and_order_is_kept() {
        let service = Arc::new(MockRateService::new());
        service.expect().return_ok(vec![rate("express", 2500), rate("standard", 900)]);
        let resolver = resolver(service.clone());

        let resolution = resolver
            .resolve(&destination(Some("Ikeja"), Some("LA")))
            .await
            .unwrap();

        match resolution {
            RateResolution::Quoted { rates, default } => {
                assert_eq!(rates[0].code, "express");
                assert_eq!(rates[1].code, "standard");
                assert_eq!(default.unwrap().code, "express");
            }
            RateResolution::Skipped => panic!("Expected a quote"),
        }
        let sent = &service.calls()[0];
        assert_eq!(sent.address_id, Some(AddressId::new("addr_9")));
        assert_eq!(sent.parcel, ParcelProfile::default());
        service.verify();
    }
}
