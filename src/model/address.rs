use crate::model::{AddressId, UserId};
use serde::{Deserialize, Serialize};

/// A shipping or billing address.
///
/// `id` stays `None` until the address repository has persisted it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub id: Option<AddressId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
    pub is_default: bool,
}

impl ShippingAddress {
    /// True when both city and state are present and non-blank.
    ///
    /// Rates are only quoted for addresses that pass this check.
    pub fn is_quotable(&self) -> bool {
        fn present(field: &Option<String>) -> bool {
            field.as_deref().is_some_and(|v| !v.trim().is_empty())
        }
        present(&self.city) && present(&self.state)
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// The shopper on whose behalf checkout runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotable_requires_city_and_state() {
        let mut address = ShippingAddress {
            city: Some("Lagos".into()),
            state: Some("LA".into()),
            ..Default::default()
        };
        assert!(address.is_quotable());

        address.city = Some("   ".into());
        assert!(!address.is_quotable());

        address.city = None;
        assert!(!address.is_quotable());
    }
}
