//! Newtype identifiers for type-safe references.
//!
//! Every identifier assigned by a remote service is opaque to this crate, so they
//! all wrap a `String`. Use [`define_id!`](crate::define_id) to add one.

/// Defines a string-backed identifier newtype.
///
/// Creates a wrapper with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_str()`, `Display` and `From<&str>`/`From<String>`
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(StoreId);
define_id!(SessionId);
define_id!(CartId);
define_id!(CartItemId);
define_id!(ProductId);
define_id!(AddressId);
define_id!(OrderId);
define_id!(UserId);
