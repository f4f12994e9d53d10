//! Newtype IDs for records owned by the backend API.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers so a product id
//! can never be passed where an order id is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>`, `Into<i64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use climatech_core::define_id;
/// define_id!(QuoteId);
/// define_id!(InvoiceId);
///
/// let quote = QuoteId::new(1);
/// assert_eq!(quote.to_string(), "1");
/// assert_eq!("7".parse::<InvoiceId>().unwrap(), InvoiceId::new(7));
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ContentId);
define_id!(CustomerId);
define_id!(UserId);
define_id!(OrderId);
define_id!(AppointmentId);
define_id!(TechnicianId);
define_id!(OptionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_number() {
        let id = ContentId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: ContentId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_from_str_trims() {
        assert_eq!(" 9 ".parse::<OrderId>().unwrap(), OrderId::new(9));
        assert!("abc".parse::<OrderId>().is_err());
    }
}
