//! Core value types for Climatech.
//!
//! Type-safe wrappers for ids, prices, emails and statuses shared by the
//! storefront and the back-office.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, parse_price_text};
pub use status::*;
