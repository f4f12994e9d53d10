//! Session-held state for storefront visitors.

pub mod session;

pub use session::{FlashMessage, load_cart, save_cart, session_keys, take_flash, set_flash};
