//! Session-held state for signed-in staff.

pub mod session;

pub use session::{CurrentAdmin, FlashKind, FlashMessage, session_keys, set_flash, take_flash};
