//! Session-stored visitor state.
//!
//! The cart and one-shot flash messages are the only things kept per visitor.
//! A session that fails to load or deserialize yields an empty cart rather
//! than an error page.

use climatech_core::Cart;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session keys.
pub mod session_keys {
    /// The visitor's cart.
    pub const CART: &str = "cart";

    /// One-shot message shown on the next rendered page.
    pub const FLASH: &str = "flash";

    /// Reference of the order awaiting payment.
    pub const PENDING_ORDER: &str = "pending_order";
}

/// Read the cart, or an empty one.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart from session");
            Cart::new()
        }
    }
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session store write fails.
pub async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// A message shown once on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub text: String,
}

impl FlashMessage {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }

    /// CSS modifier for the alert box.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "alert--success",
            FlashKind::Error => "alert--error",
        }
    }
}

/// Queue a flash message. Failures are logged, not surfaced.
pub async fn set_flash(session: &Session, message: FlashMessage) {
    if let Err(e) = session.insert(session_keys::FLASH, message).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending flash message, if any.
pub async fn take_flash(session: &Session) -> Option<FlashMessage> {
    session
        .remove::<FlashMessage>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}
