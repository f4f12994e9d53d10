//! Session-stored staff identity and flash messages.

use climatech_core::UserRole;
use climatech_core::records::User;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::BackendSession;

/// The signed-in staff member.
///
/// Carries the backend session cookie so every request can call the API on
/// the user's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub user: User,
    pub backend: BackendSession,
}

impl CurrentAdmin {
    /// Whether the user may manage other users.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.role == UserRole::Admin
    }
}

/// Session keys for admin data.
pub mod session_keys {
    /// The signed-in staff member.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// One-shot message shown on the next rendered page.
    pub const FLASH: &str = "flash";
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::ExposeSecret;
    use serde_json::json;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn admin(role: &str) -> CurrentAdmin {
        CurrentAdmin {
            user: serde_json::from_value(json!({
                "id": 1, "name": "Ana", "email": "ana@climatech.co", "role": role
            }))
            .unwrap(),
            backend: BackendSession::new("sid=abc"),
        }
    }

    #[tokio::test]
    async fn test_current_admin_roundtrip_keeps_cookie() {
        let session = session();
        session
            .insert(session_keys::CURRENT_ADMIN, admin("manager"))
            .await
            .unwrap();

        let stored: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.user.name, "Ana");
        assert_eq!(stored.backend.cookie().expose_secret(), "sid=abc");
        assert!(!stored.is_admin());
        assert!(admin("admin").is_admin());
    }

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = session();
        set_flash(&session, FlashMessage::error("Falló")).await;
        let flash = take_flash(&session).await.unwrap();
        assert_eq!(flash.css_class(), "alert--error");
        assert_eq!(take_flash(&session).await, None);
    }
}
