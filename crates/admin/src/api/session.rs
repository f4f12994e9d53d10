//! Backend session cookie held on behalf of a signed-in staff member.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The `Cookie` header value that authenticates calls to the backend.
///
/// Stored inside the admin's server-side session (never sent to the
/// browser), so it serializes in clear to the session store while `Debug`
/// stays redacted.
#[derive(Clone)]
pub struct BackendSession {
    cookie: SecretString,
}

impl BackendSession {
    /// Wrap a ready-made `Cookie` header value (`name=value; other=value`).
    #[must_use]
    pub fn new(cookie: &str) -> Self {
        Self {
            cookie: SecretString::from(cookie),
        }
    }

    /// Build the `Cookie` header from `Set-Cookie` header values, keeping
    /// only each `name=value` pair. `None` when nothing usable was set.
    pub fn from_set_cookie<'a>(headers: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let pairs: Vec<&str> = headers
            .into_iter()
            .filter_map(|header| header.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.split_once('=').is_some_and(|(name, _)| !name.is_empty()))
            .collect();

        (!pairs.is_empty()).then(|| Self::new(&pairs.join("; ")))
    }

    /// The header value to forward.
    #[must_use]
    pub const fn cookie(&self) -> &SecretString {
        &self.cookie
    }
}

impl std::fmt::Debug for BackendSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSession")
            .field("cookie", &"[REDACTED]")
            .finish()
    }
}

impl Serialize for BackendSession {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.cookie.expose_secret())
    }
}

impl<'de> Deserialize<'de> for BackendSession {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cookie = String::deserialize(deserializer)?;
        Ok(Self {
            cookie: SecretString::from(cookie),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_set_cookie_keeps_name_value_pairs() {
        let session = BackendSession::from_set_cookie([
            "sid=abc; Path=/; HttpOnly; SameSite=Lax",
            "csrf=xyz; Path=/",
        ])
        .unwrap();
        assert_eq!(session.cookie().expose_secret(), "sid=abc; csrf=xyz");
    }

    #[test]
    fn test_from_set_cookie_ignores_garbage() {
        assert!(BackendSession::from_set_cookie(["; Path=/", "=nameless"]).is_none());
        assert!(BackendSession::from_set_cookie(std::iter::empty()).is_none());
    }

    #[test]
    fn test_debug_is_redacted_but_store_round_trips() {
        let session = BackendSession::new("sid=abc");
        assert!(!format!("{session:?}").contains("abc"));

        let stored = serde_json::to_string(&session).unwrap();
        let restored: BackendSession = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored.cookie().expose_secret(), "sid=abc");
    }
}
