//! Session middleware configuration.
//!
//! Visitor sessions live in `PostgreSQL` via tower-sessions and carry the
//! cart, so it survives browser restarts for a week of inactivity.

use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ct_session";

/// Inactivity expiry (7 days).
const SESSION_EXPIRY_DAYS: i64 = 7;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by `ct-cli migrate storefront`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_secure(config.base_url.starts_with("https://"))
        // Lax so the session survives the redirect back from Wompi.
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
