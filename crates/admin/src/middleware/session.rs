//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! stricter security settings than the storefront (SameSite=Strict, 24hr
//! expiry). The session holds the signed-in staff member and their backend
//! session cookie, never the browser.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "ct_admin_session";

/// Schema holding the admin session table.
pub const SESSION_SCHEMA: &str = "admin";

/// Session table name.
pub const SESSION_TABLE: &str = "session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Session store in the `admin` schema.
///
/// # Panics
///
/// Panics if the schema name or table name is invalid (never happens with the
/// constants above).
#[must_use]
pub fn session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
        .with_schema_name(SESSION_SCHEMA)
        .expect("valid schema name")
        .with_table_name(SESSION_TABLE)
        .expect("valid table name")
}

/// Create the session layer with `PostgreSQL` store.
///
/// The `admin.session` table is created by `ct-cli migrate admin`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore> {
    SessionManagerLayer::new(session_store(pool))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
