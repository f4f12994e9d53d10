//! Session table migrations.
//!
//! Both binaries keep only their sessions in `PostgreSQL`; every business
//! record lives behind the REST API. These commands create the session
//! tables ahead of the first deploy.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront database (falls back to `DATABASE_URL`)
//! - `ADMIN_DATABASE_URL` - admin database (falls back to `DATABASE_URL`)

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, database_url};

/// Create `tower_sessions.session` for visitor sessions.
///
/// # Errors
///
/// Returns an error if the URL is missing or the database rejects the DDL.
pub async fn storefront() -> Result<(), CommandError> {
    let url = database_url("STOREFRONT_DATABASE_URL")?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(url.expose_secret()).await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront session table ready");
    Ok(())
}

/// Create `admin.session` for staff sessions.
///
/// # Errors
///
/// Returns an error if the URL is missing or the database rejects the DDL.
pub async fn admin() -> Result<(), CommandError> {
    let url = database_url("ADMIN_DATABASE_URL")?;

    tracing::info!("Connecting to admin database...");
    let pool = PgPool::connect(url.expose_secret()).await?;

    tracing::info!("Creating admin session table...");
    climatech_admin::middleware::session::session_store(&pool)
        .migrate()
        .await?;

    tracing::info!("Admin session table ready");
    Ok(())
}
