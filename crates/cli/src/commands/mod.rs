//! CLI command implementations.

pub mod backend;
pub mod migrate;

use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] climatech_admin::api::ApiError),

    #[error("Backend answered {0}")]
    BackendStatus(u16),
}

/// Read `primary`, falling back to `DATABASE_URL`.
pub(crate) fn database_url(primary: &'static str) -> Result<secrecy::SecretString, CommandError> {
    dotenvy::dotenv().ok();
    std::env::var(primary)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(secrecy::SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar(primary))
}
