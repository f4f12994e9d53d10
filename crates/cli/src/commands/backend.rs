//! Business backend checks.

use climatech_admin::api::ApiClient;

use super::CommandError;

/// Ping the REST API at `API_BASE_URL`.
///
/// Any answer below 500 counts as reachable; the request is unauthenticated.
///
/// # Errors
///
/// Returns an error if the URL is missing, the request fails, or the backend
/// answers with a server error.
pub async fn check() -> Result<(), CommandError> {
    dotenvy::dotenv().ok();
    let base_url =
        std::env::var("API_BASE_URL").map_err(|_| CommandError::MissingEnvVar("API_BASE_URL"))?;

    tracing::info!(api = %base_url, "Pinging backend...");
    let status = ApiClient::new(&base_url).ping().await?;
    if status.is_server_error() {
        return Err(CommandError::BackendStatus(status.as_u16()));
    }

    tracing::info!(%status, "Backend reachable");
    Ok(())
}
