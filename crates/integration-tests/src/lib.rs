//! Shared helpers for the end-to-end tests.
//!
//! The tests drive the storefront and admin binaries over HTTP and are
//! `#[ignore]`d by default. Start both servers against a backend with seed
//! data, then:
//!
//! ```bash
//! cargo test -p climatech-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - default `http://localhost:3001`
//! - `ADMIN_TEST_EMAIL` / `ADMIN_TEST_PASSWORD` - staff credentials for admin tests

use reqwest::Client;

/// Base URL of the running storefront.
#[must_use]
pub fn storefront_url() -> String {
    env_or("STOREFRONT_BASE_URL", "http://localhost:3000")
}

/// Base URL of the running admin panel.
#[must_use]
pub fn admin_url() -> String {
    env_or("ADMIN_BASE_URL", "http://localhost:3001")
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| default.to_string(), |v| v.trim_end_matches('/').to_string())
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location`.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn client() -> reqwest::Result<Client> {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Staff credentials from the environment, if configured.
#[must_use]
pub fn admin_credentials() -> Option<(String, String)> {
    let email = std::env::var("ADMIN_TEST_EMAIL").ok()?;
    let password = std::env::var("ADMIN_TEST_PASSWORD").ok()?;
    Some((email, password))
}

/// Sign `client` into the admin panel.
///
/// Returns `false` when the panel did not send the staff member to the
/// dashboard.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn admin_login(client: &Client, email: &str, password: &str) -> reqwest::Result<bool> {
    let response = client
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", email), ("password", password)])
        .send()
        .await?;
    Ok(response.status().is_redirection()
        && response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            == Some("/"))
}
