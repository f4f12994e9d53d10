//! Client for the Climatech business REST API, acting as a signed-in staff
//! member.
//!
//! The backend authenticates with a session cookie. [`ApiClient::login`]
//! captures the `Set-Cookie` values into a [`BackendSession`] that is kept in
//! the admin's own server-side session; [`ApiClient::as_user`] then returns an
//! [`AuthorizedApi`] that forwards that cookie on every call.

mod reorder;
mod resources;
mod session;

use std::sync::Arc;
use std::time::Duration;

use climatech_core::records::User;
use reqwest::header::{COOKIE, SET_COOKIE};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

pub use reorder::ReorderReport;
pub use session::BackendSession;

/// Errors from the business API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend session missing, expired or lacking permission.
    #[error("Not authorized")]
    Unauthorized,

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl ApiError {
    /// Whether the backend rejected the input (4xx), so its message can be
    /// shown back to staff.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status >= 400 && *status < 500)
    }

    /// Message suitable for a flash banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { body, .. } if self.is_client_error() => body.clone(),
            Self::Unauthorized => "Tu sesión expiró, vuelve a iniciar sesión".to_string(),
            Self::NotFound(_) => "El registro ya no existe".to_string(),
            Self::RateLimited(_) => "Demasiadas solicitudes, intenta en un momento".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::Status { .. } => {
                "El servidor de datos no respondió, intenta más tarde".to_string()
            }
        }
    }
}

/// Credentials posted to `/api/auth/login`.
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// The backend answers login with either `{"user": {...}}` or the user itself.
#[derive(Deserialize)]
#[serde(untagged)]
enum LoginResponse {
    Wrapped { user: User },
    Bare(User),
}

impl From<LoginResponse> for User {
    fn from(response: LoginResponse) -> Self {
        match response {
            LoginResponse::Wrapped { user } | LoginResponse::Bare(user) => user,
        }
    }
}

/// Client for the business REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `https://api.climatech.co`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("climatech-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Sign in with staff credentials.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for wrong credentials, or
    /// `ApiError::Status` if the backend set no session cookie.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, BackendSession), ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let session = BackendSession::from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        let user: LoginResponse = decode(response, "login").await?;
        let session = session.ok_or_else(|| ApiError::Status {
            status: 502,
            body: "login response carried no session cookie".to_string(),
        })?;

        Ok((user.into(), session))
    }

    /// Calls made on behalf of a signed-in staff member.
    #[must_use]
    pub const fn as_user<'a>(&'a self, session: &'a BackendSession) -> AuthorizedApi<'a> {
        AuthorizedApi {
            client: self,
            session,
        }
    }

    /// Unauthenticated health check used by readiness checks and the CLI.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable.
    pub async fn ping(&self) -> Result<reqwest::StatusCode, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url("/api/content/slide"))
            .send()
            .await?;
        Ok(response.status())
    }
}

/// An [`ApiClient`] bound to a staff member's backend session.
#[derive(Clone, Copy)]
pub struct AuthorizedApi<'a> {
    client: &'a ApiClient,
    session: &'a BackendSession,
}

impl AuthorizedApi<'_> {
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .inner
            .client
            .request(method, self.client.url(path))
            .header(COOKIE, self.session.cookie().expose_secret())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        decode(response, path).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(method, path).json(body).send().await?;
        decode(response, path).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(reqwest::Method::POST, path, body).await
    }

    async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(reqwest::Method::PUT, path, body).await
    }

    /// Send a request whose response body is ignored.
    async fn execute(&self, builder: reqwest::RequestBuilder, path: &str) -> Result<(), ApiError> {
        let response = builder.send().await?;
        check_status(&response, path)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status,
                body: error_message(&body),
            });
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.request(reqwest::Method::DELETE, path), path)
            .await
    }

    /// End the backend session. The local session is cleared regardless.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the call.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.execute(self.request(reqwest::Method::POST, "/api/auth/logout"), "logout")
            .await
    }
}

/// Map the statuses every endpoint shares onto `ApiError`.
fn check_status(response: &reqwest::Response, what: &str) -> Result<(), ApiError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(what.to_string()));
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ApiError::RateLimited(retry_after));
    }
    Ok(())
}

/// Check the status and decode the JSON body.
async fn decode<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T, ApiError> {
    check_status(&response, what)?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Backend returned non-success status"
        );
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: error_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(String::from))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    /// Serve `router` on an ephemeral port and return its base URL.
    pub(crate) async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Reject requests that lack the test session cookie.
    pub(crate) fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|c| c.contains("sid=abc"))
    }

    pub(crate) fn session() -> BackendSession {
        BackendSession::new("sid=abc")
    }

    #[tokio::test]
    async fn test_login_captures_cookie_and_user() {
        let router = Router::new().route(
            "/api/auth/login",
            post(|Json(body): Json<serde_json::Value>| async move {
                if body["password"] == "secreto" {
                    (
                        [("set-cookie", "sid=abc; Path=/; HttpOnly")],
                        Json(json!({"user": {
                            "id": 1, "name": "Ana", "email": "ana@climatech.co", "role": "admin"
                        }})),
                    )
                        .into_response()
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"message": "Credenciales inválidas"})))
                        .into_response()
                }
            }),
        );
        let client = ApiClient::new(&spawn(router).await);

        let (user, session) = client.login("ana@climatech.co", "secreto").await.unwrap();
        assert_eq!(user.name, "Ana");
        assert_eq!(session.cookie().expose_secret(), "sid=abc");

        let wrong = client.login("ana@climatech.co", "otra").await;
        assert!(matches!(wrong, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_without_cookie_is_an_error() {
        let router = Router::new().route(
            "/api/auth/login",
            post(|| async {
                Json(json!({"id": 1, "name": "Ana", "email": "ana@climatech.co", "role": "admin"}))
            }),
        );
        let client = ApiClient::new(&spawn(router).await);
        assert!(matches!(
            client.login("ana@climatech.co", "secreto").await,
            Err(ApiError::Status { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_unauthorized() {
        let router = Router::new().route(
            "/api/admin/users",
            get(|| async { StatusCode::FORBIDDEN }),
        );
        let client = ApiClient::new(&spawn(router).await);
        let session = session();
        assert!(matches!(
            client.as_user(&session).list_users().await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_user_message_hides_server_details() {
        let server = ApiError::Status {
            status: 500,
            body: "stack trace".into(),
        };
        assert!(!server.user_message().contains("stack"));

        let invalid = ApiError::Status {
            status: 422,
            body: "El correo ya existe".into(),
        };
        assert_eq!(invalid.user_message(), "El correo ya existe");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(r#"{"error":"bad"}"#), "bad");
        assert_eq!(error_message("plain text"), "plain text");
    }
}
