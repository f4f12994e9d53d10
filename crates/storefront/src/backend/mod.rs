//! Client for the Climatech business REST API.
//!
//! The storefront only reads public content and submits orders and
//! appointment requests. Public reads are cached with `moka` (60 second TTL)
//! so a burst of catalog traffic does not fan out to the backend.

mod cache;

use std::sync::Arc;
use std::time::Duration;

use climatech_core::records::{
    Appointment, NewAppointment, NewOrder, Order, ProductOption, StoreSettings, Technician,
};
use climatech_core::{Content, ContentId, ContentType, Email};
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

pub use cache::{CacheKey, CacheValue};

/// Errors from the backend API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

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

impl BackendError {
    /// Whether the backend rejected the request as invalid (4xx other than
    /// 404/429), so the message is safe to show to the visitor.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status >= 400 && *status < 500)
    }
}

/// Client for the business REST API.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a client for `base_url` (e.g. `https://api.climatech.co`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(60))
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("climatech-storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Check the status and decode the JSON body.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, BackendError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(what.to_string()));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
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
            BackendError::Parse(e)
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        Self::decode(response, path).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        Self::decode(response, path).await
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// List every record of a content type (active and inactive).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(content_type = %content_type))]
    pub async fn list_content(
        &self,
        content_type: ContentType,
    ) -> Result<Vec<Content>, BackendError> {
        let key = CacheKey::ContentList(content_type);
        if let Some(CacheValue::ContentList(items)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for content list");
            return Ok(items);
        }

        let items: Vec<Content> = self
            .get(&format!("/api/content/{}", content_type.as_str()))
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::ContentList(items.clone()))
            .await;
        Ok(items)
    }

    /// Get one content record.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the record does not exist.
    #[instrument(skip(self), fields(content_type = %content_type, id = %id))]
    pub async fn get_content(
        &self,
        content_type: ContentType,
        id: ContentId,
    ) -> Result<Content, BackendError> {
        let key = CacheKey::Content(content_type, id);
        if let Some(CacheValue::Content(item)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for content");
            return Ok(*item);
        }

        let item: Content = self
            .get(&format!("/api/content/{}/{id}", content_type.as_str()))
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Content(Box::new(item.clone())))
            .await;
        Ok(item)
    }

    /// Product taxonomy (categories, BTU capacities, conditions).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn product_options(&self) -> Result<Vec<ProductOption>, BackendError> {
        if let Some(CacheValue::ProductOptions(options)) =
            self.inner.cache.get(&CacheKey::ProductOptions).await
        {
            return Ok(options);
        }

        let options: Vec<ProductOption> = self.get("/api/product-options").await?;
        self.inner
            .cache
            .insert(
                CacheKey::ProductOptions,
                CacheValue::ProductOptions(options.clone()),
            )
            .await;
        Ok(options)
    }

    /// Public store settings (contact details, shipping rules).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn store_settings(&self) -> Result<StoreSettings, BackendError> {
        if let Some(CacheValue::StoreSettings(settings)) =
            self.inner.cache.get(&CacheKey::StoreSettings).await
        {
            return Ok(*settings);
        }

        let settings: StoreSettings = self.get("/api/store-settings").await?;
        self.inner
            .cache
            .insert(
                CacheKey::StoreSettings,
                CacheValue::StoreSettings(Box::new(settings.clone())),
            )
            .await;
        Ok(settings)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Create an order. The backend assigns the payment reference.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Status` if the backend rejects the order.
    #[instrument(skip(self, order), fields(items = order.items.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError> {
        self.post("/api/orders", order).await
    }

    /// Look up an order by payment reference and the email used to place it.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no order matches both values.
    #[instrument(skip(self, email), fields(reference = %reference))]
    pub async fn track_order(&self, reference: &str, email: &Email) -> Result<Order, BackendError> {
        let response = self
            .inner
            .client
            .get(self.url("/api/orders/track"))
            .query(&[("reference", reference), ("email", email.as_str())])
            .send()
            .await?;
        Self::decode(response, "order").await
    }

    // =========================================================================
    // Appointments
    // =========================================================================

    /// Submit an appointment request.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Status` if the backend rejects the request.
    #[instrument(skip(self, appointment))]
    pub async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, BackendError> {
        self.post("/api/appointments", appointment).await
    }

    /// Technicians visible to the public (name and specialty).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_technicians(&self) -> Result<Vec<Technician>, BackendError> {
        let technicians: Vec<Technician> = self.get("/api/technicians").await?;
        Ok(technicians.into_iter().filter(|t| t.is_active).collect())
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers errors as `{"message": "..."}` or `{"error": "..."}`;
/// anything else is truncated raw text.
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
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_list_content_is_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/api/content/product",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!([{"id": 1, "type": "product", "title": "Split 12k"}]))
                }),
            )
            .with_state(hits.clone());
        let client = BackendClient::new(&spawn(router).await);

        let first = client.list_content(ContentType::Product).await.unwrap();
        let second = client.list_content(ContentType::Product).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].title, "Split 12k");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_not_found_and_rate_limit_mapping() {
        let router = Router::new().route(
            "/api/content/faq",
            get(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [("Retry-After", "7")],
                    "slow down",
                )
            }),
        );
        let client = BackendClient::new(&spawn(router).await);

        let missing = client
            .get_content(ContentType::Product, ContentId::new(9))
            .await;
        assert!(matches!(missing, Err(BackendError::NotFound(_))));

        let limited = client.list_content(ContentType::Faq).await;
        assert!(matches!(limited, Err(BackendError::RateLimited(7))));
    }

    #[tokio::test]
    async fn test_status_error_extracts_message() {
        let router = Router::new().route(
            "/api/appointments",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"message": "Fecha no disponible"})),
                )
            }),
        );
        let client = BackendClient::new(&spawn(router).await);
        let request = NewAppointment {
            service_id: None,
            customer_name: "Ana".into(),
            customer_email: "ana@correo.co".parse().unwrap(),
            customer_phone: "3001234567".into(),
            address: "Calle 10 # 5-20".into(),
            city: "Cali".into(),
            preferred_date: chrono::NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            preferred_time: "morning".into(),
            notes: None,
        };

        let err = client.create_appointment(&request).await.unwrap_err();
        assert!(err.is_client_error());
        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body, "Fecha no disponible");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_track_order_sends_reference_and_email() {
        let router = Router::new().route(
            "/api/orders/track",
            get(|Query(q): Query<std::collections::HashMap<String, String>>| async move {
                if q.get("reference").map(String::as_str) == Some("CT-1001")
                    && q.get("email").map(String::as_str) == Some("ana@correo.co")
                {
                    Json(json!({
                        "id": 1, "reference": "CT-1001", "status": "shipped", "total": 1_200_000,
                        "items": [],
                        "customer": {
                            "name": "Ana", "email": "ana@correo.co", "phone": "3001234567",
                            "address": "Calle 10 # 5-20", "city": "Cali"
                        }
                    }))
                    .into_response()
                } else {
                    StatusCode::NOT_FOUND.into_response()
                }
            }),
        );
        let client = BackendClient::new(&spawn(router).await);
        let email: Email = "ana@correo.co".parse().unwrap();

        let order = client.track_order("CT-1001", &email).await.unwrap();
        assert_eq!(order.reference, "CT-1001");

        let other: Email = "otro@correo.co".parse().unwrap();
        assert!(matches!(
            client.track_order("CT-1001", &other).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_technicians_hides_inactive() {
        let router = Router::new().route(
            "/api/technicians",
            get(|| async {
                Json(json!([
                    {"id": 1, "name": "Luis", "isActive": true},
                    {"id": 2, "name": "Marta", "isActive": false}
                ]))
            }),
        );
        let client = BackendClient::new(&spawn(router).await);
        let technicians = client.list_technicians().await.unwrap();
        assert_eq!(technicians.len(), 1);
        assert_eq!(technicians[0].name, "Luis");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(r#"{"error":"bad"}"#), "bad");
        assert_eq!(error_message("plain text"), "plain text");
    }
}
