//! Persisting a new display order.
//!
//! One PUT per item, all in flight at once. There is no transaction on the
//! backend: when some writes fail the report lists them and the list page
//! shows whatever the backend ended up with. Nothing is retried.

use climatech_core::{Content, ContentId};
use futures::future::join_all;
use tracing::instrument;

use super::AuthorizedApi;

/// Outcome of [`AuthorizedApi::persist_order`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReorderReport {
    /// Items whose new position was saved.
    pub saved: usize,
    /// Items that failed, with the error shown to staff.
    pub failed: Vec<(ContentId, String)>,
}

impl ReorderReport {
    /// Whether every write succeeded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl AuthorizedApi<'_> {
    /// Save the `order` of every item in `items`, one PUT per item.
    ///
    /// Only the items passed are written. The slides screen passes the
    /// output of [`crate::routes::slides::changed_positions`], so slides
    /// whose position did not change get no request.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn persist_order(&self, items: &[Content]) -> ReorderReport {
        let writes = items
            .iter()
            .map(|item| async move { (item.id, self.set_order(item, item.order).await) });

        let mut report = ReorderReport::default();
        for (id, result) in join_all(writes).await {
            match result {
                Ok(_) => report.saved += 1,
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "Failed to persist position");
                    report.failed.push((id, e.user_message()));
                }
            }
        }

        if !report.is_complete() {
            tracing::warn!(
                saved = report.saved,
                failed = report.failed.len(),
                "Reorder partially saved"
            );
        }
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::put;
    use axum::{Json, Router};
    use climatech_core::{Content, ContentId, ContentType, reorder};
    use serde_json::{Value, json};

    use super::super::ApiClient;
    use super::super::tests::{authorized, session, spawn};

    type Writes = Arc<Mutex<Vec<(i64, i64)>>>;

    fn slide(id: i64, order: i32) -> Content {
        serde_json::from_value(json!({
            "id": id, "type": "slide", "title": format!("Slide {id}"), "order": order
        }))
        .unwrap()
    }

    async fn record(
        State(writes): State<Writes>,
        Path(id): Path<i64>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> axum::response::Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if id == 3 {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        let order = body["order"].as_i64().unwrap();
        writes.lock().unwrap().push((id, order));
        Json(json!({"id": id, "type": "slide", "title": "x", "order": order})).into_response()
    }

    #[tokio::test]
    async fn test_persist_order_reports_partial_failure() {
        let writes: Writes = Arc::default();
        let router = Router::new()
            .route("/api/content/slide/{id}", put(record))
            .with_state(writes.clone());
        let client = ApiClient::new(&spawn(router).await);
        let session = session();

        let mut slides = vec![slide(1, 1), slide(2, 2), slide(3, 3)];
        reorder::move_item(&mut slides, 2, 0).unwrap();

        let report = client.as_user(&session).persist_order(&slides).await;
        assert_eq!(report.saved, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, ContentId::new(3));
        assert!(!report.is_complete());

        let mut saved = writes.lock().unwrap().clone();
        saved.sort_unstable();
        assert_eq!(saved, vec![(1, 2), (2, 3)]);
        assert_eq!(slides[0].content_type, ContentType::Slide);
    }

    #[tokio::test]
    async fn test_persist_order_writes_only_items_passed() {
        let writes: Writes = Arc::default();
        let router = Router::new()
            .route("/api/content/slide/{id}", put(record))
            .with_state(writes.clone());
        let client = ApiClient::new(&spawn(router).await);
        let session = session();

        let report = client
            .as_user(&session)
            .persist_order(&[slide(4, 1), slide(1, 2)])
            .await;
        assert_eq!(report.saved, 2);
        assert!(report.is_complete());

        let mut saved = writes.lock().unwrap().clone();
        saved.sort_unstable();
        assert_eq!(saved, vec![(1, 2), (4, 1)]);
    }

    #[tokio::test]
    async fn test_persist_order_empty_is_complete() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let session = session();
        let report = client.as_user(&session).persist_order(&[]).await;
        assert!(report.is_complete());
        assert_eq!(report.saved, 0);
    }
}
