//! Order tracking by reference and email.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use climatech_core::records::Order;
use climatech_core::{Email, Price};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::PageContext;
use crate::state::AppState;

/// Tracking form query.
#[derive(Debug, Default, Deserialize)]
pub struct TrackQuery {
    pub reference: Option<String>,
    pub email: Option<String>,
}

/// Order line for templates.
#[derive(Clone)]
pub struct TrackedLine {
    pub title: String,
    pub quantity: u32,
    pub line_total: String,
}

/// Order summary shown to the customer.
#[derive(Clone)]
pub struct TrackedOrder {
    pub reference: String,
    pub status: &'static str,
    pub payment: Option<&'static str>,
    pub total: String,
    pub placed_on: Option<String>,
    pub lines: Vec<TrackedLine>,
    pub city: String,
}

impl From<&Order> for TrackedOrder {
    fn from(order: &Order) -> Self {
        Self {
            reference: order.reference.clone(),
            status: order.status.label(),
            payment: order.payment_status.map(|p| p.label()),
            total: Price::cop(order.total).display(),
            placed_on: order
                .created_at
                .map(|t| t.format("%d/%m/%Y").to_string()),
            lines: order
                .items
                .iter()
                .map(|item| TrackedLine {
                    title: item.title.clone(),
                    quantity: item.quantity,
                    line_total: Price::cop(item.line_total()).display(),
                })
                .collect(),
            city: order.customer.city.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/track.html")]
pub struct TrackTemplate {
    pub page: PageContext,
    pub reference: String,
    pub email: String,
    pub order: Option<TrackedOrder>,
    pub error: Option<String>,
}

/// Look up an order when both fields are present, otherwise show the form.
#[instrument(skip(state, session, nonce, query))]
pub async fn track(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Query(query): Query<TrackQuery>,
) -> Result<TrackTemplate> {
    let reference = query.reference.unwrap_or_default().trim().to_uppercase();
    let email = query.email.unwrap_or_default().trim().to_string();

    let (order, error) = if reference.is_empty() && email.is_empty() {
        (None, None)
    } else {
        lookup(&state, &reference, &email).await?
    };

    Ok(TrackTemplate {
        page: PageContext::load(&state, &session, nonce).await,
        reference,
        email,
        order,
        error,
    })
}

/// Validation and not-found problems become a message on the page; other
/// backend failures propagate.
async fn lookup(
    state: &AppState,
    reference: &str,
    email: &str,
) -> Result<(Option<TrackedOrder>, Option<String>)> {
    if reference.is_empty() {
        return Ok((None, Some("Ingresa la referencia de tu pedido".into())));
    }
    let Ok(email) = Email::parse(email) else {
        return Ok((None, Some("Ingresa el correo con el que hiciste el pedido".into())));
    };

    match state.backend().track_order(reference, &email).await {
        Ok(order) => Ok((Some(TrackedOrder::from(&order)), None)),
        Err(BackendError::NotFound(_)) => {
            tracing::info!(reference, "Tracked order not found");
            Ok((
                None,
                Some("No encontramos un pedido con esa referencia y correo".into()),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_tracked_order_view() {
        let order: Order = serde_json::from_value(json!({
            "id": 3,
            "reference": "CT-000003",
            "status": "shipped",
            "total": 2_500_000,
            "paymentStatus": "APPROVED",
            "createdAt": "2026-03-02T15:00:00Z",
            "items": [{"productId": 1, "title": "Split 12k", "quantity": 2, "unitPrice": 1_250_000}],
            "customer": {
                "name": "Ana", "email": "ana@correo.co", "phone": "3001234567",
                "address": "Calle 1", "city": "Cali"
            }
        }))
        .unwrap();

        let view = TrackedOrder::from(&order);
        assert_eq!(view.total, "$2.500.000");
        assert_eq!(view.payment, Some("Pago aprobado"));
        assert_eq!(view.placed_on.as_deref(), Some("02/03/2026"));
        assert_eq!(view.lines[0].line_total, "$2.500.000");
        assert_eq!(view.status, order.status.label());
    }
}
