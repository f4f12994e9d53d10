//! Slide reordering.
//!
//! The list page posts `from`/`to` positions from its move buttons; the
//! drag-and-drop script posts the whole id order as JSON. Either way the
//! new positions are renumbered from 1 and only slides whose position
//! changed are written back.

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};
use climatech_core::content::sort_for_display;
use climatech_core::{Content, ContentId, ContentType, ReorderError, move_item, reorder_by_ids};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ReorderReport;
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::models::{FlashMessage, set_flash};
use crate::routes::reject;
use crate::state::AppState;

const SLIDES_PATH: &str = "/content/slide";

#[derive(Debug, Deserialize)]
struct MoveForm {
    from: usize,
    to: usize,
}

#[derive(Debug, Deserialize)]
struct IdOrder {
    ids: Vec<ContentId>,
}

/// A reorder request, from either the move buttons or the drag script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderRequest {
    /// Move the slide at 0-based position `from` to `to`.
    Move { from: usize, to: usize },
    /// Full order by id, first to last.
    Ids(Vec<ContentId>),
}

impl ReorderRequest {
    const fn is_json(&self) -> bool {
        matches!(self, Self::Ids(_))
    }
}

impl<S> FromRequest<S> for ReorderRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<IdOrder>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self::Ids(body.ids))
        } else {
            let Form(body) = Form::<MoveForm>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self::Move {
                from: body.from,
                to: body.to,
            })
        }
    }
}

/// Apply `request` to `slides` and return the slides whose position changed,
/// carrying their new `order`.
///
/// # Errors
///
/// Returns a [`ReorderError`] for out-of-range positions or unknown ids.
pub fn changed_positions(
    mut slides: Vec<Content>,
    request: &ReorderRequest,
) -> std::result::Result<Vec<Content>, ReorderError> {
    sort_for_display(&mut slides);
    let before: Vec<(ContentId, i32)> = slides.iter().map(|s| (s.id, s.order)).collect();

    match request {
        ReorderRequest::Move { from, to } => move_item(&mut slides, *from, *to)?,
        ReorderRequest::Ids(ids) => reorder_by_ids(&mut slides, ids)?,
    }

    Ok(slides
        .into_iter()
        .filter(|slide| !before.contains(&(slide.id, slide.order)))
        .collect())
}

#[derive(Debug, Serialize)]
struct FailedWrite {
    id: ContentId,
    error: String,
}

/// JSON answer for the drag script.
#[derive(Debug, Serialize)]
struct ReorderResponse {
    ok: bool,
    saved: usize,
    failed: Vec<FailedWrite>,
}

impl From<ReorderReport> for ReorderResponse {
    fn from(report: ReorderReport) -> Self {
        Self {
            ok: report.is_complete(),
            saved: report.saved,
            failed: report
                .failed
                .into_iter()
                .map(|(id, error)| FailedWrite { id, error })
                .collect(),
        }
    }
}

/// Reorder slides and save the changed positions in parallel.
#[instrument(skip(admin, state, session, request))]
pub async fn reorder(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    request: ReorderRequest,
) -> Result<Response> {
    let api = state.api().as_user(&admin.backend);
    let slides = api.list_content(ContentType::Slide).await?;

    let changed = match changed_positions(slides, &request) {
        Ok(changed) => changed,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid reorder request");
            if request.is_json() {
                return Ok((StatusCode::BAD_REQUEST, e.to_string()).into_response());
            }
            return Ok(reject(&session, SLIDES_PATH, "No se pudo mover el slide")
                .await
                .into_response());
        }
    };

    let report = api.persist_order(&changed).await;
    tracing::info!(
        saved = report.saved,
        failed = report.failed.len(),
        "Slides reordered"
    );

    if request.is_json() {
        return Ok(Json(ReorderResponse::from(report)).into_response());
    }

    let flash = if report.is_complete() {
        FlashMessage::success("Orden de slides actualizado")
    } else {
        FlashMessage::error(format!(
            "{} de {} posiciones no se guardaron; la lista muestra el orden actual",
            report.failed.len(),
            changed.len()
        ))
    };
    set_flash(&session, flash).await;
    Ok(Redirect::to(SLIDES_PATH).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use serde_json::json;

    use super::*;

    fn slides() -> Vec<Content> {
        [(1, 1), (2, 2), (3, 3), (4, 4)]
            .into_iter()
            .map(|(id, order)| {
                serde_json::from_value(json!({"id": id, "type": "slide", "title": "s", "order": order}))
                    .unwrap()
            })
            .collect()
    }

    fn ids(items: &[Content]) -> Vec<(i64, i32)> {
        items.iter().map(|c| (c.id.as_i64(), c.order)).collect()
    }

    #[test]
    fn test_move_writes_only_shifted_slides() {
        let changed = changed_positions(slides(), &ReorderRequest::Move { from: 2, to: 0 }).unwrap();
        assert_eq!(ids(&changed), vec![(3, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_id_order_with_gapped_positions_renumbers_all() {
        let mut gapped = slides();
        for slide in &mut gapped {
            slide.order *= 10;
        }
        let request = ReorderRequest::Ids(vec![ContentId::new(1), ContentId::new(2)]);
        let changed = changed_positions(gapped, &request).unwrap();
        assert_eq!(ids(&changed), vec![(1, 1), (2, 2), (3, 3), (4, 4)]);
    }

    #[test]
    fn test_noop_move_changes_nothing() {
        let changed = changed_positions(slides(), &ReorderRequest::Move { from: 1, to: 1 }).unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn test_invalid_requests() {
        assert!(matches!(
            changed_positions(slides(), &ReorderRequest::Move { from: 0, to: 9 }),
            Err(ReorderError::OutOfRange { index: 9, len: 4 })
        ));
        assert!(matches!(
            changed_positions(slides(), &ReorderRequest::Ids(vec![ContentId::new(99)])),
            Err(ReorderError::UnknownId(_))
        ));
    }

    #[tokio::test]
    async fn test_extractor_reads_form_and_json() {
        let form = axum::http::Request::post("/slides/reorder")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("from=3&to=1"))
            .unwrap();
        let request = ReorderRequest::from_request(form, &()).await.unwrap();
        assert_eq!(request, ReorderRequest::Move { from: 3, to: 1 });

        let json = axum::http::Request::post("/slides/reorder")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"ids":[4,2]}"#))
            .unwrap();
        let request = ReorderRequest::from_request(json, &()).await.unwrap();
        assert_eq!(
            request,
            ReorderRequest::Ids(vec![ContentId::new(4), ContentId::new(2)])
        );
    }
}
