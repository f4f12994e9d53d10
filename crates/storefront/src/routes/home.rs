//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use climatech_core::content::{active_only, sort_for_display};
use climatech_core::{Content, ContentType};
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::PageContext;
use crate::routes::pages::{FaqView, ServiceCard};
use crate::routes::products::ProductCard;
use crate::state::AppState;

/// Products shown in the "featured" strip.
const FEATURED_LIMIT: usize = 8;

/// A hero carousel slide.
#[derive(Clone)]
pub struct SlideView {
    pub title: String,
    pub subtitle: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub button_text: String,
}

impl From<&Content> for SlideView {
    fn from(slide: &Content) -> Self {
        Self {
            title: slide.title.clone(),
            subtitle: slide.description.clone(),
            image_url: slide.image_url.clone(),
            link_url: slide.link_url(),
            button_text: slide
                .data_str("buttonText")
                .unwrap_or_else(|| "Ver más".to_string()),
        }
    }
}

/// A "why choose us" tile.
#[derive(Clone)]
pub struct AdvantageView {
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl From<&Content> for AdvantageView {
    fn from(advantage: &Content) -> Self {
        Self {
            title: advantage.title.clone(),
            description: advantage.description.clone(),
            icon: advantage.icon().unwrap_or_else(|| "check".to_string()),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub slides: Vec<SlideView>,
    pub advantages: Vec<AdvantageView>,
    pub featured: Vec<ProductCard>,
    pub services: Vec<ServiceCard>,
    pub faqs: Vec<FaqView>,
}

/// Active records of a type in display order.
///
/// Each home section is independent: a failed fetch leaves that section
/// empty and the rest of the page renders.
pub async fn section(state: &AppState, content_type: ContentType) -> Vec<Content> {
    match state.backend().list_content(content_type).await {
        Ok(items) => {
            let mut items = active_only(items);
            sort_for_display(&mut items);
            items
        }
        Err(e) => {
            tracing::warn!(error = %e, content_type = %content_type, "Failed to load home section");
            Vec::new()
        }
    }
}

/// Display home page.
#[instrument(skip(state, session, nonce))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
) -> HomeTemplate {
    let (slides, advantages, products, services, faqs) = tokio::join!(
        section(&state, ContentType::Slide),
        section(&state, ContentType::Advantage),
        section(&state, ContentType::Product),
        section(&state, ContentType::Service),
        section(&state, ContentType::Faq),
    );

    HomeTemplate {
        page: PageContext::load(&state, &session, nonce).await,
        slides: slides.iter().map(SlideView::from).collect(),
        advantages: advantages.iter().map(AdvantageView::from).collect(),
        featured: products
            .iter()
            .take(FEATURED_LIMIT)
            .map(ProductCard::from)
            .collect(),
        services: services.iter().map(ServiceCard::from).collect(),
        faqs: faqs.iter().map(FaqView::from).collect(),
    }
}
