//! Services and FAQ pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use climatech_core::{Content, ContentId, ContentType};
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::PageContext;
use crate::routes::home::section;
use crate::state::AppState;

/// Service card data for templates.
#[derive(Clone)]
pub struct ServiceCard {
    pub id: ContentId,
    pub title: String,
    pub description: String,
    pub price: Option<String>,
    pub image_url: Option<String>,
}

impl From<&Content> for ServiceCard {
    fn from(service: &Content) -> Self {
        Self {
            id: service.id,
            title: service.title.clone(),
            description: service.description.clone(),
            price: service.price_display(),
            image_url: service.image_url.clone(),
        }
    }
}

/// FAQ entry: the title is the question, the description the answer.
#[derive(Clone)]
pub struct FaqView {
    pub question: String,
    pub answer: String,
}

impl From<&Content> for FaqView {
    fn from(faq: &Content) -> Self {
        Self {
            question: faq.title.clone(),
            answer: faq.description.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "services.html")]
pub struct ServicesTemplate {
    pub page: PageContext,
    pub services: Vec<ServiceCard>,
}

#[derive(Template, WebTemplate)]
#[template(path = "faq.html")]
pub struct FaqTemplate {
    pub page: PageContext,
    pub faqs: Vec<FaqView>,
}

/// Display services page.
#[instrument(skip(state, session, nonce))]
pub async fn services(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
) -> ServicesTemplate {
    let services = section(&state, ContentType::Service).await;
    ServicesTemplate {
        page: PageContext::load(&state, &session, nonce).await,
        services: services.iter().map(ServiceCard::from).collect(),
    }
}

/// Display FAQ page.
#[instrument(skip(state, session, nonce))]
pub async fn faq(State(state): State<AppState>, session: Session, nonce: CspNonce) -> FaqTemplate {
    let faqs = section(&state, ContentType::Faq).await;
    FaqTemplate {
        page: PageContext::load(&state, &session, nonce).await,
        faqs: faqs.iter().map(FaqView::from).collect(),
    }
}
