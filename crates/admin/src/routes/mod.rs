//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (password login against the business API)
//! GET  /auth/login                     - Login page
//! POST /auth/login                     - Sign in
//! POST /auth/logout                    - Sign out
//!
//! # Dashboard
//! GET  /                               - Pending orders, today's appointments, counts
//!
//! # Content (slides, products, services, FAQs, advantages)
//! GET  /content/{type}                 - Table of records
//! GET  /content/{type}/new             - New record form
//! POST /content/{type}                 - Create
//! GET  /content/{type}/{id}/edit       - Edit form
//! POST /content/{type}/{id}            - Update
//! POST /content/{type}/{id}/toggle     - Flip active flag
//! POST /content/{type}/{id}/delete     - Delete
//! POST /slides/reorder                 - Move a slide (form) or apply an id order (JSON)
//!
//! # Records owned by the backend
//! GET  /customers, /customers/{id}     POST /customers/{id}/toggle
//! GET  /users                          POST /users, /users/{id}/role, /users/{id}/delete (admin role)
//! GET  /orders, /orders/{id}           POST /orders/{id}/status
//! GET  /appointments                   POST /appointments/{id}
//! GET  /technicians, /technicians/{id} POST /technicians, /technicians/{id}/toggle
//! GET  /product-options                POST /product-options, /product-options/{id}/delete
//! GET  /settings                       POST /settings
//! POST /upload                         - Image upload proxy, answers {"url": ...}
//! ```
//!
//! Every mutation redirects back to its list, which re-fetches from the
//! backend; the outcome is shown once as a flash message.

pub mod appointments;
pub mod auth;
pub mod content;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod product_options;
pub mod settings;
pub mod slides;
pub mod technicians;
pub mod upload;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};
use climatech_core::ContentType;
use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::models::{CurrentAdmin, FlashMessage, set_flash, take_flash};
use crate::state::AppState;

/// Signed-in staff member as shown in the layout.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub is_admin: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.user.name.clone(),
            email: admin.user.email.clone(),
            role: admin.user.role.label(),
            is_admin: admin.is_admin(),
        }
    }
}

/// Sidebar entry.
#[derive(Debug, Clone)]
pub struct NavItem {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

/// Layout data every admin page needs.
#[derive(Debug, Clone)]
pub struct AdminPage {
    pub user: AdminUserView,
    pub current_path: String,
    pub flash: Option<FlashMessage>,
}

impl AdminPage {
    /// Layout for `current_path`, consuming the pending flash message.
    pub async fn new(admin: &CurrentAdmin, current_path: impl Into<String>, session: &Session) -> Self {
        Self {
            user: AdminUserView::from(admin),
            current_path: current_path.into(),
            flash: take_flash(session).await,
        }
    }

    /// Sidebar links, the one matching the current path marked active.
    #[must_use]
    pub fn nav(&self) -> Vec<NavItem> {
        let mut links: Vec<(String, &'static str)> = vec![("/".to_string(), "Inicio")];
        links.extend(
            ContentType::EDITABLE
                .iter()
                .map(|t| (format!("/content/{}", t.as_str()), t.plural_label())),
        );
        links.extend([
            ("/orders".to_string(), "Pedidos"),
            ("/customers".to_string(), "Clientes"),
            ("/appointments".to_string(), "Citas"),
            ("/technicians".to_string(), "Técnicos"),
            ("/product-options".to_string(), "Opciones de producto"),
            ("/settings".to_string(), "Configuración"),
        ]);
        if self.user.is_admin {
            links.push(("/users".to_string(), "Usuarios"));
        }

        links
            .into_iter()
            .map(|(href, label)| NavItem {
                active: if href == "/" {
                    self.current_path == "/"
                } else {
                    self.current_path.starts_with(&href)
                },
                href,
                label,
            })
            .collect()
    }
}

/// Finish a mutation: flash the outcome and go back to `to`.
///
/// A rejected backend session is not flashed; it sends staff to the login
/// page instead.
pub async fn finish(
    session: &Session,
    to: &str,
    outcome: std::result::Result<String, ApiError>,
) -> Result<Redirect> {
    match outcome {
        Ok(message) => set_flash(session, FlashMessage::success(message)).await,
        Err(ApiError::Unauthorized) => return Err(AppError::Unauthorized),
        Err(e) => {
            tracing::warn!(error = %e, redirect = to, "Mutation failed");
            set_flash(session, FlashMessage::error(e.user_message())).await;
        }
    }
    Ok(Redirect::to(to))
}

/// Flash a validation problem and go back to `to`.
pub async fn reject(session: &Session, to: &str, message: impl Into<String>) -> Redirect {
    set_flash(session, FlashMessage::error(message)).await;
    Redirect::to(to)
}

/// Turn a blank form field into `None`.
#[must_use]
pub fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/{content_type}", get(content::index).post(content::create))
        .route("/{content_type}/new", get(content::new))
        .route("/{content_type}/{id}", post(content::update))
        .route("/{content_type}/{id}/edit", get(content::edit))
        .route("/{content_type}/{id}/toggle", post(content::toggle))
        .route("/{content_type}/{id}/delete", post(content::delete))
}

/// Create all routes for the admin panel.
pub fn routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/", get(dashboard::index))
        .nest("/content", content_routes())
        .route("/slides/reorder", post(slides::reorder))
        .route("/customers", get(customers::index))
        .route("/customers/{id}", get(customers::show))
        .route("/customers/{id}/toggle", post(customers::toggle))
        .route("/users", get(users::index).post(users::create))
        .route("/users/{id}/role", post(users::update_role))
        .route("/users/{id}/delete", post(users::delete))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
        .route("/appointments", get(appointments::index))
        .route("/appointments/{id}", post(appointments::update))
        .route("/technicians", get(technicians::index).post(technicians::create))
        .route("/technicians/{id}", get(technicians::schedule))
        .route("/technicians/{id}/toggle", post(technicians::toggle))
        .route(
            "/product-options",
            get(product_options::index).post(product_options::create),
        )
        .route("/product-options/{id}/delete", post(product_options::delete))
        .route("/settings", get(settings::show).post(settings::update))
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
}
