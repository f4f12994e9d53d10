//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (slides, advantages, featured products, services, FAQs)
//!
//! # Catalog
//! GET  /products               - Product listing with filters
//! GET  /products/{id}          - Product detail
//! GET  /services               - Services
//! GET  /faq                    - Frequently asked questions
//!
//! # Cart (HTMX fragments when HX-Request is set)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns badge, triggers cart-updated)
//! POST /cart/update            - Set quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout (Wompi)
//! GET  /checkout               - Customer details form
//! POST /checkout               - Create order, render payment widget
//! GET  /checkout/result        - Payment result after Wompi redirect
//!
//! # Orders and appointments
//! GET  /orders/track           - Order tracking by reference and email
//! GET  /appointments/new       - Appointment request form
//! POST /appointments           - Submit appointment request
//! ```

pub mod appointments;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod pages;
pub mod products;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};
use climatech_core::records::StoreSettings;
use tower_sessions::Session;

use crate::middleware::{CspNonce, form_rate_limiter};
use crate::models::{FlashMessage, load_cart, take_flash};
use crate::state::AppState;

/// Data every full page needs for the layout (header badge, footer contacts).
#[derive(Clone)]
pub struct PageContext {
    pub nonce: String,
    pub cart_count: u32,
    pub settings: StoreSettings,
    pub whatsapp_link: Option<String>,
    pub flash: Option<FlashMessage>,
}

impl PageContext {
    /// Gather layout data for the current visitor.
    ///
    /// Store settings are decoration: a backend failure renders the page with
    /// defaults instead of failing it.
    pub async fn load(state: &AppState, session: &Session, nonce: CspNonce) -> Self {
        let settings = match state.backend().store_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load store settings");
                StoreSettings::default()
            }
        };
        let cart_count = load_cart(session).await.item_count();
        let flash = take_flash(session).await;

        Self {
            nonce: nonce.0,
            cart_count,
            whatsapp_link: settings.whatsapp_link(),
            settings,
            flash,
        }
    }

    /// Store name for titles, with a fallback.
    #[must_use]
    pub fn store_name(&self) -> &str {
        if self.settings.store_name.trim().is_empty() {
            "Climatech"
        } else {
            &self.settings.store_name
        }
    }
}

/// Whether the request came from HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true")
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .route("/services", get(pages::services))
        .route("/faq", get(pages::faq))
        .nest("/cart", cart_routes())
        // POSTs that create backend records are rate limited per client IP
        .route(
            "/checkout",
            get(checkout::show).merge(post(checkout::submit).layer(form_rate_limiter())),
        )
        .route("/checkout/result", get(checkout::result))
        .route("/orders/track", get(orders::track))
        .route("/appointments/new", get(appointments::new))
        .route(
            "/appointments",
            post(appointments::create).layer(form_rate_limiter()),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
