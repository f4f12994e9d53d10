//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Mutations answer HTMX requests
//! with a fragment plus `HX-Trigger: cart-updated` (the header badge listens
//! for it); plain form posts are redirected back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use climatech_core::{Cart, CartItem, ContentId, ContentType, Price};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::{FlashMessage, load_cart, save_cart, set_flash};
use crate::routes::{PageContext, is_htmx};
use crate::state::AppState;

/// Event HTMX listeners refresh on.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Largest quantity accepted for a single line.
const MAX_LINE_QUANTITY: u32 = 99;

/// Quantity to add for a submitted form value: missing means one, zero means
/// nothing to add, anything else is capped at [`MAX_LINE_QUANTITY`].
const fn requested_quantity(raw: Option<u32>) -> Option<u32> {
    match raw {
        None => Some(1),
        Some(0) => None,
        Some(n) if n > MAX_LINE_QUANTITY => Some(MAX_LINE_QUANTITY),
        Some(n) => Some(n),
    }
}

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: ContentId,
    pub title: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image_url: Option<String>,
    pub details: Option<String>,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        let details = match (&item.category, &item.btu_capacity) {
            (Some(c), Some(b)) => Some(format!("{c} · {b} BTU")),
            (Some(c), None) => Some(c.clone()),
            (None, Some(b)) => Some(format!("{b} BTU")),
            (None, None) => None,
        };
        Self {
            product_id: item.product_id,
            title: item.title.clone(),
            quantity: item.quantity,
            price: Price::cop(item.price_numeric).display(),
            line_total: item.line_total_display(),
            image_url: item.image_url.clone(),
            details,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartLineView::from).collect(),
            subtotal: cart.total_display(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i64,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i64,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i64,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Respond to a cart mutation: fragment for HTMX, redirect otherwise.
fn mutation_response(headers: &HeaderMap, fragment: impl IntoResponse) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]),
            fragment,
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Display cart page.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
) -> CartShowTemplate {
    let cart = load_cart(&session).await;
    CartShowTemplate {
        page: PageContext::load(&state, &session, nonce).await,
        cart: CartView::from(&cart),
    }
}

/// Add a product to the cart.
///
/// Title and price come from the catalog, never from the form.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let Some(quantity) = requested_quantity(form.quantity) else {
        let count = load_cart(&session).await.item_count();
        return Ok(mutation_response(&headers, CartCountTemplate { count }));
    };
    let product = state
        .backend()
        .get_content(ContentType::Product, ContentId::new(form.product_id))
        .await?;

    if !product.is_active {
        return Err(AppError::NotFound(format!("product {}", product.id)));
    }
    let Some(item) = CartItem::from_product(&product, quantity) else {
        return Err(AppError::BadRequest(
            "Este producto se vende bajo cotización".to_string(),
        ));
    };

    let mut cart = load_cart(&session).await;
    cart.add_up_to(item, MAX_LINE_QUANTITY);
    save_cart(&session, &cart).await?;

    let product_id = product.id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    tracing::info!(product_id = %product.id, quantity, "Added to cart");

    if !is_htmx(&headers) {
        set_flash(&session, FlashMessage::success(format!("{} agregado al carrito", product.title))).await;
    }
    Ok(mutation_response(
        &headers,
        CartCountTemplate {
            count: cart.item_count(),
        },
    ))
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    if !cart.update_quantity(
        ContentId::new(form.product_id),
        form.quantity.min(i64::from(MAX_LINE_QUANTITY)),
    ) {
        tracing::debug!(product_id = form.product_id, "Update for product not in cart");
    }
    save_cart(&session, &cart).await?;

    Ok(mutation_response(
        &headers,
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    ))
}

/// Remove a line.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    cart.remove(ContentId::new(form.product_id));
    save_cart(&session, &cart).await?;

    Ok(mutation_response(
        &headers,
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    ))
}

/// Empty the cart.
#[instrument(skip(session, headers))]
pub async fn clear(session: Session, headers: HeaderMap) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    cart.clear();
    save_cart(&session, &cart).await?;

    Ok(mutation_response(
        &headers,
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    ))
}

/// Cart count badge fragment.
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    CartCountTemplate {
        count: load_cart(&session).await.item_count(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};
    use rust_decimal::Decimal;

    use super::*;

    fn item(id: i64, qty: u32) -> CartItem {
        CartItem {
            product_id: ContentId::new(id),
            title: "Split 12k".into(),
            price: "$1.500.000".into(),
            price_numeric: Decimal::from(1_500_000),
            quantity: qty,
            image_url: None,
            category: Some("Mini split".into()),
            btu_capacity: Some("12000".into()),
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let mut cart = Cart::new();
        cart.add(item(1, 2));
        let view = CartView::from(&cart);
        assert_eq!(view.subtotal, "$3.000.000");
        assert_eq!(view.item_count, 2);
        assert_eq!(view.items[0].details.as_deref(), Some("Mini split · 12000 BTU"));
        assert_eq!(view.items[0].line_total, "$3.000.000");
    }

    #[test]
    fn test_requested_quantity() {
        assert_eq!(requested_quantity(None), Some(1));
        assert_eq!(requested_quantity(Some(0)), None);
        assert_eq!(requested_quantity(Some(3)), Some(3));
        assert_eq!(requested_quantity(Some(500)), Some(MAX_LINE_QUANTITY));
    }

    #[test]
    fn test_repeated_max_adds_stay_at_line_cap() {
        let mut cart = Cart::new();
        for _ in 0..2 {
            let quantity = requested_quantity(Some(MAX_LINE_QUANTITY)).unwrap();
            cart.add_up_to(item(1, quantity), MAX_LINE_QUANTITY);
        }
        assert_eq!(cart.get(ContentId::new(1)).unwrap().quantity, 99);
        assert_eq!(CartView::from(&cart).item_count, 99);
    }

    #[test]
    fn test_mutation_response_htmx_sets_trigger() {
        let mut headers = HeaderMap::new();
        headers.insert("hx-request", HeaderValue::from_static("true"));
        let response = mutation_response(&headers, CartCountTemplate { count: 3 });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("hx-trigger").unwrap(), CART_UPDATED_EVENT);
    }

    #[test]
    fn test_mutation_response_plain_form_redirects() {
        let response = mutation_response(&HeaderMap::new(), CartCountTemplate { count: 3 });
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/cart");
    }
}
