//! Checkout route handlers (Wompi hand-off).
//!
//! 1. `GET /checkout` collects contact and delivery details.
//! 2. `POST /checkout` creates the order on the backend, which assigns the
//!    payment reference, then renders the Wompi widget signed for that
//!    reference and amount.
//! 3. Wompi redirects to `/checkout/result?id=<transaction>`; the result page
//!    reads the transaction back and empties the cart once it is approved.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use climatech_core::records::{CustomerInfo, NewOrder, NewOrderItem, StoreSettings};
use climatech_core::{Cart, Email, PaymentStatus, Price};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::{load_cart, save_cart, session_keys};
use crate::payment::{Transaction, WIDGET_SCRIPT_URL, WidgetCheckout};
use crate::routes::PageContext;
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub notes: String,
}

impl CheckoutForm {
    /// Validate into the customer record sent with the order.
    ///
    /// # Errors
    ///
    /// Returns the list of messages to show next to the form.
    pub fn validate(&self) -> std::result::Result<CustomerInfo, Vec<String>> {
        let mut errors = Vec::new();
        let required = [
            (&self.name, "El nombre es obligatorio"),
            (&self.phone, "El teléfono es obligatorio"),
            (&self.address, "La dirección es obligatoria"),
            (&self.city, "La ciudad es obligatoria"),
        ];
        for (value, message) in required {
            if value.trim().is_empty() {
                errors.push(message.to_string());
            }
        }

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(_) => {
                errors.push("Ingresa un correo electrónico válido".to_string());
                None
            }
        };

        let phone_digits = self.phone.chars().filter(char::is_ascii_digit).count();
        if !self.phone.trim().is_empty() && !(7..=15).contains(&phone_digits) {
            errors.push("El teléfono debe tener entre 7 y 15 dígitos".to_string());
        }

        match email {
            Some(email) if errors.is_empty() => Ok(CustomerInfo {
                name: self.name.trim().to_string(),
                email,
                phone: self.phone.trim().to_string(),
                document_id: non_empty(&self.document_id),
                address: self.address.trim().to_string(),
                city: self.city.trim().to_string(),
                notes: non_empty(&self.notes),
            }),
            _ => Err(errors),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Order totals shown next to the form.
#[derive(Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub free_shipping: bool,
}

/// Subtotal, shipping and total for a cart under the store's shipping rules.
fn order_total(cart: &Cart, settings: &StoreSettings) -> (Decimal, Decimal, Decimal) {
    let subtotal = cart.total();
    let shipping = settings.shipping_for(subtotal);
    (subtotal, shipping, subtotal + shipping)
}

fn totals_view(cart: &Cart, settings: &StoreSettings) -> TotalsView {
    let (subtotal, shipping, total) = order_total(cart, settings);
    TotalsView {
        subtotal: Price::cop(subtotal).display(),
        shipping: Price::cop(shipping).display(),
        total: Price::cop(total).display(),
        free_shipping: shipping.is_zero(),
    }
}

/// Build the order body from the cart.
fn new_order(cart: &Cart, customer: CustomerInfo, total: Decimal, currency: &str) -> NewOrder {
    NewOrder {
        items: cart
            .items()
            .iter()
            .map(|item| NewOrderItem {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.price_numeric,
            })
            .collect(),
        customer,
        total,
        currency: currency.to_string(),
    }
}

/// Checkout form page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutFormTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub totals: TotalsView,
    pub form: CheckoutForm,
    pub errors: Vec<String>,
}

/// Payment page with the Wompi widget.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/pay.html")]
pub struct CheckoutPayTemplate {
    pub page: PageContext,
    pub checkout: WidgetCheckout,
    pub widget_script_url: &'static str,
    pub total: String,
}

/// Result page after the Wompi redirect.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/result.html")]
pub struct CheckoutResultTemplate {
    pub page: PageContext,
    pub reference: String,
    pub status_label: &'static str,
    pub approved: bool,
    pub pending: bool,
    pub amount: String,
    pub message: Option<String>,
}

/// Show the checkout form; an empty cart goes back to the cart page.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
) -> Response {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let page = PageContext::load(&state, &session, nonce).await;
    CheckoutFormTemplate {
        totals: totals_view(&cart, &page.settings),
        cart: CartView::from(&cart),
        page,
        form: CheckoutForm::default(),
        errors: Vec::new(),
    }
    .into_response()
}

/// Validate, create the order, and render the payment widget.
#[instrument(skip(state, session, nonce, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let page = PageContext::load(&state, &session, nonce).await;
    let customer = match form.validate() {
        Ok(customer) => customer,
        Err(errors) => {
            return Ok(CheckoutFormTemplate {
                totals: totals_view(&cart, &page.settings),
                cart: CartView::from(&cart),
                page,
                form,
                errors,
            }
            .into_response());
        }
    };

    let config = state.config();
    let (_, _, total) = order_total(&cart, &page.settings);
    let order = state
        .backend()
        .create_order(&new_order(
            &cart,
            customer.clone(),
            total,
            config.wompi.currency.code(),
        ))
        .await?;

    // The backend may re-price; charge what it recorded.
    let charged = if order.total.is_zero() { total } else { order.total };
    let checkout = WidgetCheckout::new(
        &config.wompi,
        &order.reference,
        charged,
        config.checkout_result_url(),
        &customer,
    )?;

    session
        .insert(session_keys::PENDING_ORDER, &order.reference)
        .await?;
    add_breadcrumb(
        "checkout",
        "Order created",
        Some(&[("reference", order.reference.as_str())]),
    );
    tracing::info!(
        reference = %order.reference,
        amount_in_cents = checkout.amount_in_cents,
        "Order created, handing off to Wompi"
    );

    Ok(CheckoutPayTemplate {
        page,
        widget_script_url: WIDGET_SCRIPT_URL,
        total: Price::cop(charged).display(),
        checkout,
    }
    .into_response())
}

/// Wompi redirect query.
#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub id: Option<String>,
}

/// Whether `transaction` is an approved payment for the order this session
/// is waiting on.
fn settles_pending_order(pending: Option<&str>, transaction: &Transaction) -> bool {
    transaction.status.is_approved() && pending == Some(transaction.reference.as_str())
}

/// Show the payment result.
#[instrument(skip(state, session, nonce))]
pub async fn result(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Query(query): Query<ResultQuery>,
) -> Result<CheckoutResultTemplate> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Falta el identificador de la transacción".into()))?;

    let transaction = state.wompi().transaction(&id).await?;
    tracing::info!(
        reference = %transaction.reference,
        status = ?transaction.status,
        "Payment result"
    );

    let pending = session
        .get::<String>(session_keys::PENDING_ORDER)
        .await
        .ok()
        .flatten();
    if settles_pending_order(pending.as_deref(), &transaction) {
        save_cart(&session, &Cart::new()).await?;
        session
            .remove::<String>(session_keys::PENDING_ORDER)
            .await?;
    }

    let amount = Decimal::from(transaction.amount_in_cents) / Decimal::ONE_HUNDRED;
    Ok(CheckoutResultTemplate {
        page: PageContext::load(&state, &session, nonce).await,
        reference: transaction.reference,
        status_label: transaction.status.label(),
        approved: transaction.status.is_approved(),
        pending: transaction.status == PaymentStatus::Pending,
        amount: Price::cop(amount).display(),
        message: transaction.status_message,
    })
}
