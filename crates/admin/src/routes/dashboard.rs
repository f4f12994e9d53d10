//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::{Local, NaiveDate};
use climatech_core::records::{Appointment, Order};
use climatech_core::{ContentType, OrderStatus, Price};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::AdminPage;
use crate::state::AppState;

/// Headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub pending_orders: usize,
    pub open_appointments: usize,
    pub customers: usize,
    pub products: usize,
}

/// Order waiting for staff.
#[derive(Debug, Clone)]
pub struct PendingOrderView {
    pub id: String,
    pub reference: String,
    pub customer: String,
    pub total: String,
    pub status: &'static str,
    pub badge: &'static str,
}

impl From<&Order> for PendingOrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            reference: order.reference.clone(),
            customer: order.customer.name.clone(),
            total: Price::cop(order.total).display(),
            status: order.status.label(),
            badge: order.status.badge_class(),
        }
    }
}

/// Visit scheduled for today.
#[derive(Debug, Clone)]
pub struct TodayAppointmentView {
    pub customer: String,
    pub time: String,
    pub service: String,
    pub technician: String,
    pub city: String,
}

impl From<&Appointment> for TodayAppointmentView {
    fn from(appointment: &Appointment) -> Self {
        let time = appointment.scheduled_at.map_or_else(
            || appointment.preferred_time.clone().unwrap_or_default(),
            |at| at.with_timezone(&Local).format("%H:%M").to_string(),
        );
        Self {
            customer: appointment.customer_name.clone(),
            time,
            service: appointment.service_name.clone().unwrap_or_default(),
            technician: appointment
                .technician_name
                .clone()
                .unwrap_or_else(|| "Sin asignar".to_string()),
            city: appointment.city.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: AdminPage,
    pub metrics: DashboardMetrics,
    pub pending_orders: Vec<PendingOrderView>,
    pub today: String,
    pub appointments: Vec<TodayAppointmentView>,
}

/// Orders staff still has to act on.
fn needs_attention(order: &Order) -> bool {
    matches!(
        order.status,
        OrderStatus::Pending | OrderStatus::Paid | OrderStatus::Processing
    )
}

/// Open appointments on `day`, earliest first.
fn appointments_on(appointments: &[Appointment], day: NaiveDate) -> Vec<&Appointment> {
    let mut todays: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.status.is_open() && a.day() == Some(day))
        .collect();
    todays.sort_by_key(|a| (a.scheduled_at, slot_rank(a.preferred_time.as_deref())));
    todays
}

/// Morning visits before afternoon ones when no exact time is set.
fn slot_rank(slot: Option<&str>) -> u8 {
    match slot {
        Some("morning") => 0,
        Some("afternoon") => 1,
        _ => 2,
    }
}

/// A widget whose data failed to load renders empty; an expired session
/// still sends staff to the login page.
fn or_empty<T: Default>(result: std::result::Result<T, ApiError>, what: &str) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(ApiError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) => {
            tracing::warn!(error = %e, widget = what, "Dashboard data unavailable");
            Ok(T::default())
        }
    }
}

/// Dashboard page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<DashboardTemplate> {
    let api = state.api().as_user(&admin.backend);
    let (orders, appointments, customers, products) = tokio::join!(
        api.list_orders(),
        api.list_appointments(),
        api.list_customers(),
        api.list_content(ContentType::Product),
    );
    let orders = or_empty(orders, "orders")?;
    let appointments = or_empty(appointments, "appointments")?;
    let customers = or_empty(customers, "customers")?;
    let products = or_empty(products, "products")?;

    let mut pending: Vec<&Order> = orders.iter().filter(|o| needs_attention(o)).collect();
    pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let today = Local::now().date_naive();
    let todays = appointments_on(&appointments, today);

    Ok(DashboardTemplate {
        page: AdminPage::new(&admin, "/", &session).await,
        metrics: DashboardMetrics {
            pending_orders: pending.len(),
            open_appointments: appointments.iter().filter(|a| a.status.is_open()).count(),
            customers: customers.len(),
            products: products.len(),
        },
        pending_orders: pending.into_iter().take(10).map(PendingOrderView::from).collect(),
        today: today.format("%d/%m/%Y").to_string(),
        appointments: todays.into_iter().map(TodayAppointmentView::from).collect(),
    })
}
