//! Records owned by the backend API and the partial-update bodies sent back.
//!
//! The backend speaks camelCase JSON. Fields the UI can live without are
//! optional so a backend that omits them still renders.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{
    AppointmentId, AppointmentStatus, ContentId, CustomerId, Email, OptionId, OrderId,
    OrderStatus, PaymentStatus, TechnicianId, UserId, UserRole,
};

// =============================================================================
// Orders
// =============================================================================

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Public reference shared with the customer and the payment provider.
    pub reference: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ContentId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl OrderItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Contact and delivery data captured at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub email: Email,
    pub phone: String,
    #[serde(default)]
    pub document_id: Option<String>,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body for `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub customer: CustomerInfo,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub currency: String,
}

/// A line of a new order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: ContentId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Body for `PUT /api/orders/:id` status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

// =============================================================================
// Customers and users
// =============================================================================

/// A storefront customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub orders_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body toggling a customer's `isActive` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUpdate {
    pub is_active: bool,
}

/// A back-office user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body for `POST /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub role: UserRole,
}

/// Body for role changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserRoleUpdate {
    pub role: UserRole,
}

// =============================================================================
// Scheduling
// =============================================================================

/// An installation or maintenance appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub service_id: Option<ContentId>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preferred_date: Option<NaiveDate>,
    #[serde(default)]
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub technician_id: Option<TechnicianId>,
    #[serde(default)]
    pub technician_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Appointment {
    /// Day the appointment falls on: the confirmed time when set, otherwise
    /// the customer's preferred date.
    #[must_use]
    pub fn day(&self) -> Option<NaiveDate> {
        self.scheduled_at
            .map(|t| t.date_naive())
            .or(self.preferred_date)
    }
}

/// Body for `POST /api/appointments` (customer request).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<ContentId>,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: String,
    pub address: String,
    pub city: String,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update for an appointment; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<TechnicianId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl AppointmentUpdate {
    /// Whether the update carries any change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.technician_id.is_none() && self.scheduled_at.is_none()
    }
}

/// A field technician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: TechnicianId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Body for creating or updating a technician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    pub is_active: bool,
}

// =============================================================================
// Catalog taxonomy and settings
// =============================================================================

/// Which product attribute a [`ProductOption`] populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Category,
    Btu,
    Condition,
}

impl OptionKind {
    /// Every kind, in display order.
    pub const ALL: &'static [Self] = &[Self::Category, Self::Btu, Self::Condition];

    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Btu => "btu",
            Self::Condition => "condition",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Category => "Categoría",
            Self::Btu => "Capacidad (BTU)",
            Self::Condition => "Condición",
        }
    }
}

impl std::str::FromStr for OptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Self::Category),
            "btu" => Ok(Self::Btu),
            "condition" => Ok(Self::Condition),
            other => Err(format!("unknown option kind: {other}")),
        }
    }
}

/// Backend-managed taxonomy value used to populate catalog filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    pub id: OptionId,
    #[serde(rename = "type", alias = "kind")]
    pub kind: OptionKind,
    pub value: String,
    #[serde(default)]
    pub order: i32,
}

/// Body for `POST /api/product-options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProductOption {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub value: String,
}

/// Store-wide settings from `/api/admin/store-settings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    pub store_name: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub business_hours: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub shipping_cost: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub free_shipping_threshold: Option<Decimal>,
    pub data: Map<String, Value>,
}

impl StoreSettings {
    /// Shipping charged for an order subtotal.
    ///
    /// Free when the subtotal reaches the threshold; zero when no shipping
    /// cost is configured.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        let cost = self.shipping_cost.unwrap_or_default();
        match self.free_shipping_threshold {
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => cost,
        }
    }

    /// `wa.me` link for the configured WhatsApp number (digits only).
    #[must_use]
    pub fn whatsapp_link(&self) -> Option<String> {
        let digits: String = self
            .whatsapp
            .as_deref()?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        (!digits.is_empty()).then(|| format!("https://wa.me/{digits}"))
    }
}

const fn default_true() -> bool {
    true
}
