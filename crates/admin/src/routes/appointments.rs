//! Appointment scheduling: confirm visits, assign technicians, set times.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use climatech_core::records::{Appointment, AppointmentUpdate, Technician};
use climatech_core::{AppointmentId, AppointmentStatus, TechnicianId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{
    DataTableConfig, SortDir, SortValue, TableColumn, TableFilter, TableQuery, TableRow,
    TableState,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::{AdminPage, finish, non_empty, reject};
use crate::state::AppState;

const APPOINTMENTS_PATH: &str = "/appointments";

/// `<input type="datetime-local">` value format.
const DATETIME_LOCAL: &str = "%Y-%m-%dT%H:%M";

/// Appointment flattened for the table and the technician schedule.
#[derive(Debug, Clone)]
pub struct AppointmentRow {
    pub id: AppointmentId,
    pub customer: String,
    pub phone: String,
    pub email: String,
    pub service: String,
    pub address: String,
    pub city: String,
    pub day: Option<NaiveDate>,
    /// Confirmed time, or the customer's preferred date and slot.
    pub when: String,
    /// Confirmed time in `datetime-local` form, empty when unscheduled.
    pub when_input: String,
    pub scheduled: bool,
    /// Technician id as text, empty when unassigned.
    pub technician_id: String,
    pub technician: String,
    pub status: AppointmentStatus,
    pub notes: String,
}

impl From<&Appointment> for AppointmentRow {
    fn from(appointment: &Appointment) -> Self {
        let local = appointment.scheduled_at.map(|t| t.with_timezone(&Local));
        let when = match (local, appointment.preferred_date) {
            (Some(t), _) => t.format("%Y-%m-%d %H:%M").to_string(),
            (None, Some(date)) => {
                let slot = appointment.preferred_time.as_deref().unwrap_or_default();
                format!("{date} {slot} (preferida)").replace("  ", " ")
            }
            (None, None) => String::new(),
        };

        Self {
            id: appointment.id,
            customer: appointment.customer_name.clone(),
            phone: appointment.customer_phone.clone().unwrap_or_default(),
            email: appointment.customer_email.clone().unwrap_or_default(),
            service: appointment.service_name.clone().unwrap_or_default(),
            address: appointment.address.clone().unwrap_or_default(),
            city: appointment.city.clone().unwrap_or_default(),
            day: appointment.day(),
            when,
            when_input: local
                .map(|t| t.format(DATETIME_LOCAL).to_string())
                .unwrap_or_default(),
            scheduled: appointment.scheduled_at.is_some(),
            technician_id: appointment
                .technician_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            technician: appointment.technician_name.clone().unwrap_or_default(),
            status: appointment.status,
            notes: appointment.notes.clone().unwrap_or_default(),
        }
    }
}

impl TableRow for AppointmentRow {
    fn cell(&self, key: &str) -> String {
        match key {
            "customer" => self.customer.clone(),
            "service" => self.service.clone(),
            "city" => self.city.clone(),
            "when" => self.when.clone(),
            "technician" => self.technician.clone(),
            "status" => self.status.as_str().to_string(),
            _ => String::new(),
        }
    }

    fn search_text(&self, key: &str) -> String {
        match key {
            "status" => self.status.label().to_string(),
            other => self.cell(other),
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "when" => self
                .day
                .map_or(SortValue::Empty, |_| SortValue::text(&self.when)),
            other => SortValue::text(&self.cell(other)),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig::new(APPOINTMENTS_PATH)
        .column(TableColumn::sortable("when", "Fecha"))
        .column(TableColumn::sortable("customer", "Cliente"))
        .column(TableColumn::sortable("service", "Servicio"))
        .column(TableColumn::sortable("city", "Ciudad"))
        .column(TableColumn::sortable("technician", "Técnico"))
        .column(TableColumn::sortable("status", "Estado"))
        .filter(TableFilter {
            key: "status",
            label: "Estado",
            options: AppointmentStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), s.label().to_string()))
                .collect(),
        })
        .search_placeholder("Buscar por cliente, servicio o técnico...")
        .empty_state("No hay citas agendadas")
        .default_sort("when", SortDir::Asc)
}

/// `(value, label)` option for a select box.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Every appointment status.
#[must_use]
pub fn status_options() -> Vec<SelectOption> {
    AppointmentStatus::ALL
        .iter()
        .map(|s| SelectOption {
            value: s.as_str().to_string(),
            label: s.label().to_string(),
        })
        .collect()
}

/// Active technicians, by name.
#[must_use]
pub fn technician_options(technicians: &[Technician]) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = technicians
        .iter()
        .filter(|t| t.is_active)
        .map(|t| SelectOption {
            value: t.id.to_string(),
            label: t.name.clone(),
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}

#[derive(Template, WebTemplate)]
#[template(path = "appointments/index.html")]
pub struct AppointmentsIndexTemplate {
    pub page: AdminPage,
    pub table: TableState<AppointmentRow>,
    pub statuses: Vec<SelectOption>,
    pub technicians: Vec<SelectOption>,
}

#[instrument(skip(admin, state, session, query))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TableQuery>,
) -> Result<AppointmentsIndexTemplate> {
    let api = state.api().as_user(&admin.backend);
    let (appointments, technicians) = tokio::join!(api.list_appointments(), api.list_technicians());
    let rows = appointments?.iter().map(AppointmentRow::from).collect();
    let technicians = technicians?;

    Ok(AppointmentsIndexTemplate {
        page: AdminPage::new(&admin, APPOINTMENTS_PATH, &session).await,
        table: TableState::build(rows, &table_config(), &query),
        statuses: status_options(),
        technicians: technician_options(&technicians),
    })
}

/// Scheduling form on each table row. Blank fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentForm {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub technician_id: String,
    #[serde(default)]
    pub scheduled_at: String,
    /// Where to go back to (the table or a technician schedule).
    #[serde(default)]
    pub back: String,
}

/// Read a `datetime-local` value as server-local time.
fn parse_local(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), DATETIME_LOCAL).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

impl AppointmentForm {
    /// Build the partial update.
    ///
    /// # Errors
    ///
    /// Returns a message when a field does not parse.
    pub fn to_update(&self) -> std::result::Result<AppointmentUpdate, String> {
        let status = non_empty(&self.status)
            .map(|s| s.parse::<AppointmentStatus>())
            .transpose()
            .map_err(|_| "Estado no válido".to_string())?;
        let technician_id = non_empty(&self.technician_id)
            .map(|s| s.parse::<TechnicianId>())
            .transpose()
            .map_err(|_| "Técnico no válido".to_string())?;
        let scheduled_at = match non_empty(&self.scheduled_at) {
            Some(raw) => Some(parse_local(&raw).ok_or_else(|| "Fecha y hora no válidas".to_string())?),
            None => None,
        };

        Ok(AppointmentUpdate {
            status,
            technician_id,
            scheduled_at,
        })
    }

    /// Redirect target: a local path from the form, or the table.
    #[must_use]
    pub fn back(&self) -> String {
        if self.back.starts_with('/') && !self.back.starts_with("//") {
            self.back.clone()
        } else {
            APPOINTMENTS_PATH.to_string()
        }
    }
}

/// Apply a status, technician or time change.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<AppointmentForm>,
) -> Result<Redirect> {
    let back = form.back();
    let update = match form.to_update() {
        Ok(update) if update.is_empty() => {
            return Ok(reject(&session, &back, "No hay cambios para guardar").await);
        }
        Ok(update) => update,
        Err(message) => return Ok(reject(&session, &back, message).await),
    };

    let outcome = state
        .api()
        .as_user(&admin.backend)
        .update_appointment(AppointmentId::new(id), &update)
        .await
        .map(|appointment| {
            tracing::info!(
                appointment_id = %appointment.id,
                status = %appointment.status,
                "Appointment updated"
            );
            format!("Cita de {} actualizada", appointment.customer_name)
        });
    finish(&session, &back, outcome).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn appointment(value: serde_json::Value) -> Appointment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_row_prefers_confirmed_time() {
        let preferred = AppointmentRow::from(&appointment(json!({
            "id": 1, "customerName": "Ana", "preferredDate": "2026-05-04", "preferredTime": "morning"
        })));
        assert_eq!(preferred.when, "2026-05-04 morning (preferida)");
        assert!(!preferred.scheduled);
        assert!(preferred.when_input.is_empty());

        let confirmed = AppointmentRow::from(&appointment(json!({
            "id": 2, "customerName": "Ana", "preferredDate": "2026-05-04",
            "scheduledAt": "2026-05-05T15:00:00Z", "technicianId": 7, "status": "confirmed"
        })));
        assert!(confirmed.scheduled);
        assert_eq!(confirmed.technician_id, "7");
        assert_eq!(confirmed.cell("status"), "confirmed");
        assert_eq!(confirmed.when_input.len(), 16);
    }

    #[test]
    fn test_unscheduled_rows_sort_last() {
        let rows: Vec<AppointmentRow> = [
            json!({"id": 1, "customerName": "Sin fecha"}),
            json!({"id": 2, "customerName": "Ana", "preferredDate": "2026-05-04"}),
        ]
        .into_iter()
        .map(|v| AppointmentRow::from(&appointment(v)))
        .collect();
        let state = TableState::build(rows, &table_config(), &TableQuery::default());
        assert_eq!(state.rows[0].customer, "Ana");
    }

    #[test]
    fn test_form_builds_partial_update() {
        let form = AppointmentForm {
            status: "confirmed".into(),
            technician_id: " ".into(),
            scheduled_at: "2026-05-05T10:30".into(),
            back: "/technicians/3".into(),
        };
        let update = form.to_update().unwrap();
        assert_eq!(update.status, Some(AppointmentStatus::Confirmed));
        assert_eq!(update.technician_id, None);
        assert!(update.scheduled_at.is_some());
        assert_eq!(form.back(), "/technicians/3");
    }

    #[test]
    fn test_form_rejects_bad_values_and_open_redirects() {
        let bad_time = AppointmentForm {
            scheduled_at: "mañana".into(),
            back: "//evil.example".into(),
            ..AppointmentForm::default()
        };
        assert_eq!(bad_time.to_update(), Err("Fecha y hora no válidas".to_string()));
        assert_eq!(bad_time.back(), APPOINTMENTS_PATH);

        let empty = AppointmentForm::default();
        assert!(empty.to_update().unwrap().is_empty());
    }

    #[test]
    fn test_technician_options_skip_inactive() {
        let technicians: Vec<Technician> = serde_json::from_value(json!([
            {"id": 2, "name": "Pedro"},
            {"id": 1, "name": "Andrés"},
            {"id": 3, "name": "Inactivo", "isActive": false}
        ]))
        .unwrap();
        let labels: Vec<String> = technician_options(&technicians)
            .into_iter()
            .map(|o| o.label)
            .collect();
        assert_eq!(labels, vec!["Andrés", "Pedro"]);
    }
}
