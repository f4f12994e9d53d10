//! Technician roster and per-technician schedule.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::NaiveDate;
use climatech_core::TechnicianId;
use climatech_core::records::{Appointment, Technician, TechnicianInput};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::AuthorizedApi;
use crate::components::{
    DataTableConfig, SortDir, TableColumn, TableFilter, TableQuery, TableRow, TableState,
};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::appointments::{AppointmentRow, SelectOption, status_options};
use crate::routes::{AdminPage, finish, non_empty, reject};
use crate::state::AppState;

const TECHNICIANS_PATH: &str = "/technicians";

impl TableRow for Technician {
    fn cell(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "phone" => self.phone.clone().unwrap_or_default(),
            "email" => self.email.clone().unwrap_or_default(),
            "specialty" => self.specialty.clone().unwrap_or_default(),
            "status" => if self.is_active { "active" } else { "inactive" }.to_string(),
            _ => String::new(),
        }
    }

    fn search_text(&self, key: &str) -> String {
        match key {
            "status" => if self.is_active { "Activo" } else { "Inactivo" }.to_string(),
            other => self.cell(other),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig::new(TECHNICIANS_PATH)
        .column(TableColumn::sortable("name", "Nombre"))
        .column(TableColumn::new("phone", "Teléfono"))
        .column(TableColumn::new("email", "Correo"))
        .column(TableColumn::sortable("specialty", "Especialidad"))
        .column(TableColumn::sortable("status", "Estado"))
        .filter(TableFilter {
            key: "status",
            label: "Estado",
            options: vec![
                ("active".into(), "Activos".into()),
                ("inactive".into(), "Inactivos".into()),
            ],
        })
        .search_placeholder("Buscar técnico...")
        .empty_state("No hay técnicos registrados")
        .default_sort("name", SortDir::Asc)
}

#[derive(Template, WebTemplate)]
#[template(path = "technicians/index.html")]
pub struct TechniciansIndexTemplate {
    pub page: AdminPage,
    pub table: TableState<Technician>,
}

#[instrument(skip(admin, state, session, query))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TableQuery>,
) -> Result<TechniciansIndexTemplate> {
    let technicians = state.api().as_user(&admin.backend).list_technicians().await?;
    Ok(TechniciansIndexTemplate {
        page: AdminPage::new(&admin, TECHNICIANS_PATH, &session).await,
        table: TableState::build(technicians, &table_config(), &query),
    })
}

/// New technician form data.
#[derive(Debug, Default, Deserialize)]
pub struct TechnicianForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub specialty: String,
}

impl TechnicianForm {
    /// Validate into a request body. New technicians start active.
    ///
    /// # Errors
    ///
    /// Returns a message when the name is missing.
    pub fn validate(&self) -> std::result::Result<TechnicianInput, String> {
        let name = non_empty(&self.name).ok_or_else(|| "El nombre es obligatorio".to_string())?;
        Ok(TechnicianInput {
            name,
            phone: non_empty(&self.phone),
            email: non_empty(&self.email),
            specialty: non_empty(&self.specialty),
            is_active: true,
        })
    }
}

#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<TechnicianForm>,
) -> Result<Redirect> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(message) => return Ok(reject(&session, TECHNICIANS_PATH, message).await),
    };

    let outcome = state
        .api()
        .as_user(&admin.backend)
        .create_technician(&input)
        .await
        .map(|technician| format!("Técnico {} registrado", technician.name));
    finish(&session, TECHNICIANS_PATH, outcome).await
}

async fn find_technician(
    api: AuthorizedApi<'_>,
    id: TechnicianId,
) -> Result<Technician> {
    api.list_technicians()
        .await?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| AppError::NotFound(format!("technician {id}")))
}

/// Take a technician off (or back onto) the roster.
#[instrument(skip(admin, state, session))]
pub async fn toggle(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    let api = state.api().as_user(&admin.backend);
    let technician = find_technician(api, TechnicianId::new(id)).await?;

    let outcome = api
        .set_technician_active(&technician, !technician.is_active)
        .await
        .map(|updated| {
            if updated.is_active {
                format!("{} activado", updated.name)
            } else {
                format!("{} desactivado", updated.name)
            }
        });
    finish(&session, TECHNICIANS_PATH, outcome).await
}

/// A day on a technician's schedule.
#[derive(Debug, Clone)]
pub struct ScheduleDay {
    /// `None` collects appointments with no date yet.
    pub day: Option<NaiveDate>,
    pub label: String,
    pub appointments: Vec<AppointmentRow>,
}

/// Open appointments assigned to `technician`, grouped by day in date order.
/// Undated appointments come last.
#[must_use]
pub fn schedule_for(technician: TechnicianId, appointments: &[Appointment]) -> Vec<ScheduleDay> {
    let mut mine: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.technician_id == Some(technician) && a.status.is_open())
        .collect();
    mine.sort_by_key(|a| (a.day().is_none(), a.day(), a.scheduled_at));

    let mut days: Vec<ScheduleDay> = Vec::new();
    for appointment in mine {
        let day = appointment.day();
        match days.last_mut() {
            Some(current) if current.day == day => {
                current.appointments.push(AppointmentRow::from(appointment));
            }
            _ => days.push(ScheduleDay {
                day,
                label: day.map_or_else(
                    || "Sin fecha".to_string(),
                    |d| d.format("%Y-%m-%d").to_string(),
                ),
                appointments: vec![AppointmentRow::from(appointment)],
            }),
        }
    }
    days
}

#[derive(Template, WebTemplate)]
#[template(path = "technicians/schedule.html")]
pub struct ScheduleTemplate {
    pub page: AdminPage,
    pub technician: Technician,
    pub days: Vec<ScheduleDay>,
    pub statuses: Vec<SelectOption>,
    /// Form `back` value so updates return here.
    pub back: String,
}

/// Upcoming visits for one technician.
#[instrument(skip(admin, state, session))]
pub async fn schedule(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<ScheduleTemplate> {
    let api = state.api().as_user(&admin.backend);
    let id = TechnicianId::new(id);
    let (technician, appointments) = tokio::join!(find_technician(api, id), api.list_appointments());
    let technician = technician?;
    let appointments = appointments?;

    Ok(ScheduleTemplate {
        page: AdminPage::new(&admin, TECHNICIANS_PATH, &session).await,
        days: schedule_for(technician.id, &appointments),
        statuses: status_options(),
        back: format!("{TECHNICIANS_PATH}/{id}"),
        technician,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_schedule_groups_open_visits_by_day() {
        let appointments: Vec<Appointment> = serde_json::from_value(json!([
            {"id": 1, "customerName": "A", "technicianId": 5, "scheduledAt": "2026-05-06T14:00:00Z", "status": "confirmed"},
            {"id": 2, "customerName": "B", "technicianId": 5, "preferredDate": "2026-05-05"},
            {"id": 3, "customerName": "C", "technicianId": 5, "scheduledAt": "2026-05-06T13:00:00Z", "status": "confirmed"},
            {"id": 4, "customerName": "D", "technicianId": 5, "status": "completed", "preferredDate": "2026-05-05"},
            {"id": 5, "customerName": "E", "technicianId": 9, "preferredDate": "2026-05-05"},
            {"id": 6, "customerName": "F", "technicianId": 5}
        ]))
        .unwrap();

        let days = schedule_for(TechnicianId::new(5), &appointments);
        let shape: Vec<(String, Vec<&str>)> = days
            .iter()
            .map(|d| {
                (
                    d.label.clone(),
                    d.appointments.iter().map(|a| a.customer.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(shape[0], ("2026-05-05".to_string(), vec!["B"]));
        assert_eq!(shape[1].1, vec!["C", "A"]);
        assert_eq!(shape[2], ("Sin fecha".to_string(), vec!["F"]));
        assert_eq!(shape.len(), 3);
    }

    #[test]
    fn test_technician_form_requires_name() {
        assert!(TechnicianForm::default().validate().is_err());
        let input = TechnicianForm {
            name: "Pedro".into(),
            phone: "300 111 2233".into(),
            ..TechnicianForm::default()
        }
        .validate()
        .unwrap();
        assert!(input.is_active);
        assert_eq!(input.email, None);
    }
}
