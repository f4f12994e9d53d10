//! Installation and maintenance appointment requests.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDate};
use climatech_core::records::{NewAppointment, Technician};
use climatech_core::{ContentId, ContentType, Email};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::PageContext;
use crate::routes::home::section;
use crate::routes::pages::ServiceCard;
use crate::state::AppState;

/// Time windows offered to customers: wire value and label.
pub const TIME_SLOTS: &[(&str, &str)] = &[
    ("morning", "Mañana (8:00 a 12:00)"),
    ("afternoon", "Tarde (14:00 a 18:00)"),
];

/// Appointment request form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentForm {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub preferred_date: String,
    #[serde(default)]
    pub preferred_time: String,
    #[serde(default)]
    pub notes: String,
}

impl AppointmentForm {
    /// Validate into a request body. Dates before `today` are rejected.
    ///
    /// # Errors
    ///
    /// Returns the list of messages to show next to the form.
    pub fn validate(&self, today: NaiveDate) -> std::result::Result<NewAppointment, Vec<String>> {
        let mut errors = Vec::new();
        for (value, message) in [
            (&self.name, "El nombre es obligatorio"),
            (&self.phone, "El teléfono es obligatorio"),
            (&self.address, "La dirección es obligatoria"),
            (&self.city, "La ciudad es obligatoria"),
        ] {
            if value.trim().is_empty() {
                errors.push(message.to_string());
            }
        }

        let email = Email::parse(&self.email)
            .map_err(|_| errors.push("Ingresa un correo electrónico válido".to_string()))
            .ok();

        let date = match NaiveDate::parse_from_str(self.preferred_date.trim(), "%Y-%m-%d") {
            Ok(date) if date < today => {
                errors.push("La fecha no puede estar en el pasado".to_string());
                None
            }
            Ok(date) => Some(date),
            Err(_) => {
                errors.push("Selecciona una fecha".to_string());
                None
            }
        };

        if !TIME_SLOTS.iter().any(|(v, _)| *v == self.preferred_time) {
            errors.push("Selecciona una franja horaria".to_string());
        }

        let service_id = self.service_id.trim().parse::<i64>().ok().map(ContentId::new);

        match (email, date) {
            (Some(email), Some(date)) if errors.is_empty() => Ok(NewAppointment {
                service_id,
                customer_name: self.name.trim().to_string(),
                customer_email: email,
                customer_phone: self.phone.trim().to_string(),
                address: self.address.trim().to_string(),
                city: self.city.trim().to_string(),
                preferred_date: date,
                preferred_time: self.preferred_time.clone(),
                notes: Some(self.notes.trim().to_string()).filter(|n| !n.is_empty()),
            }),
            _ => Err(errors),
        }
    }
}

/// Service choice for the select box.
#[derive(Clone)]
pub struct ServiceChoice {
    pub id: ContentId,
    pub title: String,
    pub selected: bool,
}

/// Time window radio button.
#[derive(Clone)]
pub struct SlotChoice {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn slot_choices(selected: &str) -> Vec<SlotChoice> {
    TIME_SLOTS
        .iter()
        .map(|&(value, label)| SlotChoice {
            value,
            label,
            selected: value == selected,
        })
        .collect()
}

/// Technician shown under the form.
#[derive(Clone)]
pub struct TechnicianView {
    pub name: String,
    pub specialty: Option<String>,
}

impl From<&Technician> for TechnicianView {
    fn from(technician: &Technician) -> Self {
        Self {
            name: technician.name.clone(),
            specialty: technician.specialty.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "appointments/new.html")]
pub struct AppointmentFormTemplate {
    pub page: PageContext,
    pub services: Vec<ServiceChoice>,
    pub technicians: Vec<TechnicianView>,
    pub time_slots: Vec<SlotChoice>,
    pub form: AppointmentForm,
    pub min_date: String,
    pub errors: Vec<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "appointments/created.html")]
pub struct AppointmentCreatedTemplate {
    pub page: PageContext,
    pub customer_name: String,
    pub date: String,
    pub time_slot: String,
    pub service: Option<String>,
}

/// `?service=<id>` preselects a service.
#[derive(Debug, Default, Deserialize)]
pub struct NewQuery {
    pub service: Option<i64>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn service_choices(services: &[ServiceCard], selected: &str) -> Vec<ServiceChoice> {
    services
        .iter()
        .map(|s| ServiceChoice {
            id: s.id,
            title: s.title.clone(),
            selected: s.id.to_string() == selected,
        })
        .collect()
}

async fn technicians(state: &AppState) -> Vec<TechnicianView> {
    match state.backend().list_technicians().await {
        Ok(technicians) => technicians.iter().map(TechnicianView::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load technicians");
            Vec::new()
        }
    }
}

async fn form_page(
    state: &AppState,
    session: &Session,
    nonce: CspNonce,
    form: AppointmentForm,
    errors: Vec<String>,
) -> AppointmentFormTemplate {
    let (services, technicians) = tokio::join!(
        section(state, ContentType::Service),
        technicians(state)
    );
    let services: Vec<ServiceCard> = services.iter().map(ServiceCard::from).collect();

    AppointmentFormTemplate {
        page: PageContext::load(state, session, nonce).await,
        services: service_choices(&services, &form.service_id),
        technicians,
        time_slots: slot_choices(&form.preferred_time),
        form,
        min_date: today().format("%Y-%m-%d").to_string(),
        errors,
    }
}

/// Display the appointment request form.
#[instrument(skip(state, session, nonce))]
pub async fn new(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Query(query): Query<NewQuery>,
) -> AppointmentFormTemplate {
    let form = AppointmentForm {
        service_id: query.service.map(|id| id.to_string()).unwrap_or_default(),
        ..AppointmentForm::default()
    };
    form_page(&state, &session, nonce, form, Vec::new()).await
}

/// Submit an appointment request.
#[instrument(skip(state, session, nonce, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Form(form): Form<AppointmentForm>,
) -> Result<Response> {
    let request = match form.validate(today()) {
        Ok(request) => request,
        Err(errors) => {
            return Ok(form_page(&state, &session, nonce, form, errors)
                .await
                .into_response());
        }
    };

    let appointment = state.backend().create_appointment(&request).await?;
    let appointment_id = appointment.id.to_string();
    add_breadcrumb(
        "appointments",
        "Appointment requested",
        Some(&[("appointment_id", appointment_id.as_str())]),
    );
    tracing::info!(appointment_id = %appointment.id, date = %request.preferred_date, "Appointment requested");

    let time_slot = TIME_SLOTS
        .iter()
        .find(|(v, _)| *v == request.preferred_time)
        .map_or(request.preferred_time.clone(), |(_, label)| (*label).to_string());

    Ok(AppointmentCreatedTemplate {
        page: PageContext::load(&state, &session, nonce).await,
        customer_name: request.customer_name,
        date: request.preferred_date.format("%d/%m/%Y").to_string(),
        time_slot,
        service: appointment.service_name,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 10).unwrap()
    }

    fn form() -> AppointmentForm {
        AppointmentForm {
            service_id: "7".into(),
            name: "Luis".into(),
            email: "luis@correo.co".into(),
            phone: "3109876543".into(),
            address: "Carrera 7 # 12-30".into(),
            city: "Bogotá".into(),
            preferred_date: "2026-05-12".into(),
            preferred_time: "morning".into(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_validate_builds_request() {
        let request = form().validate(today()).unwrap();
        assert_eq!(request.service_id, Some(ContentId::new(7)));
        assert_eq!(request.preferred_date, NaiveDate::from_ymd_opt(2026, 5, 12).unwrap());
        assert_eq!(request.notes, None);
    }

    #[test]
    fn test_validate_accepts_today_rejects_past() {
        let same_day = AppointmentForm {
            preferred_date: "2026-05-10".into(),
            ..form()
        };
        assert!(same_day.validate(today()).is_ok());

        let past = AppointmentForm {
            preferred_date: "2026-05-09".into(),
            ..form()
        };
        let errors = past.validate(today()).unwrap_err();
        assert_eq!(errors, vec!["La fecha no puede estar en el pasado".to_string()]);
    }

    #[test]
    fn test_validate_rejects_unknown_slot_and_bad_date() {
        let bad = AppointmentForm {
            preferred_date: "12/05/2026".into(),
            preferred_time: "night".into(),
            ..form()
        };
        assert_eq!(bad.validate(today()).unwrap_err().len(), 2);
    }

    #[test]
    fn test_service_is_optional() {
        let general = AppointmentForm {
            service_id: String::new(),
            ..form()
        };
        assert_eq!(general.validate(today()).unwrap().service_id, None);
    }

    #[test]
    fn test_slot_choices_mark_selection() {
        let slots = slot_choices("afternoon");
        assert_eq!(slots.len(), TIME_SLOTS.len());
        assert!(!slots[0].selected);
        assert!(slots[1].selected);
    }

    #[test]
    fn test_service_choices_mark_selection() {
        let services = vec![
            ServiceCard {
                id: ContentId::new(1),
                title: "Instalación".into(),
                description: String::new(),
                price: None,
                image_url: None,
            },
            ServiceCard {
                id: ContentId::new(2),
                title: "Mantenimiento".into(),
                description: String::new(),
                price: None,
                image_url: None,
            },
        ];
        let choices = service_choices(&services, "2");
        assert!(!choices[0].selected);
        assert!(choices[1].selected);
    }
}
