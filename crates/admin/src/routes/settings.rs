//! Store settings: contact details, social links and shipping rules.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use climatech_core::Email;
use climatech_core::records::StoreSettings;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::{AdminPage, finish, non_empty};
use crate::state::AppState;

const SETTINGS_PATH: &str = "/settings";

/// Settings form data; every field is text as typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub business_hours: String,
    #[serde(default)]
    pub facebook_url: String,
    #[serde(default)]
    pub instagram_url: String,
    #[serde(default)]
    pub shipping_cost: String,
    #[serde(default)]
    pub free_shipping_threshold: String,
}

fn decimal_text(value: Option<Decimal>) -> String {
    value.map(|d| d.normalize().to_string()).unwrap_or_default()
}

impl From<&StoreSettings> for SettingsForm {
    fn from(settings: &StoreSettings) -> Self {
        Self {
            store_name: settings.store_name.clone(),
            phone: settings.phone.clone().unwrap_or_default(),
            whatsapp: settings.whatsapp.clone().unwrap_or_default(),
            email: settings.email.clone().unwrap_or_default(),
            address: settings.address.clone().unwrap_or_default(),
            business_hours: settings.business_hours.clone().unwrap_or_default(),
            facebook_url: settings.facebook_url.clone().unwrap_or_default(),
            instagram_url: settings.instagram_url.clone().unwrap_or_default(),
            shipping_cost: decimal_text(settings.shipping_cost),
            free_shipping_threshold: decimal_text(settings.free_shipping_threshold),
        }
    }
}

fn amount(raw: &str, label: &str, errors: &mut Vec<String>) -> Option<Decimal> {
    let raw = non_empty(raw)?;
    match raw.replace(['.', ','], "").parse::<Decimal>() {
        Ok(value) if !value.is_sign_negative() => Some(value),
        _ => {
            errors.push(format!("{label} debe ser un valor en pesos"));
            None
        }
    }
}

fn link(raw: &str, label: &str, errors: &mut Vec<String>) -> Option<String> {
    let url = non_empty(raw)?;
    if url.starts_with("https://") {
        Some(url)
    } else {
        errors.push(format!("{label} debe empezar con https://"));
        None
    }
}

impl SettingsForm {
    /// Apply the form on top of `current`, keeping its extra `data`.
    ///
    /// # Errors
    ///
    /// Returns every problem found, worded for staff.
    pub fn apply(&self, current: StoreSettings) -> std::result::Result<StoreSettings, Vec<String>> {
        let mut errors = Vec::new();

        let store_name = self.store_name.trim().to_string();
        if store_name.is_empty() {
            errors.push("El nombre de la tienda es obligatorio".to_string());
        }
        let email = non_empty(&self.email);
        if let Some(raw) = &email
            && Email::parse(raw).is_err()
        {
            errors.push("El correo de contacto no es válido".to_string());
        }
        let shipping_cost = amount(&self.shipping_cost, "El costo de envío", &mut errors);
        let free_shipping_threshold = amount(
            &self.free_shipping_threshold,
            "El mínimo para envío gratis",
            &mut errors,
        );
        let facebook_url = link(&self.facebook_url, "El enlace de Facebook", &mut errors);
        let instagram_url = link(&self.instagram_url, "El enlace de Instagram", &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(StoreSettings {
            store_name,
            phone: non_empty(&self.phone),
            whatsapp: non_empty(&self.whatsapp),
            email,
            address: non_empty(&self.address),
            business_hours: non_empty(&self.business_hours),
            facebook_url,
            instagram_url,
            shipping_cost,
            free_shipping_threshold,
            data: current.data,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub page: AdminPage,
    pub form: SettingsForm,
    pub errors: Vec<String>,
}

#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<SettingsTemplate> {
    let settings = state.api().as_user(&admin.backend).store_settings().await?;
    Ok(SettingsTemplate {
        page: AdminPage::new(&admin, SETTINGS_PATH, &session).await,
        form: SettingsForm::from(&settings),
        errors: Vec::new(),
    })
}

#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    let api = state.api().as_user(&admin.backend);
    let current = api.store_settings().await?;

    let settings = match form.apply(current) {
        Ok(settings) => settings,
        Err(errors) => {
            return Ok(SettingsTemplate {
                page: AdminPage::new(&admin, SETTINGS_PATH, &session).await,
                form,
                errors,
            }
            .into_response());
        }
    };

    let outcome = api
        .update_store_settings(&settings)
        .await
        .map(|_| "Configuración guardada".to_string());
    Ok(finish(&session, SETTINGS_PATH, outcome)
        .await?
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn current() -> StoreSettings {
        serde_json::from_value(json!({
            "storeName": "Climatech",
            "shippingCost": 25000,
            "data": {"heroTagline": "Frío en casa"}
        }))
        .unwrap()
    }

    #[test]
    fn test_apply_keeps_extra_data_and_parses_amounts() {
        let form = SettingsForm {
            store_name: "Climatech Cali".into(),
            shipping_cost: "30.000".into(),
            free_shipping_threshold: "".into(),
            instagram_url: "https://instagram.com/climatech".into(),
            ..SettingsForm::default()
        };
        let settings = form.apply(current()).unwrap();
        assert_eq!(settings.shipping_cost, Some(Decimal::from(30_000)));
        assert_eq!(settings.free_shipping_threshold, None);
        assert_eq!(settings.data["heroTagline"], json!("Frío en casa"));
        assert_eq!(settings.phone, None);
    }

    #[test]
    fn test_apply_collects_every_error() {
        let form = SettingsForm {
            email: "ventas@".into(),
            shipping_cost: "-1".into(),
            facebook_url: "http://facebook.com/x".into(),
            ..SettingsForm::default()
        };
        let errors = form.apply(current()).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_form_prefills_from_settings() {
        let form = SettingsForm::from(&current());
        assert_eq!(form.store_name, "Climatech");
        assert_eq!(form.shipping_cost, "25000");
    }
}
