//! Catalog taxonomy: the categories, BTU capacities and conditions offered
//! in the product form and the storefront filters.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use climatech_core::OptionId;
use climatech_core::records::{NewProductOption, OptionKind, ProductOption};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::{AdminPage, finish, non_empty, reject};
use crate::state::AppState;

const OPTIONS_PATH: &str = "/product-options";

/// Options of one kind.
#[derive(Debug, Clone)]
pub struct OptionGroup {
    pub kind: &'static str,
    pub label: &'static str,
    pub options: Vec<ProductOption>,
}

/// One group per kind, in display order, each sorted by position then value.
#[must_use]
pub fn group_options(options: Vec<ProductOption>) -> Vec<OptionGroup> {
    OptionKind::ALL
        .iter()
        .map(|kind| {
            let mut options: Vec<ProductOption> =
                options.iter().filter(|o| o.kind == *kind).cloned().collect();
            options.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.value.cmp(&b.value)));
            OptionGroup {
                kind: kind.as_str(),
                label: kind.label(),
                options,
            }
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "product_options/index.html")]
pub struct ProductOptionsTemplate {
    pub page: AdminPage,
    pub groups: Vec<OptionGroup>,
}

#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<ProductOptionsTemplate> {
    let options = state
        .api()
        .as_user(&admin.backend)
        .list_product_options()
        .await?;
    Ok(ProductOptionsTemplate {
        page: AdminPage::new(&admin, OPTIONS_PATH, &session).await,
        groups: group_options(options),
    })
}

#[derive(Debug, Deserialize)]
pub struct OptionForm {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

impl OptionForm {
    /// # Errors
    ///
    /// Returns a message for an unknown kind or a blank value.
    pub fn validate(&self) -> std::result::Result<NewProductOption, String> {
        let kind = self
            .kind
            .parse::<OptionKind>()
            .map_err(|_| "Tipo de opción no válido".to_string())?;
        let value = non_empty(&self.value).ok_or_else(|| "El valor es obligatorio".to_string())?;
        Ok(NewProductOption { kind, value })
    }
}

#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OptionForm>,
) -> Result<Redirect> {
    let option = match form.validate() {
        Ok(option) => option,
        Err(message) => return Ok(reject(&session, OPTIONS_PATH, message).await),
    };

    let outcome = state
        .api()
        .as_user(&admin.backend)
        .create_product_option(&option)
        .await
        .map(|created| format!("{}: {} agregado", created.kind.label(), created.value));
    finish(&session, OPTIONS_PATH, outcome).await
}

#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    let outcome = state
        .api()
        .as_user(&admin.backend)
        .delete_product_option(OptionId::new(id))
        .await
        .map(|()| "Opción eliminada".to_string());
    finish(&session, OPTIONS_PATH, outcome).await
}
