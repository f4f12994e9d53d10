//! Content screens: slides, products, services, FAQs and advantages.
//!
//! All five types share one record shape on the backend, so one set of
//! handlers serves them, keyed by the `{content_type}` path segment.
//! Type-specific attributes go into the record's `data` bag; keys the form
//! does not know about are preserved on update.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use climatech_core::content::sort_for_display;
use climatech_core::{Content, ContentId, ContentInput, ContentType, parse_price_text};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{
    DataTableConfig, SortDir, SortValue, TableColumn, TableFilter, TableQuery, TableRow,
    TableState,
};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::{AdminPage, finish, non_empty};
use crate::state::AppState;

/// Resolve the path segment to a type editable from these screens.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown types and for store settings,
/// which have their own screen.
pub fn editable_type(raw: &str) -> Result<ContentType> {
    raw.parse::<ContentType>()
        .ok()
        .filter(|t| ContentType::EDITABLE.contains(t))
        .ok_or_else(|| AppError::NotFound(format!("content type {raw}")))
}

fn list_path(content_type: ContentType) -> String {
    format!("/content/{}", content_type.as_str())
}

// =============================================================================
// Table
// =============================================================================

/// Content record as a table row.
#[derive(Debug, Clone)]
pub struct ContentRow {
    pub id: ContentId,
    pub title: String,
    pub image_url: Option<String>,
    pub price: String,
    pub price_value: Option<Decimal>,
    pub category: String,
    pub order: i32,
    pub is_active: bool,
    /// 0-based position in display order, used by the reorder buttons.
    pub position: usize,
    pub is_first: bool,
    pub is_last: bool,
}

impl TableRow for ContentRow {
    fn cell(&self, key: &str) -> String {
        match key {
            "title" => self.title.clone(),
            "price" => self.price.clone(),
            "category" => self.category.clone(),
            "order" => self.order.to_string(),
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

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "price" => self.price_value.map_or(SortValue::Empty, SortValue::number),
            "order" => SortValue::number(self.order),
            other => SortValue::text(&self.cell(other)),
        }
    }
}

/// Rows in display order, each knowing its position.
fn rows(mut items: Vec<Content>) -> Vec<ContentRow> {
    sort_for_display(&mut items);
    let last = items.len().saturating_sub(1);
    items
        .iter()
        .enumerate()
        .map(|(position, item)| ContentRow {
            id: item.id,
            title: item.title.clone(),
            image_url: item.image_url.clone(),
            price: item.price_display().unwrap_or_default(),
            price_value: item.price_value(),
            category: item.category().unwrap_or_default(),
            order: item.order,
            is_active: item.is_active,
            position,
            is_first: position == 0,
            is_last: position == last,
        })
        .collect()
}

fn table_config(content_type: ContentType) -> DataTableConfig {
    let mut config = DataTableConfig::new(&list_path(content_type))
        .column(TableColumn::sortable("order", "#"))
        .column(TableColumn::sortable("title", "Título"));
    if content_type == ContentType::Product {
        config = config.column(TableColumn::sortable("category", "Categoría"));
    }
    if content_type.has_price() {
        config = config.column(TableColumn::sortable("price", "Precio"));
    }
    config
        .column(TableColumn::sortable("status", "Estado"))
        .filter(TableFilter {
            key: "status",
            label: "Estado",
            options: vec![
                ("active".into(), "Activos".into()),
                ("inactive".into(), "Inactivos".into()),
            ],
        })
        .search_placeholder(&format!(
            "Buscar {}...",
            content_type.plural_label().to_lowercase()
        ))
        .empty_state(&format!(
            "No hay {} todavía",
            content_type.plural_label().to_lowercase()
        ))
        .default_sort("order", SortDir::Asc)
}

#[derive(Template, WebTemplate)]
#[template(path = "content/index.html")]
pub struct ContentIndexTemplate {
    pub page: AdminPage,
    pub content_type: ContentType,
    pub table: TableState<ContentRow>,
    /// Slides get move up/down controls.
    pub reorderable: bool,
}

/// Table of records of one type.
#[instrument(skip(admin, state, session, query))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(content_type): Path<String>,
    Query(query): Query<TableQuery>,
) -> Result<ContentIndexTemplate> {
    let content_type = editable_type(&content_type)?;
    let items = state
        .api()
        .as_user(&admin.backend)
        .list_content(content_type)
        .await?;

    let table = TableState::build(rows(items), &table_config(content_type), &query);
    Ok(ContentIndexTemplate {
        page: AdminPage::new(&admin, list_path(content_type), &session).await,
        content_type,
        table,
        reorderable: content_type == ContentType::Slide,
    })
}

// =============================================================================
// Form
// =============================================================================

/// Content form data. Type-specific fields are ignored for types that do
/// not use them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub price_numeric: String,
    #[serde(default)]
    pub order: String,
    /// Checkbox: present when checked.
    #[serde(default)]
    pub is_active: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub btu_capacity: String,
    #[serde(default)]
    pub condition: String,
    /// One feature per line.
    #[serde(default)]
    pub features: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub link_url: String,
}

impl From<&Content> for ContentForm {
    fn from(content: &Content) -> Self {
        Self {
            title: content.title.clone(),
            description: content.description.clone(),
            image_url: content.image_url.clone().unwrap_or_default(),
            price: content.price.clone().unwrap_or_default(),
            price_numeric: content
                .price_numeric
                .map(|p| p.normalize().to_string())
                .unwrap_or_default(),
            order: content.order.to_string(),
            is_active: content.is_active.then(|| "on".to_string()),
            category: content.category().unwrap_or_default(),
            btu_capacity: content.btu_capacity().unwrap_or_default(),
            condition: content.condition().unwrap_or_default(),
            features: content.features().join("\n"),
            icon: content.icon().unwrap_or_default(),
            link_url: content.link_url().unwrap_or_default(),
        }
    }
}

/// Set or clear a string key in the `data` bag.
fn put(data: &mut Map<String, Value>, key: &str, value: &str) {
    match non_empty(value) {
        Some(value) => {
            data.insert(key.to_string(), Value::String(value));
        }
        None => {
            data.remove(key);
        }
    }
}

impl ContentForm {
    /// Whether the active checkbox is ticked.
    #[must_use]
    pub const fn active(&self) -> bool {
        self.is_active.is_some()
    }

    /// Validate into a request body, merging type-specific fields into
    /// `data` (the record's current bag on update, empty on create).
    ///
    /// # Errors
    ///
    /// Returns the list of messages to show next to the form.
    pub fn into_input(
        &self,
        content_type: ContentType,
        mut data: Map<String, Value>,
    ) -> std::result::Result<ContentInput, Vec<String>> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(if content_type == ContentType::Faq {
                "La pregunta es obligatoria".to_string()
            } else {
                "El título es obligatorio".to_string()
            });
        }

        let order = match self.order.trim() {
            "" => 0,
            raw => raw.parse::<i32>().unwrap_or_else(|_| {
                errors.push("La posición debe ser un número entero".to_string());
                0
            }),
        };

        let price = if content_type.has_price() {
            non_empty(&self.price)
        } else {
            None
        };
        let price_numeric = if content_type.has_price() {
            match self.price_numeric.trim() {
                "" => price.as_deref().and_then(parse_price_text),
                raw => match raw.parse::<Decimal>() {
                    Ok(value) if value.is_sign_negative() => {
                        errors.push("El precio no puede ser negativo".to_string());
                        None
                    }
                    Ok(value) => Some(value),
                    Err(_) => {
                        errors.push("El precio numérico no es válido".to_string());
                        None
                    }
                },
            }
        } else {
            None
        };

        let image_url = non_empty(&self.image_url);
        if let Some(url) = &image_url
            && !(url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/'))
        {
            errors.push("La imagen debe ser una URL".to_string());
        }

        match content_type {
            ContentType::Product => {
                put(&mut data, "category", &self.category);
                put(&mut data, "btuCapacity", &self.btu_capacity);
                put(&mut data, "condition", &self.condition);
                let features: Vec<Value> = self
                    .features
                    .lines()
                    .filter_map(non_empty)
                    .map(Value::String)
                    .collect();
                if features.is_empty() {
                    data.remove("features");
                } else {
                    data.insert("features".to_string(), Value::Array(features));
                }
            }
            ContentType::Service | ContentType::Advantage => put(&mut data, "icon", &self.icon),
            ContentType::Slide => put(&mut data, "linkUrl", &self.link_url),
            ContentType::Faq | ContentType::Setting => {}
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ContentInput {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            image_url,
            price,
            price_numeric,
            order,
            is_active: self.active(),
            data,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "content/form.html")]
pub struct ContentFormTemplate {
    pub page: AdminPage,
    pub content_type: ContentType,
    /// Form target.
    pub action: String,
    pub is_new: bool,
    pub form: ContentForm,
    pub errors: Vec<String>,
}

impl ContentFormTemplate {
    async fn render(
        admin: &crate::models::CurrentAdmin,
        session: &Session,
        content_type: ContentType,
        id: Option<ContentId>,
        form: ContentForm,
        errors: Vec<String>,
    ) -> Self {
        let action = id.map_or_else(
            || list_path(content_type),
            |id| format!("{}/{id}", list_path(content_type)),
        );
        Self {
            page: AdminPage::new(admin, list_path(content_type), session).await,
            content_type,
            action,
            is_new: id.is_none(),
            form,
            errors,
        }
    }
}

/// New record form. Position defaults to the end of the list.
#[instrument(skip(admin, state, session))]
pub async fn new(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(content_type): Path<String>,
) -> Result<ContentFormTemplate> {
    let content_type = editable_type(&content_type)?;
    let items = state
        .api()
        .as_user(&admin.backend)
        .list_content(content_type)
        .await?;
    let next_order = items.iter().map(|c| c.order).max().unwrap_or(0) + 1;

    let form = ContentForm {
        order: next_order.to_string(),
        is_active: Some("on".to_string()),
        ..ContentForm::default()
    };
    Ok(ContentFormTemplate::render(&admin, &session, content_type, None, form, Vec::new()).await)
}

/// Create a record.
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(content_type): Path<String>,
    Form(form): Form<ContentForm>,
) -> Result<Response> {
    let content_type = editable_type(&content_type)?;
    let input = match form.into_input(content_type, Map::new()) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                ContentFormTemplate::render(&admin, &session, content_type, None, form, errors)
                    .await
                    .into_response(),
            );
        }
    };

    let outcome = state
        .api()
        .as_user(&admin.backend)
        .create_content(content_type, &input)
        .await
        .map(|created| {
            tracing::info!(id = %created.id, content_type = %content_type, "Content created");
            format!("{} creado", content_type.label())
        });
    Ok(finish(&session, &list_path(content_type), outcome)
        .await?
        .into_response())
}

/// Edit form for an existing record.
#[instrument(skip(admin, state, session))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((content_type, id)): Path<(String, i64)>,
) -> Result<ContentFormTemplate> {
    let content_type = editable_type(&content_type)?;
    let id = ContentId::new(id);
    let item = state
        .api()
        .as_user(&admin.backend)
        .get_content(content_type, id)
        .await?;

    Ok(ContentFormTemplate::render(
        &admin,
        &session,
        content_type,
        Some(id),
        ContentForm::from(&item),
        Vec::new(),
    )
    .await)
}

/// Update a record.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((content_type, id)): Path<(String, i64)>,
    Form(form): Form<ContentForm>,
) -> Result<Response> {
    let content_type = editable_type(&content_type)?;
    let id = ContentId::new(id);
    let api = state.api().as_user(&admin.backend);
    let existing = api.get_content(content_type, id).await?;

    let input = match form.into_input(content_type, existing.data) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                ContentFormTemplate::render(&admin, &session, content_type, Some(id), form, errors)
                    .await
                    .into_response(),
            );
        }
    };

    let outcome = api
        .update_content(content_type, id, &input)
        .await
        .map(|_| format!("{} actualizado", content_type.label()));
    Ok(finish(&session, &list_path(content_type), outcome)
        .await?
        .into_response())
}

/// Flip the active flag.
#[instrument(skip(admin, state, session))]
pub async fn toggle(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((content_type, id)): Path<(String, i64)>,
) -> Result<Redirect> {
    let content_type = editable_type(&content_type)?;
    let api = state.api().as_user(&admin.backend);
    let item = api.get_content(content_type, ContentId::new(id)).await?;

    let outcome = api
        .set_content_active(&item, !item.is_active)
        .await
        .map(|updated| {
            if updated.is_active {
                format!("{} activado", content_type.label())
            } else {
                format!("{} desactivado", content_type.label())
            }
        });
    finish(&session, &list_path(content_type), outcome).await
}

/// Delete a record.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((content_type, id)): Path<(String, i64)>,
) -> Result<Redirect> {
    let content_type = editable_type(&content_type)?;
    let outcome = state
        .api()
        .as_user(&admin.backend)
        .delete_content(content_type, ContentId::new(id))
        .await
        .map(|()| {
            tracing::info!(id, content_type = %content_type, "Content deleted");
            format!("{} eliminado", content_type.label())
        });
    finish(&session, &list_path(content_type), outcome).await
}
