//! Back-office user management. Admin role only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use climatech_core::records::{NewUser, User};
use climatech_core::{Email, UserId, UserRole};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{
    DataTableConfig, SortDir, TableColumn, TableFilter, TableQuery, TableRow, TableState,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminRole;
use crate::routes::{AdminPage, finish, reject};
use crate::state::AppState;

const USERS_PATH: &str = "/users";

/// Shortest password accepted for new accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

impl TableRow for User {
    fn cell(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "email" => self.email.clone(),
            "role" => self.role.as_str().to_string(),
            "status" => if self.is_active { "active" } else { "inactive" }.to_string(),
            _ => String::new(),
        }
    }

    fn search_text(&self, key: &str) -> String {
        match key {
            "role" => self.role.label().to_string(),
            "status" => if self.is_active { "Activo" } else { "Inactivo" }.to_string(),
            other => self.cell(other),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig::new(USERS_PATH)
        .column(TableColumn::sortable("name", "Nombre"))
        .column(TableColumn::sortable("email", "Correo"))
        .column(TableColumn::sortable("role", "Rol"))
        .column(TableColumn::new("status", "Estado"))
        .filter(TableFilter {
            key: "role",
            label: "Rol",
            options: UserRole::ALL
                .iter()
                .map(|r| (r.as_str().to_string(), r.label().to_string()))
                .collect(),
        })
        .search_placeholder("Buscar por nombre o correo...")
        .empty_state("No hay usuarios")
        .default_sort("name", SortDir::Asc)
}

/// Role choice for the select boxes.
#[derive(Debug, Clone)]
pub struct RoleChoice {
    pub value: &'static str,
    pub label: &'static str,
}

fn role_choices() -> Vec<RoleChoice> {
    UserRole::ALL
        .iter()
        .map(|r| RoleChoice {
            value: r.as_str(),
            label: r.label(),
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub page: AdminPage,
    pub table: TableState<User>,
    pub roles: Vec<RoleChoice>,
    /// The signed-in admin, who cannot demote or delete themselves.
    pub self_id: UserId,
}

#[instrument(skip(admin, state, session, query))]
pub async fn index(
    RequireAdminRole(admin): RequireAdminRole,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TableQuery>,
) -> Result<UsersIndexTemplate> {
    let users = state.api().as_user(&admin.backend).list_users().await?;
    Ok(UsersIndexTemplate {
        page: AdminPage::new(&admin, USERS_PATH, &session).await,
        table: TableState::build(users, &table_config(), &query),
        roles: role_choices(),
        self_id: admin.user.id,
    })
}

/// New user form data.
#[derive(Debug, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

impl UserForm {
    /// Validate into a request body.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, worded for staff.
    pub fn validate(&self) -> std::result::Result<NewUser, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("El nombre es obligatorio".to_string());
        }
        let email = Email::parse(&self.email).map_err(|_| "Correo no válido".to_string())?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
            ));
        }
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(|_| "Rol no válido".to_string())?;

        Ok(NewUser {
            name: name.to_string(),
            email,
            password: self.password.clone(),
            role,
        })
    }
}

/// Create a user.
#[instrument(skip(admin, state, session, form), fields(email = %form.email))]
pub async fn create(
    RequireAdminRole(admin): RequireAdminRole,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UserForm>,
) -> Result<Redirect> {
    let new_user = match form.validate() {
        Ok(user) => user,
        Err(message) => return Ok(reject(&session, USERS_PATH, message).await),
    };

    let outcome = state
        .api()
        .as_user(&admin.backend)
        .create_user(&new_user)
        .await
        .map(|user| {
            tracing::info!(user_id = %user.id, role = %user.role, "User created");
            format!("Usuario {} creado", user.email)
        });
    finish(&session, USERS_PATH, outcome).await
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

/// Change a user's role.
#[instrument(skip(admin, state, session, form))]
pub async fn update_role(
    RequireAdminRole(admin): RequireAdminRole,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect> {
    let id = UserId::new(id);
    if id == admin.user.id {
        return Ok(reject(&session, USERS_PATH, "No puedes cambiar tu propio rol").await);
    }
    let Ok(role) = form.role.parse::<UserRole>() else {
        return Ok(reject(&session, USERS_PATH, "Rol no válido").await);
    };

    let outcome = state
        .api()
        .as_user(&admin.backend)
        .update_user_role(id, role)
        .await
        .map(|user| format!("{} ahora es {}", user.name, user.role.label()));
    finish(&session, USERS_PATH, outcome).await
}

/// Delete a user.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminRole(admin): RequireAdminRole,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    let id = UserId::new(id);
    if id == admin.user.id {
        return Ok(reject(&session, USERS_PATH, "No puedes eliminar tu propia cuenta").await);
    }

    let outcome = state
        .api()
        .as_user(&admin.backend)
        .delete_user(id)
        .await
        .map(|()| {
            tracing::info!(user_id = %id, "User deleted");
            "Usuario eliminado".to_string()
        });
    finish(&session, USERS_PATH, outcome).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, password: &str, role: &str) -> UserForm {
        UserForm {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let user = form(" Marta ", "Marta@Climatech.co", "secreta123", "manager")
            .validate()
            .expect("valid form");
        assert_eq!(user.name, "Marta");
        assert_eq!(user.role, UserRole::Manager);
    }

    #[test]
    fn test_validate_reports_first_problem() {
        assert_eq!(
            form("", "a@b.co", "secreta123", "admin").validate(),
            Err("El nombre es obligatorio".to_string())
        );
        assert_eq!(
            form("Marta", "no-es-correo", "secreta123", "admin").validate(),
            Err("Correo no válido".to_string())
        );
        assert!(
            form("Marta", "a@b.co", "corta", "admin")
                .validate()
                .unwrap_err()
                .contains("8 caracteres")
        );
        assert_eq!(
            form("Marta", "a@b.co", "secreta123", "root").validate(),
            Err("Rol no válido".to_string())
        );
    }

    #[test]
    fn test_role_filter_uses_wire_values() {
        let config = table_config();
        let filter = config.filter.expect("role filter");
        assert_eq!(filter.options.len(), UserRole::ALL.len());
        assert_eq!(filter.options[0].0, "admin");
    }

    #[test]
    fn test_search_matches_role_and_status_labels() {
        let users: Vec<User> = serde_json::from_value(serde_json::json!([
            {"id": 1, "name": "Marta", "email": "marta@climatech.co", "role": "admin", "isActive": true},
            {"id": 2, "name": "Pedro", "email": "pedro@climatech.co", "role": "technician", "isActive": false}
        ]))
        .unwrap();
        let search = |q: &str| {
            let query = TableQuery {
                q: Some(q.into()),
                ..TableQuery::default()
            };
            TableState::build(users.clone(), &table_config(), &query)
                .rows
                .iter()
                .map(|u| u.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(search("administrador"), vec!["Marta"]);
        assert_eq!(search("INACTIVO"), vec!["Pedro"]);
    }
}
