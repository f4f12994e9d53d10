//! Staff sign-in against the business API.
//!
//! The backend checks the password and answers with a session cookie; the
//! admin keeps that cookie in its own server-side session and never hands it
//! to the browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

async fn signed_in(session: &Session) -> bool {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .is_some()
}

/// Show the login form; staff already signed in go to the dashboard.
pub async fn login_page(session: Session) -> Response {
    if signed_in(&session).await {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Sign in.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_lowercase();
    let retry = |error: &str| {
        LoginTemplate {
            email: email.clone(),
            error: Some(error.to_string()),
        }
        .into_response()
    };

    if email.is_empty() || form.password.is_empty() {
        return Ok(retry("Ingresa tu correo y contraseña"));
    }

    let (user, backend) = match state.api().login(&email, &form.password).await {
        Ok(signed_in) => signed_in,
        Err(ApiError::Unauthorized) => {
            tracing::info!("Login rejected");
            return Ok(retry("Correo o contraseña incorrectos"));
        }
        Err(ApiError::Status { status, .. }) if (400..500).contains(&status) => {
            return Ok(retry("Correo o contraseña incorrectos"));
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            return Ok(retry("No pudimos contactar el servidor, intenta más tarde"));
        }
    };

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "Inactive user tried to sign in");
        return Ok(retry("Tu cuenta está desactivada"));
    }

    tracing::info!(user_id = %user.id, role = %user.role, "Staff signed in");
    set_current_admin(&session, &CurrentAdmin { user, backend }).await?;
    Ok(Redirect::to("/").into_response())
}

/// Sign out of the backend and drop the local session.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let admin: Option<CurrentAdmin> = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten();

    if let Some(admin) = admin {
        if let Err(e) = state.api().as_user(&admin.backend).logout().await {
            tracing::warn!(error = %e, "Backend logout failed");
        }
        tracing::info!(user_id = %admin.user.id, "Staff signed out");
    }

    clear_current_admin(&session).await?;
    Ok(Redirect::to("/auth/login"))
}
