//! Authentication extractors for admin.
//!
//! The signed-in staff member lives in the session as a [`CurrentAdmin`].
//! Handlers ask for it with [`RequireAdminAuth`]; user management also needs
//! the administrator role ([`RequireAdminRole`]).

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires a signed-in staff member.
///
/// Without one, HTML requests are redirected to the login page and `/api/`
/// requests get 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hola, {}!", admin.user.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Rejection when authentication is required.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but the role is not enough.
    Forbidden,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Solo los administradores pueden gestionar usuarios",
            )
                .into_response(),
        }
    }
}

async fn current_admin(parts: &Parts) -> Result<CurrentAdmin, AdminAuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::Unauthorized)?;

    let admin: Option<CurrentAdmin> = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten();

    admin.ok_or_else(|| {
        if parts.uri.path().starts_with("/api/") {
            AdminAuthRejection::Unauthorized
        } else {
            AdminAuthRejection::RedirectToLogin
        }
    })
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        set_sentry_user(admin.user.id.as_i64(), Some(&admin.user.email));
        Ok(Self(admin))
    }
}

/// Extractor that requires the administrator role.
pub struct RequireAdminRole(pub CurrentAdmin);

impl<S> FromRequestParts<S> for RequireAdminRole
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        if !admin.is_admin() {
            tracing::warn!(user_id = %admin.user.id, role = %admin.user.role, "Role check failed");
            return Err(AdminAuthRejection::Forbidden);
        }
        set_sentry_user(admin.user.id.as_i64(), Some(&admin.user.email));
        Ok(Self(admin))
    }
}

/// Store the signed-in staff member, rotating the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Forget the signed-in staff member (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    clear_sentry_user();
    session.flush().await
}
