//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::payment::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Business API call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Payment provider call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Backend(BackendError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend(BackendError::RateLimited(_)) | Self::RateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Backend(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Backend(_) | Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Backend(BackendError::Status { body, .. }) if status == StatusCode::BAD_REQUEST => {
                body.clone()
            }
            Self::Backend(BackendError::NotFound(_)) | Self::NotFound(_) => {
                "No encontramos lo que buscas".to_string()
            }
            Self::Backend(BackendError::RateLimited(_)) | Self::RateLimited => {
                "Demasiadas solicitudes, intenta de nuevo en un momento".to_string()
            }
            Self::BadRequest(msg) => msg.clone(),
            Self::Backend(_) | Self::Payment(_) => {
                "Servicio externo no disponible, intenta más tarde".to_string()
            }
            Self::Session(_) | Self::Internal(_) => "Error interno del servidor".to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_backend_errors_map_to_gateway_or_client_status() {
        assert_eq!(
            get_status(AppError::Backend(BackendError::NotFound("x".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::Status {
                status: 422,
                body: "invalid".into()
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::Status {
                status: 503,
                body: "down".into()
            })),
            StatusCode::BAD_GATEWAY
        );
    }
}
