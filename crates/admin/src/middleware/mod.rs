//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID
//! 4. Security headers (strict CSP, no caching)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Auth extractors (`RequireAdminAuth`, `RequireAdminRole`) per handler

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdminAuth, RequireAdminRole, clear_current_admin, set_current_admin};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
