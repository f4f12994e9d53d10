//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::BackendClient;
use crate::config::StorefrontConfig;
use crate::payment::WompiClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the session database pool and API clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    backend: BackendClient,
    wompi: WompiClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool (session store)
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let backend = BackendClient::new(&config.api_base_url);
        let wompi = WompiClient::new(&config.wompi);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                wompi,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the business API client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the Wompi client.
    #[must_use]
    pub fn wompi(&self) -> &WompiClient {
        &self.inner.wompi
    }
}
