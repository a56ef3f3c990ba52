//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;
use tower_sessions_sqlx_store::SqliteStore;

use crate::catalog::{Catalog, CatalogError};
use crate::config::StorefrontConfig;
use crate::middleware::create_session_store;

/// Errors that can occur while building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to open session database: {0}")]
    Sessions(#[from] sqlx::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the product catalog, the session store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    sessions: SqliteStore,
}

impl AppState {
    /// Create a new application state from an already loaded catalog and an
    /// open session store.
    #[must_use]
    pub fn new(config: StorefrontConfig, catalog: Catalog, sessions: SqliteStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                sessions,
            }),
        }
    }

    /// Load the catalog and open the session database named by `config`.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the catalog cannot be loaded or the session
    /// database cannot be opened.
    pub async fn from_config(config: StorefrontConfig) -> Result<Self, StateError> {
        let catalog = Catalog::load(&config.catalog_path)?;
        let sessions = create_session_store(&config.session_database_url).await?;
        Ok(Self::new(config, catalog, sessions))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn sessions(&self) -> &SqliteStore {
        &self.inner.sessions
    }
}
