//! Session middleware configuration.
//!
//! Sets up `SQLite`-backed sessions using tower-sessions. Each visitor's cart
//! lives in their session record, so carts survive restarts until the
//! session expires or the cart is cleared.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::task::JoinHandle;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "masala_session";

/// Session expiry time in seconds (30 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// How often expired session records are purged.
const EXPIRED_DELETION_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Connection cap for file-backed databases.
const MAX_CONNECTIONS: u32 = 5;

/// Open the session database and create the sessions table if needed.
///
/// An in-memory database exists only as long as its connection, so it gets a
/// single connection that is never recycled.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database cannot be opened or migrated.
pub async fn create_session_store(database_url: &str) -> Result<SqliteStore, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

    let pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
    let pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(MAX_CONNECTIONS)
    };
    let pool = pool_options.connect_with(options).await?;

    let store = SqliteStore::new(pool);
    store.migrate().await?;
    tracing::info!(in_memory, "Session store ready");
    Ok(store)
}

/// Purge expired sessions in the background for the life of the server.
pub fn spawn_expired_deletion(store: SqliteStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = store
            .continuously_delete_expired(EXPIRED_DELETION_INTERVAL)
            .await
        {
            tracing::error!(error = %e, "Expired session deletion stopped");
        }
    })
}

/// Create the session layer over the `SQLite` store.
#[must_use]
pub fn create_session_layer(
    store: SqliteStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<SqliteStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::Session;

    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_keeps_sessions() {
        let store = create_session_store("sqlite::memory:").await.unwrap();

        let session = Session::new(None, Arc::new(store.clone()), None);
        session.insert("cart", "[]".to_string()).await.unwrap();
        session.save().await.unwrap();
        let id = session.id().unwrap();

        let reloaded = Session::new(Some(id), Arc::new(store), None);
        assert_eq!(
            reloaded.get::<String>("cart").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("sessions.db").display());

        let session = Session::new(None, Arc::new(create_session_store(&url).await.unwrap()), None);
        session.insert("cart", "[1]".to_string()).await.unwrap();
        session.save().await.unwrap();
        let id = session.id().unwrap();

        let reopened = create_session_store(&url).await.unwrap();
        let reloaded = Session::new(Some(id), Arc::new(reopened), None);
        assert_eq!(
            reloaded.get::<String>("cart").await.unwrap().as_deref(),
            Some("[1]")
        );
    }
}
