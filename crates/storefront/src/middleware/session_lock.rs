//! Per-visitor request serialization.
//!
//! A visitor's cart is read from their session, changed and written back.
//! The session layer saves the record after the handler returns, and with
//! an inactivity expiry it saves on every request, reads included. Two
//! requests from the same visitor must therefore run one after the other
//! from session load to session save, or the later save drops the earlier
//! change.
//!
//! [`serialize_sessions`] wraps the session layer and holds a lock keyed by
//! the session cookie for the whole request. Requests without a session
//! cookie are new visitors and run freely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tokio::sync::OwnedMutexGuard;
use tower_sessions::cookie::Cookie;

use super::session::SESSION_COOKIE_NAME;

type SessionLock = Arc<tokio::sync::Mutex<()>>;

/// Locks for sessions that currently have a request in flight.
#[derive(Clone, Default)]
pub struct SessionLocks {
    held: Arc<Mutex<HashMap<String, SessionLock>>>,
}

impl SessionLocks {
    /// Wait until no other request for `session_id` is running.
    async fn acquire(&self, session_id: String) -> SessionTurn {
        let lock = {
            let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(held.entry(session_id.clone()).or_default())
        };
        let guard = lock.lock_owned().await;
        SessionTurn {
            locks: self.clone(),
            session_id,
            guard: Some(guard),
        }
    }

    /// Drop the entry once no request holds or awaits it.
    fn release(&self, session_id: &str) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if held
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            held.remove(session_id);
        }
    }

    /// Number of sessions with a request in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one session. Released on drop, including when the
/// request future is cancelled.
struct SessionTurn {
    locks: SessionLocks,
    session_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionTurn {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.session_id);
    }
}

/// Session cookie value carried by the request, if any.
fn session_cookie(request: &Request) -> Option<String> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

/// Run requests for the same session one at a time.
pub async fn serialize_sessions(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = session_cookie(&request) else {
        return next.run(request).await;
    };

    let _turn = locks.acquire(session_id).await;
    next.run(request).await
}
