//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, added by the binary)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span and Sentry scope)
//! 4. Session serialization (one request per visitor at a time)
//! 5. Session layer (tower-sessions with `SQLite` store)
//!
//! `/health` and `/static` sit outside 4 and 5.

pub mod request_id;
pub mod session;
pub mod session_lock;

pub use request_id::request_id_middleware;
pub use session::{create_session_layer, create_session_store, spawn_expired_deletion};
pub use session_lock::{SessionLocks, serialize_sessions};
