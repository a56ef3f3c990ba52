//! Session-scoped data for storefront visitors.
//!
//! The storefront keeps no database. Everything that belongs to a visitor,
//! which today is only the cart, lives in their session.

pub mod session;

pub use session::{SessionSlot, keys as session_keys};
