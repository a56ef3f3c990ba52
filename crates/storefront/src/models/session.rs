//! Session-backed cart slot.
//!
//! The visitor's session is the storefront's equivalent of browser local
//! storage: it follows the client, survives page loads and outlives any
//! single request. [`SessionSlot`] exposes it to the cart engine as a
//! synchronous [`KeyValueStore`].
//!
//! Session I/O is async while the engine is not, so a request snapshots the
//! slot with [`SessionSlot::load`] before building the cart, and writes it
//! back with [`SessionSlot::flush`] before responding. The engine's
//! write-through lands in the snapshot; `flush` is what makes it durable.

use masala_core::store::CART_KEY;
use masala_core::{KeyValueStore, StoreError};
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Key for the serialized cart sequence.
    pub const CART: &str = masala_core::store::CART_KEY;
}

/// Snapshot of the visitor's cart slot.
#[derive(Debug, Clone, Default)]
pub struct SessionSlot {
    value: Option<String>,
    dirty: bool,
}

impl SessionSlot {
    /// Read the cart slot from the session.
    ///
    /// A session store failure is logged and treated as an empty slot, the
    /// same way malformed cart data is.
    pub async fn load(session: &Session) -> Self {
        let value = match session.get::<String>(keys::CART).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cart from session");
                None
            }
        };
        Self {
            value,
            dirty: false,
        }
    }

    /// Write the slot back to the session if the cart changed it.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the write fails.
    pub async fn flush(self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        if !self.dirty {
            return Ok(());
        }
        match self.value {
            Some(value) => session.insert(keys::CART, value).await,
            None => session.remove::<String>(keys::CART).await.map(|_| ()),
        }
    }

    /// Whether the snapshot differs from what was loaded.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn check_key(key: &str) -> Result<(), StoreError> {
        if key == CART_KEY {
            Ok(())
        } else {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }
}

impl KeyValueStore for SessionSlot {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::check_key(key)?;
        Ok(self.value.clone())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        Self::check_key(key)?;
        self.value = Some(value);
        self.dirty = true;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        Self::check_key(key)?;
        self.value = None;
        self.dirty = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use masala_core::{Cart, CartEntry, ProductId};
    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn test_slot_only_holds_the_cart_key() {
        let mut slot = SessionSlot::default();
        assert!(matches!(
            slot.set("wishlist", "[]".to_string()),
            Err(StoreError::InvalidKey(_))
        ));
        slot.set(CART_KEY, "[]".to_string()).unwrap();
        assert_eq!(slot.get(CART_KEY).unwrap().as_deref(), Some("[]"));
        assert!(slot.is_dirty());
    }

    #[tokio::test]
    async fn test_cart_survives_flush_and_reload() {
        let session = session();

        let mut cart = Cart::open(SessionSlot::load(&session).await);
        cart.add_item(
            CartEntry::new(ProductId::new(1), "Turmeric", Decimal::from(180), 2).unwrap(),
        )
        .unwrap();
        cart.into_store().flush(&session).await.unwrap();

        let reloaded = Cart::open(SessionSlot::load(&session).await);
        assert_eq!(reloaded.total_items(), 2);
        assert_eq!(reloaded.total(), Decimal::from(360));
    }

    #[tokio::test]
    async fn test_untouched_slot_is_not_written() {
        let session = session();
        let cart = Cart::open(SessionSlot::load(&session).await);
        let slot = cart.into_store();
        assert!(!slot.is_dirty());
        slot.flush(&session).await.unwrap();
        assert!(session.get::<String>(keys::CART).await.unwrap().is_none());
    }
}
