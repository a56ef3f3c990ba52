//! Cart engine.
//!
//! [`Cart`] is the only writer of cart state. Each mutation runs the same
//! tail: persist the full sequence to the backing slot, then broadcast the
//! new item list to subscribers. A mutation the slot rejects is discarded. Presentation (count badges, cart pages)
//! lives in subscriber callbacks, never in the engine.
//!
//! # Example
//!
//! ```rust
//! use masala_core::{Cart, CartEntry, MemoryStore, ProductId};
//! use rust_decimal::Decimal;
//!
//! let mut cart = Cart::open(MemoryStore::new());
//! let badge = cart.subscribe(|items| {
//!     let count: u32 = items.iter().map(CartEntry::quantity).sum();
//!     assert!(count > 0);
//!     Ok(())
//! });
//!
//! cart.add_item(CartEntry::new(ProductId::new(1), "Turmeric", Decimal::from(100), 2)?)?;
//! cart.add_item(CartEntry::new(ProductId::new(1), "Turmeric", Decimal::from(100), 3)?)?;
//! assert_eq!(cart.total_items(), 5);
//! assert_eq!(cart.total(), Decimal::from(500));
//!
//! cart.unsubscribe(badge);
//! cart.clear()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod entry;
pub mod order;
mod subscribers;

pub use entry::{CartEntry, CartEntryError, LineKey};
pub use order::{PhoneError, checkout_url, normalize_phone, order_message};
pub use subscribers::{SubscriberError, Subscribers, SubscriptionId};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::store::{CartStore, KeyValueStore, StoreError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Position outside the current sequence.
    #[error("cart index {index} out of range (cart has {len} lines)")]
    InvalidIndex { index: usize, len: usize },

    /// No line with the given product and variant.
    #[error("no cart line for product {0:?}")]
    LineNotFound(LineKey),

    /// The backing slot rejected the write. The cart is unchanged.
    #[error("failed to persist cart: {0}")]
    Persist(#[from] StoreError),
}

/// A client's shopping cart.
#[derive(Debug)]
pub struct Cart<S: KeyValueStore> {
    entries: Vec<CartEntry>,
    store: CartStore<S>,
    subscribers: Subscribers,
}

impl<S: KeyValueStore> Cart<S> {
    /// Load the cart from `backend`'s standard slot.
    ///
    /// Missing or malformed data starts an empty cart.
    #[must_use]
    pub fn open(backend: S) -> Self {
        Self::from_store(CartStore::new(backend))
    }

    /// Load the cart through an already configured slot adapter.
    #[must_use]
    pub fn from_store(store: CartStore<S>) -> Self {
        let entries = store.load();
        tracing::debug!(lines = entries.len(), "Cart loaded");
        Self {
            entries,
            store,
            subscribers: Subscribers::default(),
        }
    }

    /// End the cart's lifetime, returning the backend.
    ///
    /// Every mutation has already been written, so nothing is flushed here.
    pub fn into_store(self) -> S {
        self.store.into_inner()
    }

    /// Register a change callback. See [`Subscribers::subscribe`].
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&[CartEntry]) -> Result<(), SubscriberError> + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Remove a change callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Add a line, merging with an existing line for the same product and
    /// variant.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persist` if the slot cannot be written.
    pub fn add_item(&mut self, entry: CartEntry) -> Result<(), CartError> {
        let key = entry.key();
        let mut next = self.entries.clone();
        match next.iter_mut().find(|existing| key.matches(existing)) {
            Some(existing) => existing.merge_quantity(entry.quantity()),
            None => next.push(entry),
        }
        self.commit("add", next)
    }

    /// Remove the line at `index`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidIndex` if `index >= len`, and
    /// `CartError::Persist` if the slot cannot be written. Nothing is
    /// broadcast in either case.
    pub fn remove_item(&mut self, index: usize) -> Result<CartEntry, CartError> {
        self.check_index(index)?;
        let mut next = self.entries.clone();
        let removed = next.remove(index);
        self.commit("remove", next)?;
        Ok(removed)
    }

    /// Set the quantity of the line at `index`.
    ///
    /// A quantity below 1 is ignored: nothing changes, nothing is saved and
    /// no notification is sent. The index is not checked in that case.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidIndex` if `index >= len`, and
    /// `CartError::Persist` if the slot cannot be written.
    pub fn update_quantity(&mut self, index: usize, quantity: u32) -> Result<(), CartError> {
        if quantity < 1 {
            tracing::debug!(index, "Ignoring quantity update below 1");
            return Ok(());
        }
        self.check_index(index)?;
        let mut next = self.entries.clone();
        if let Some(entry) = next.get_mut(index) {
            entry.set_quantity(quantity);
        }
        self.commit("update", next)
    }

    /// Remove the line identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line matches.
    pub fn remove_line(&mut self, key: &LineKey) -> Result<CartEntry, CartError> {
        let index = self.position(key)?;
        self.remove_item(index)
    }

    /// Set the quantity of the line identified by `key`.
    ///
    /// Quantities below 1 are ignored as in [`Cart::update_quantity`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line matches.
    pub fn update_line_quantity(
        &mut self,
        key: &LineKey,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            tracing::debug!(?key, "Ignoring quantity update below 1");
            return Ok(());
        }
        let index = self.position(key)?;
        self.update_quantity(index, quantity)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persist` if the slot cannot be written.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.commit("clear", Vec::new())
    }

    /// Copy of the current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartEntry> {
        self.entries.clone()
    }

    /// Borrow the current lines.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Sum of price × quantity over all lines. Not rounded.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.entries
            .iter()
            .fold(0, |sum, entry| sum.saturating_add(entry.quantity()))
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Order summary for the messaging hand-off.
    #[must_use]
    pub fn order_message(&self) -> String {
        order_message(&self.entries)
    }

    fn check_index(&self, index: usize) -> Result<(), CartError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(CartError::InvalidIndex {
                index,
                len: self.entries.len(),
            })
        }
    }

    fn position(&self, key: &LineKey) -> Result<usize, CartError> {
        self.entries
            .iter()
            .position(|entry| key.matches(entry))
            .ok_or_else(|| CartError::LineNotFound(key.clone()))
    }

    /// Write `next` through to the slot, then adopt it and broadcast.
    ///
    /// A mutation only takes effect once the slot holds it.
    fn commit(&mut self, operation: &'static str, next: Vec<CartEntry>) -> Result<(), CartError> {
        if let Err(e) = self.store.save(&next) {
            tracing::error!(operation, error = %e, "Failed to persist cart");
            return Err(e.into());
        }
        self.entries = next;

        tracing::debug!(
            operation,
            lines = self.entries.len(),
            total_items = self.total_items(),
            total = %self.total(),
            "Cart updated"
        );

        self.subscribers.notify(&self.entries);
        Ok(())
    }
}
