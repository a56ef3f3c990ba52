//! Cart line entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProductId;

/// Errors raised when building a [`CartEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartEntryError {
    /// Price must not be negative.
    #[error("price cannot be negative (got {0})")]
    NegativePrice(Decimal),
    /// Quantity must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// One line of the cart: a product snapshot plus quantity and variant.
///
/// The serialized shape is the one stored in the client slot:
///
/// ```json
/// {"id": 1, "name": "Kashmiri Chilli", "price": "240", "quantity": 2,
///  "weight": "250g", "image": "/static/img/chilli.jpg"}
/// ```
///
/// Deserialization runs the same checks as [`CartEntry::new`], so a stored
/// entry with a negative price or zero quantity is rejected as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCartEntry")]
pub struct CartEntry {
    id: ProductId,
    name: String,
    price: Decimal,
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<String>,
    image: String,
}

#[derive(Deserialize)]
struct RawCartEntry {
    id: ProductId,
    name: String,
    price: Decimal,
    quantity: u32,
    #[serde(default)]
    weight: Option<String>,
    #[serde(default)]
    image: String,
}

impl TryFrom<RawCartEntry> for CartEntry {
    type Error = CartEntryError;

    fn try_from(raw: RawCartEntry) -> Result<Self, Self::Error> {
        let entry = Self::new(raw.id, raw.name, raw.price, raw.quantity)?.with_image(raw.image);
        Ok(match raw.weight {
            Some(weight) => entry.with_weight(weight),
            None => entry,
        })
    }
}

impl CartEntry {
    /// Create a cart entry without a variant or image.
    ///
    /// # Errors
    ///
    /// Returns `CartEntryError` if the price is negative or the quantity is zero.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
    ) -> Result<Self, CartEntryError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(CartEntryError::NegativePrice(price));
        }
        if quantity == 0 {
            return Err(CartEntryError::ZeroQuantity);
        }

        Ok(Self {
            id,
            name: name.into(),
            price,
            quantity,
            weight: None,
            image: String::new(),
        })
    }

    /// Set the variant discriminator (e.g. a pack weight).
    ///
    /// Blank values are treated as "no variant".
    #[must_use]
    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        let weight = weight.into();
        self.weight = if weight.trim().is_empty() {
            None
        } else {
            Some(weight)
        };
        self
    }

    /// Set the image URL shown next to the line.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn weight(&self) -> Option<&str> {
        self.weight.as_deref()
    }

    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Stable identity of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            id: self.id,
            weight: self.weight.clone(),
        }
    }

    pub(crate) fn merge_quantity(&mut self, extra: u32) {
        self.quantity = self.quantity.saturating_add(extra);
    }

    /// Caller guarantees `quantity >= 1`.
    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        debug_assert!(quantity >= 1);
        self.quantity = quantity;
    }
}

/// Composite line identity: product plus variant discriminator.
///
/// Two entries with the same key are the same cart line and merge on add.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    id: ProductId,
    weight: Option<String>,
}

impl LineKey {
    /// Build a key; a blank weight means "no variant".
    #[must_use]
    pub fn new(id: ProductId, weight: Option<String>) -> Self {
        Self {
            id,
            weight: weight.filter(|w| !w.trim().is_empty()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }

    #[must_use]
    pub fn weight(&self) -> Option<&str> {
        self.weight.as_deref()
    }

    /// Whether `entry` is the line this key addresses.
    #[must_use]
    pub fn matches(&self, entry: &CartEntry) -> bool {
        self.id == entry.id && self.weight == entry.weight
    }
}
