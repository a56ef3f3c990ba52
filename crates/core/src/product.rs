//! Catalog product schema.
//!
//! Products are read-mostly documents: the storefront loads them from the
//! catalog file and only mutates them to append reviews. The shape matches
//! the JSON served by `GET /api/products`.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{CartEntry, CartEntryError};
use crate::types::{ProductId, ReviewId, UserId};

/// Highest star rating.
pub const MAX_RATING: u8 = 5;

/// Largest discount percentage.
pub const MAX_DISCOUNT: u8 = 100;

/// Errors from product validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductError {
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("price cannot be negative (got {0})")]
    NegativePrice(Decimal),
    #[error("discount must be between 0 and {MAX_DISCOUNT} (got {0})")]
    DiscountOutOfRange(u8),
    #[error("rating must be between 0 and {MAX_RATING} (got {0})")]
    RatingOutOfRange(f64),
    #[error("review rating must be between 1 and {MAX_RATING} (got {0})")]
    ReviewRatingOutOfRange(u8),
    #[error("review comment cannot be empty")]
    EmptyComment,
}

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spices,
    Herbs,
    Blends,
    Seasonings,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 4] = [Self::Spices, Self::Herbs, Self::Blends, Self::Seasonings];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spices => "spices",
            Self::Herbs => "herbs",
            Self::Blends => "blends",
            Self::Seasonings => "seasonings",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spices" => Ok(Self::Spices),
            "herbs" => Ok(Self::Herbs),
            "blends" => Ok(Self::Blends),
            "seasonings" => Ok(Self::Seasonings),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

/// A customer review embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: ReviewId,
    /// Reviewing user.
    pub user: UserId,
    /// Display name at the time of the review.
    pub name: String,
    /// 1 to 5 stars.
    pub rating: u8,
    pub comment: String,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Undiscounted unit price.
    pub price: Decimal,
    pub category: Category,
    pub image_url: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    /// Mean review rating, 0 when there are no reviews.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub featured: bool,
    /// Discount percentage, 0 to 100.
    #[serde(default)]
    pub discount: u8,
    /// Pack sizes offered; each becomes a separate cart line.
    #[serde(default)]
    pub weights: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first `ProductError` found.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ProductError::NegativePrice(self.price));
        }
        if self.discount > MAX_DISCOUNT {
            return Err(ProductError::DiscountOutOfRange(self.discount));
        }
        if !(0.0..=f64::from(MAX_RATING)).contains(&self.rating) {
            return Err(ProductError::RatingOutOfRange(self.rating));
        }
        for review in &self.reviews {
            validate_review_rating(review.rating)?;
        }
        Ok(())
    }

    /// Trim the name in place, as the catalog does on import.
    pub fn normalize(&mut self) {
        let trimmed = self.name.trim();
        if trimmed.len() != self.name.len() {
            self.name = trimmed.to_string();
        }
    }

    /// Price after discount, rounded to the nearest whole rupee.
    ///
    /// Undiscounted products keep their exact price.
    #[must_use]
    pub fn discounted_price(&self) -> Decimal {
        if self.discount == 0 {
            return self.price;
        }
        let factor = Decimal::from(MAX_DISCOUNT.saturating_sub(self.discount));
        (self.price * factor / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    #[must_use]
    pub const fn has_discount(&self) -> bool {
        self.discount > 0
    }

    /// Append a review and recompute the mean rating.
    ///
    /// # Errors
    ///
    /// Returns `ProductError` if the rating is outside 1 to 5 or the comment
    /// is blank. The product is unchanged on error.
    pub fn add_review(
        &mut self,
        user: UserId,
        name: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
    ) -> Result<Review, ProductError> {
        validate_review_rating(rating)?;
        let comment = comment.into();
        if comment.trim().is_empty() {
            return Err(ProductError::EmptyComment);
        }

        let review = Review {
            id: ReviewId::new(),
            user,
            name: name.into(),
            rating,
            comment,
            date: Utc::now(),
        };
        self.reviews.push(review.clone());
        self.rating = mean_rating(&self.reviews);

        Ok(review)
    }

    /// Star breakdown of the current rating.
    #[must_use]
    pub fn stars(&self) -> StarRating {
        StarRating::from_rating(self.rating)
    }

    /// Whether every whitespace-separated term of `query` appears in the
    /// name, description or category (case-insensitive).
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let haystack = format!(
            "{} {} {}",
            self.name.to_lowercase(),
            self.description.to_lowercase(),
            self.category
        );
        query
            .split_whitespace()
            .all(|term| haystack.contains(&term.to_lowercase()))
    }

    /// Snapshot this product as a cart line at its discounted price.
    ///
    /// # Errors
    ///
    /// Returns `CartEntryError::ZeroQuantity` for a zero quantity.
    pub fn to_cart_entry(
        &self,
        quantity: u32,
        weight: Option<&str>,
    ) -> Result<CartEntry, CartEntryError> {
        let entry = CartEntry::new(self.id, self.name.clone(), self.discounted_price(), quantity)?
            .with_image(self.image_url.clone());
        Ok(match weight {
            Some(weight) => entry.with_weight(weight),
            None => entry,
        })
    }
}

fn validate_review_rating(rating: u8) -> Result<(), ProductError> {
    if (1..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ProductError::ReviewRatingOutOfRange(rating))
    }
}

fn mean_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)] // Review counts never approach f64 precision
    let count = reviews.len() as f64;
    f64::from(sum) / count
}

/// Full, half and empty stars for a 0 to 5 rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRating {
    pub full: u8,
    pub half: bool,
    pub empty: u8,
}

impl StarRating {
    /// Full stars are the whole part; a fractional part of at least one half
    /// adds a half star; the rest are empty.
    #[must_use]
    pub fn from_rating(rating: f64) -> Self {
        let clamped = rating.clamp(0.0, f64::from(MAX_RATING));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=5
        let full = clamped.floor() as u8;
        let half = clamped.fract() >= 0.5;
        let empty = MAX_RATING - full - u8::from(half);
        Self { full, half, empty }
    }
}
