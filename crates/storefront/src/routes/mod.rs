//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured products)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing (?q=, ?category=)
//! GET  /products/:id           - Product detail with reviews
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Redirect to the WhatsApp order hand-off
//!
//! # Catalog API (JSON)
//! GET  /api/products           - Product list (?q=, ?category=, ?featured=)
//! GET  /api/products/:id       - Product detail
//! POST /api/products/:id/reviews - Add a review
//! ```

pub mod api;
pub mod cart;
pub mod home;
pub mod products;

use std::fmt::Display;
use std::str::FromStr;

use axum::{
    Router,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer};

use crate::state::AppState;

/// Deserialize an optional form or query value, treating blank as absent.
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the catalog API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(api::list_products))
        .route("/products/{id}", get(api::get_product))
        .route("/products/{id}/reviews", post(api::add_review))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout redirect
        .route("/checkout", get(cart::checkout))
        // JSON API
        .nest("/api", api_routes())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::empty_string_as_none;

    #[derive(Debug, Deserialize)]
    struct QuantityField {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        quantity: Option<u32>,
    }

    fn parse(json: &str) -> Option<u32> {
        serde_json::from_str::<QuantityField>(json)
            .unwrap_or_else(|e| panic!("quantity field: {e}"))
            .quantity
    }

    #[test]
    fn test_empty_string_as_none() {
        assert_eq!(parse(r#"{"quantity": ""}"#), None);
        assert_eq!(parse(r#"{"quantity": " 3 "}"#), Some(3));
        assert_eq!(parse("{}"), None);
        assert!(serde_json::from_str::<QuantityField>(r#"{"quantity": "lots"}"#).is_err());
    }
}
