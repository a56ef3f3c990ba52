//! JSON catalog API.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use masala_core::{Category, Product, ProductId, Review, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::catalog::CatalogQuery;
use crate::error::{AppError, Result};
use crate::routes::empty_string_as_none;
use crate::state::AppState;

/// A product with its price after discount.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub discounted_price: Decimal,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            discounted_price: product.discounted_price(),
            product,
        }
    }
}

/// Catalog listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub featured: Option<bool>,
}

/// New review body.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub user: UserId,
    pub name: String,
    pub rating: u8,
    pub comment: String,
}

/// Created review and the product's new mean rating.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub review: Review,
    pub product_rating: f64,
}

/// List products.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Json<Vec<ProductResponse>> {
    let products = state.catalog().search(&CatalogQuery {
        text: query.q,
        category: query.category,
        featured: query.featured,
    });
    Json(products.into_iter().map(ProductResponse::from).collect())
}

/// Get one product.
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    state
        .catalog()
        .get(id)
        .map(|product| Json(product.into()))
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Add a review to a product.
#[instrument(skip(state, body), fields(rating = body.rating))]
pub async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    let (product, review) =
        state
            .catalog()
            .add_review(id, body.user, &body.name, body.rating, &body.comment)?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse {
            review,
            product_rating: product.rating,
        }),
    ))
}
