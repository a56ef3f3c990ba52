//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use masala_core::{Category, Product, ProductId, Review, StarRating};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::CatalogQuery;
use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::empty_string_as_none;
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub price: Decimal,
    pub discounted_price: Decimal,
    pub discount: u8,
    pub has_discount: bool,
    pub in_stock: bool,
    pub stars: StarRating,
    pub rating: String,
    pub review_count: usize,
    pub weights: Vec<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.to_string(),
            image_url: product.image_url.clone(),
            price: product.price,
            discounted_price: product.discounted_price(),
            discount: product.discount,
            has_discount: product.has_discount(),
            in_stock: product.in_stock,
            stars: product.stars(),
            rating: format!("{:.1}", product.rating),
            review_count: product.reviews.len(),
            weights: product.weights.clone(),
        }
    }
}

/// Review display data for templates.
#[derive(Clone)]
pub struct ReviewView {
    pub name: String,
    pub stars: StarRating,
    pub comment: String,
    pub date: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            name: review.name.clone(),
            stars: StarRating::from_rating(f64::from(review.rating)),
            comment: review.comment.clone(),
            date: review.date.format("%d %b %Y").to_string(),
        }
    }
}

/// Category filter link for the listing page.
#[derive(Clone)]
pub struct CategoryLink {
    pub slug: &'static str,
    pub active: bool,
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryLink>,
    pub query: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductCardView,
    pub reviews: Vec<ReviewView>,
    pub related_products: Vec<ProductCardView>,
}

/// Number of related products shown under a product.
const RELATED_LIMIT: usize = 4;

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<impl IntoResponse> {
    let category = query
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let products = state.catalog().search(&CatalogQuery {
        text: query.q.clone(),
        category,
        featured: None,
    });

    Ok(ProductsIndexTemplate {
        products: products.iter().map(ProductCardView::from).collect(),
        categories: Category::ALL
            .iter()
            .map(|c| CategoryLink {
                slug: c.as_str(),
                active: category == Some(*c),
            })
            .collect(),
        query: query.q.unwrap_or_default(),
    })
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state
        .catalog()
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let related_products = state
        .catalog()
        .by_category(product.category)
        .iter()
        .filter(|p| p.id != product.id)
        .take(RELATED_LIMIT)
        .map(ProductCardView::from)
        .collect();

    Ok(ProductShowTemplate {
        reviews: product.reviews.iter().rev().map(ReviewView::from).collect(),
        product: ProductCardView::from(&product),
        related_products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_view_discount_fields() {
        let product: Product = serde_json::from_str(
            r#"{"id": 3, "name": "Chaat Masala", "description": "Tangy", "price": 120,
                "category": "blends", "image_url": "/static/img/chaat.jpg",
                "discount": 10, "rating": 4.5}"#,
        )
        .unwrap_or_else(|e| panic!("fixture: {e}"));
        let view = ProductCardView::from(&product);

        assert!(view.has_discount);
        assert_eq!(view.discounted_price, Decimal::from(108));
        assert_eq!(view.rating, "4.5");
        assert_eq!(view.stars.full, 4);
        assert!(view.stars.half);
        assert_eq!(view.category, "blends");
    }
}
