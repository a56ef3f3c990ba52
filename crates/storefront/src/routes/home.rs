//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use masala_core::Category;
use tracing::instrument;

use crate::filters;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured_products: Vec<ProductCardView>,
    pub categories: Vec<&'static str>,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let featured_products = state
        .catalog()
        .featured()
        .iter()
        .map(ProductCardView::from)
        .collect();

    HomeTemplate {
        featured_products,
        categories: Category::ALL.iter().map(Category::as_str).collect(),
    }
}
