//! Integration tests for catalog pages and the JSON API.

use axum::http::StatusCode;
use masala_integration_tests::TestApp;
use rust_decimal::Decimal;
use serde_json::json;

fn ids(products: &serde_json::Value) -> Vec<i64> {
    products
        .as_array()
        .map(|items| items.iter().filter_map(|p| p["id"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health() {
    let mut app = TestApp::new().await;
    let resp = app.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let mut app = TestApp::new().await;

    let generated = app.get("/health").await;
    assert_eq!(generated.header("x-request-id").map(str::len), Some(36));

    let request = axum::http::Request::get("/health")
        .header("x-request-id", "edge-1234")
        .body(axum::body::Body::empty())
        .unwrap_or_else(|e| panic!("{e}"));
    let echoed = app.send(request).await;
    assert_eq!(echoed.header("x-request-id"), Some("edge-1234"));
}

// =============================================================================
// JSON API
// =============================================================================

#[tokio::test]
async fn test_api_list_products() {
    let mut app = TestApp::new().await;
    let resp = app.get("/api/products").await;
    assert_eq!(resp.status, StatusCode::OK);

    let products = resp.json();
    assert_eq!(ids(&products), vec![1, 2, 3, 4]);

    let cardamom = &products[1];
    assert_eq!(cardamom["discount"], 10);
    let discounted: Decimal = cardamom["discounted_price"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    assert_eq!(discounted, Decimal::from(180));
}

#[tokio::test]
async fn test_api_filters() {
    let mut app = TestApp::new().await;

    let herbs = app.get("/api/products?category=herbs").await.json();
    assert_eq!(ids(&herbs), vec![3, 4]);

    let featured = app.get("/api/products?featured=true").await.json();
    assert_eq!(ids(&featured), vec![1]);

    let search = app.get("/api/products?q=fenugreek%20leaves").await.json();
    assert_eq!(ids(&search), vec![4]);

    let blank = app.get("/api/products?q=&category=").await.json();
    assert_eq!(ids(&blank).len(), 4);

    let bad = app.get("/api/products?category=pickles").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_get_product() {
    let mut app = TestApp::new().await;

    let resp = app.get("/api/products/4").await;
    assert_eq!(resp.status, StatusCode::OK);
    let methi = resp.json();
    assert_eq!(methi["name"], "Kasuri Methi");
    assert_eq!(methi["reviews"][0]["comment"], "Lovely aroma");

    let missing = app.get("/api/products/42").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_add_review() {
    let mut app = TestApp::new().await;

    let resp = app
        .post_json(
            "/api/products/4/reviews",
            &json!({"user": 9, "name": "Ravi", "rating": 5, "comment": "Very fresh"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let body = resp.json();
    assert_eq!(body["review"]["name"], "Ravi");
    assert_eq!(body["product_rating"], 4.5);

    let methi = app.get("/api/products/4").await.json();
    assert_eq!(methi["reviews"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_api_add_review_rejections() {
    let mut app = TestApp::new().await;

    let bad_rating = app
        .post_json(
            "/api/products/4/reviews",
            &json!({"user": 9, "name": "Ravi", "rating": 9, "comment": "!"}),
        )
        .await;
    assert_eq!(bad_rating.status, StatusCode::BAD_REQUEST);
    assert!(bad_rating.body.contains("between 1 and 5"));

    let blank = app
        .post_json(
            "/api/products/4/reviews",
            &json!({"user": 9, "name": "Ravi", "rating": 3, "comment": "  "}),
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post_json(
            "/api/products/42/reviews",
            &json!({"user": 9, "name": "Ravi", "rating": 3, "comment": "ok"}),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_home_shows_featured_products() {
    let mut app = TestApp::new().await;
    let resp = app.get("/").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Lakadong Turmeric"));
    assert!(!resp.body.contains("Kasuri Methi"));
}

#[tokio::test]
async fn test_products_listing_filters() {
    let mut app = TestApp::new().await;

    let all = app.get("/products").await;
    assert_eq!(all.status, StatusCode::OK);
    assert!(all.body.contains("10% OFF"));
    assert!(all.body.contains("Out of stock"));

    let search = app.get("/products?q=mint").await;
    assert!(search.body.contains("Dried Mint"));
    assert!(!search.body.contains("Green Cardamom"));

    let none = app.get("/products?q=saffron").await;
    assert!(none.body.contains("No products match"));

    let bad = app.get("/products?category=pickles").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_detail() {
    let mut app = TestApp::new().await;

    let resp = app.get("/products/4").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Kasuri Methi"));
    assert!(resp.body.contains("Lovely aroma"));
    // Related products come from the same category
    assert!(resp.body.contains("Dried Mint"));

    let missing = app.get("/products/42").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
