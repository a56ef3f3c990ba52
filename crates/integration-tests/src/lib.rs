//! Integration tests for the Masala storefront.
//!
//! Tests drive the full router in-process with `tower::ServiceExt::oneshot`,
//! so no server, network or external service is needed:
//!
//! ```bash
//! cargo test -p masala-integration-tests
//! ```
//!
//! [`TestApp`] keeps the session cookie between requests the way a browser
//! would, which is what makes a multi-request cart flow possible.

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use masala_storefront::catalog::Catalog;
use masala_storefront::config::StorefrontConfig;
use masala_storefront::middleware::create_session_store;
use masala_storefront::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

/// Checkout phone used by every test app.
pub const ORDER_PHONE: &str = "919876543210";

/// Catalog used by every test app.
///
/// - 1 Lakadong Turmeric: featured, two pack sizes
/// - 2 Green Cardamom: 10% off 200
/// - 3 Dried Mint: out of stock
/// - 4 Kasuri Methi: one 4-star review
pub const CATALOG: &str = r#"[
    {"id": 1, "name": "Lakadong Turmeric", "description": "High-curcumin turmeric",
     "price": 180, "category": "spices", "image_url": "/static/img/turmeric.jpg",
     "featured": true, "weights": ["100g", "250g"]},
    {"id": 2, "name": "Green Cardamom", "description": "Bold pods from Idukki",
     "price": 200, "category": "spices", "image_url": "/static/img/cardamom.jpg",
     "discount": 10},
    {"id": 3, "name": "Dried Mint", "description": "Sun-dried pudina",
     "price": 90, "category": "herbs", "image_url": "/static/img/mint.jpg",
     "in_stock": false},
    {"id": 4, "name": "Kasuri Methi", "description": "Dried fenugreek leaves",
     "price": 95, "category": "herbs", "image_url": "/static/img/methi.jpg",
     "rating": 4, "reviews": [
        {"user": 7, "name": "Asha", "rating": 4, "comment": "Lovely aroma",
         "date": "2026-03-02T10:15:00Z"}
     ]}
]"#;

/// Storefront configuration for tests.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        order_phone: ORDER_PHONE.to_string(),
        catalog_path: PathBuf::from("unused.json"),
        static_dir: PathBuf::from("static"),
        session_database_url: "sqlite::memory:".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether the response tells the page the cart changed.
    #[must_use]
    pub fn cart_updated(&self) -> bool {
        self.header("hx-trigger") == Some("cart-updated")
    }

    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("response is not JSON ({e}): {}", self.body))
    }
}

/// In-process storefront with a browser-like cookie jar of one cookie.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    config: StorefrontConfig,
    cookie: Option<String>,
}

impl TestApp {
    /// Storefront over [`CATALOG`] with an in-memory session database.
    ///
    /// # Panics
    ///
    /// Panics if the fixture catalog is invalid or the session database
    /// cannot be created.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Storefront over [`CATALOG`] with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the fixture catalog is invalid or the session database
    /// cannot be opened.
    pub async fn with_config(config: StorefrontConfig) -> Self {
        let catalog = Catalog::from_json(CATALOG).expect("fixture catalog is valid");
        let sessions = create_session_store(&config.session_database_url)
            .await
            .expect("session database opens");
        let state = AppState::new(config.clone(), catalog, sessions);
        Self {
            router: masala_storefront::app(state),
            config,
            cookie: None,
        }
    }

    /// Another visitor on the same server, with no session yet.
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            router: self.router.clone(),
            config: self.config.clone(),
            cookie: None,
        }
    }

    /// The same visitor on a freshly started server over the same
    /// session database.
    pub async fn restart(&self) -> Self {
        let mut restarted = Self::with_config(self.config.clone()).await;
        restarted.cookie.clone_from(&self.cookie);
        restarted
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::get(uri).body(Body::empty());
        self.send(request.expect("valid request")).await
    }

    /// POST an `application/x-www-form-urlencoded` body, as HTMX does.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("hx-request", "true")
            .body(Body::from(body));
        self.send(request.expect("valid request")).await
    }

    pub async fn post_json(&mut self, uri: &str, json: &Value) -> TestResponse {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()));
        self.send(request.expect("valid request")).await
    }

    /// Send a request, attaching and then updating the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body is not UTF-8.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request.headers_mut().insert(
                header::COOKIE,
                cookie.parse().expect("cookie is a valid header"),
            );
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.cookie = Some(set_cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).expect("body is UTF-8"),
        }
    }
}
