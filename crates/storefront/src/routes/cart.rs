//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Each request opens the visitor's cart from their session, applies one
//! operation and writes the session back. Requests from one visitor run one
//! at a time (see [`crate::middleware::session_lock`]). A subscriber on the
//! cart renders the updated view, and a response carries the `cart-updated`
//! trigger only when that subscriber fired.

use std::sync::{Arc, Mutex, PoisonError};

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use masala_core::cart::order::checkout_url;
use masala_core::{Cart, CartEntry, LineKey, ProductId, SubscriberError};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::SessionSlot;
use crate::routes::empty_string_as_none;
use crate::state::AppState;

/// HTMX response header for client-side events.
const HX_TRIGGER: &str = "HX-Trigger";

/// Event fired on the page body whenever the cart changes.
const CART_UPDATED: &str = "cart-updated";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub name: String,
    pub weight: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    pub line_total: Decimal,
    pub image: String,
}

impl From<&CartEntry> for CartItemView {
    fn from(entry: &CartEntry) -> Self {
        Self {
            product_id: entry.id().as_i32(),
            name: entry.name().to_string(),
            weight: entry.weight().map(String::from),
            quantity: entry.quantity(),
            price: entry.price(),
            line_total: entry.line_total(),
            image: entry.image().to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            item_count: 0,
        }
    }

    /// Build the view from the cart's lines.
    #[must_use]
    pub fn from_entries(entries: &[CartEntry]) -> Self {
        Self {
            items: entries.iter().map(CartItemView::from).collect(),
            subtotal: entries.iter().map(CartEntry::line_total).sum(),
            item_count: entries
                .iter()
                .fold(0, |sum, e| sum.saturating_add(e.quantity())),
        }
    }
}

// =============================================================================
// Session Cart
// =============================================================================

/// Latest view rendered by the cart subscriber, if any.
#[derive(Clone, Default)]
struct RenderedCart(Arc<Mutex<Option<CartView>>>);

impl RenderedCart {
    fn subscriber(
        &self,
    ) -> impl FnMut(&[CartEntry]) -> std::result::Result<(), SubscriberError> + Send + 'static
    {
        let slot = Arc::clone(&self.0);
        move |items| {
            let mut rendered = slot
                .lock()
                .map_err(|_| SubscriberError::new("cart view lock poisoned"))?;
            *rendered = Some(CartView::from_entries(items));
            Ok(())
        }
    }

    fn take(&self) -> Option<CartView> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// The visitor's cart for the duration of one request.
struct SessionCart {
    cart: Cart<SessionSlot>,
    rendered: RenderedCart,
}

impl SessionCart {
    async fn open(session: &Session) -> Self {
        let mut cart = Cart::open(SessionSlot::load(session).await);
        let rendered = RenderedCart::default();
        cart.subscribe(rendered.subscriber());
        Self { cart, rendered }
    }

    /// Write the cart back to the session.
    ///
    /// Returns the view rendered by the last notification, or `None` if the
    /// cart did not change.
    async fn finish(self, session: &Session) -> Result<Option<CartView>> {
        let changed = self.rendered.take();
        self.cart.into_store().flush(session).await?;
        Ok(changed)
    }
}

/// Attach the `cart-updated` trigger when the cart changed.
fn respond(changed: bool, body: impl IntoResponse) -> Response {
    if changed {
        (AppendHeaders([(HX_TRIGGER, CART_UPDATED)]), body).into_response()
    } else {
        body.into_response()
    }
}

// =============================================================================
// Forms & Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub weight: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub weight: Option<String>,
    /// Raw value of the quantity input. See [`UpdateCartForm::quantity`].
    #[serde(default)]
    pub quantity: String,
}

impl UpdateCartForm {
    /// Quantity typed into the cart's number input.
    ///
    /// Anything that is not an integer counts as 1. Values below 1 map to 0,
    /// which the cart ignores.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        match self.quantity.trim().parse::<i64>() {
            Ok(n) if n < 1 => 0,
            Ok(n) => u32::try_from(n).unwrap_or(u32::MAX),
            Err(_) => 1,
        }
    }
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub weight: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> impl IntoResponse {
    let cart = Cart::open(SessionSlot::load(&session).await);
    CartShowTemplate {
        cart: CartView::from_entries(cart.entries()),
    }
}

/// Add item to cart (HTMX).
///
/// Resolves the product from the catalog at its discounted price and merges
/// it into an existing line for the same product and pack size. Returns the
/// updated count badge.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state
        .catalog()
        .get(form.product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    if !product.in_stock {
        return Err(AppError::BadRequest(format!(
            "{} is out of stock",
            product.name
        )));
    }
    if let Some(weight) = form
        .weight
        .as_deref()
        .filter(|weight| !product.weights.iter().any(|w| w == weight))
    {
        return Err(AppError::BadRequest(format!(
            "{} is not sold in {weight}",
            product.name
        )));
    }

    let entry = product.to_cart_entry(form.quantity.unwrap_or(1), form.weight.as_deref())?;

    let mut cart = SessionCart::open(&session).await;
    cart.cart.add_item(entry)?;
    let count = cart.cart.total_items();
    let changed = cart.finish(&session).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &form.product_id.to_string())]),
    );
    tracing::info!(product_id = %form.product_id, count, "Item added to cart");

    Ok(respond(changed.is_some(), CartCountTemplate { count }))
}

/// Update cart item quantity (HTMX).
///
/// A quantity below 1 leaves the cart unchanged. The items fragment is
/// returned either way, so the input snaps back to the stored quantity.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Response> {
    let quantity = form.quantity();
    let key = LineKey::new(form.product_id, form.weight);

    let mut cart = SessionCart::open(&session).await;
    cart.cart.update_line_quantity(&key, quantity)?;
    let view = CartView::from_entries(cart.cart.entries());
    let changed = cart.finish(&session).await?;

    Ok(respond(changed.is_some(), CartItemsTemplate { cart: view }))
}

/// Remove item from cart (HTMX).
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Response> {
    let key = LineKey::new(form.product_id, form.weight);

    let mut cart = SessionCart::open(&session).await;
    let removed = cart.cart.remove_line(&key)?;
    let view = CartView::from_entries(cart.cart.entries());
    let changed = cart.finish(&session).await?;

    tracing::info!(product_id = %removed.id(), "Item removed from cart");

    Ok(respond(changed.is_some(), CartItemsTemplate { cart: view }))
}

/// Empty the cart (HTMX).
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Response> {
    let mut cart = SessionCart::open(&session).await;
    cart.cart.clear()?;
    let changed = cart.finish(&session).await?;

    Ok(respond(
        changed.is_some(),
        CartItemsTemplate {
            cart: CartView::empty(),
        },
    ))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let cart = Cart::open(SessionSlot::load(&session).await);
    CartCountTemplate {
        count: cart.total_items(),
    }
}

/// Hand the order off to the shop's WhatsApp number.
///
/// The cart is left intact; an empty cart goes back to the cart page.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Response {
    let cart = Cart::open(SessionSlot::load(&session).await);
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let url = checkout_url(&state.config().order_phone, &cart.order_message());
    tracing::info!(
        lines = cart.len(),
        items = cart.total_items(),
        total = %cart.total(),
        "Checkout handed off"
    );
    Redirect::to(&url).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use masala_core::MemoryStore;

    use super::*;

    fn entry(id: i32, price: i64, quantity: u32) -> CartEntry {
        CartEntry::new(ProductId::new(id), "Cumin", Decimal::from(price), quantity).unwrap()
    }

    #[test]
    fn test_cart_view_from_entries() {
        let view = CartView::from_entries(&[entry(1, 100, 2), entry(2, 50, 3)]);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.subtotal, Decimal::from(350));
        assert_eq!(view.item_count, 5);
    }

    #[test]
    fn test_rendered_cart_tracks_notifications() {
        let rendered = RenderedCart::default();
        let mut cart = Cart::open(MemoryStore::new());
        cart.subscribe(rendered.subscriber());

        assert!(rendered.take().is_none());
        cart.add_item(entry(1, 100, 1)).unwrap();
        let view = rendered.take().unwrap();
        assert_eq!(view.item_count, 1);
        assert!(rendered.take().is_none());

        cart.update_quantity(0, 0).unwrap();
        assert!(rendered.take().is_none());
    }

    fn update_form(quantity: &str) -> UpdateCartForm {
        UpdateCartForm {
            product_id: ProductId::new(1),
            weight: None,
            quantity: quantity.to_string(),
        }
    }

    #[test]
    fn test_update_form_quantity_parsing() {
        assert_eq!(update_form("3").quantity(), 3);
        assert_eq!(update_form(" 12 ").quantity(), 12);
        assert_eq!(update_form("0").quantity(), 0);
        assert_eq!(update_form("-1").quantity(), 0);
        assert_eq!(update_form("abc").quantity(), 1);
        assert_eq!(update_form("").quantity(), 1);
        assert_eq!(update_form("99999999999").quantity(), u32::MAX);
    }

    #[test]
    fn test_respond_sets_trigger_only_on_change() {
        let changed = respond(true, "ok");
        assert_eq!(changed.headers().get(HX_TRIGGER).unwrap(), CART_UPDATED);

        let unchanged = respond(false, "ok");
        assert!(unchanged.headers().get(HX_TRIGGER).is_none());
    }
}
