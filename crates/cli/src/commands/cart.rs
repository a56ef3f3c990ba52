//! Cart commands.
//!
//! The cart lives in `<data-dir>/cart.json`, the same JSON sequence the
//! storefront keeps in the visitor's session. Every command opens the cart,
//! applies at most one mutation and exits; a subscriber prints the cart
//! whenever it changes.
//!
//! # Usage
//!
//! ```bash
//! masala-cli cart add --id 1 --name "Lakadong Turmeric" --price 180 --weight 250g
//! masala-cli cart update 0 3
//! masala-cli cart checkout-url --phone +919876543210
//! ```

use std::io::{self, Write};
use std::path::Path;

use masala_core::cart::order::{checkout_url, normalize_phone};
use masala_core::{Cart, CartEntry, FileStore, ProductId, SubscriberError, format_inr};
use rust_decimal::Decimal;

use super::CliError;

/// A line to add, as given on the command line.
#[derive(Debug, Clone)]
pub struct NewLine {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub weight: Option<String>,
    pub image: Option<String>,
}

impl TryFrom<NewLine> for CartEntry {
    type Error = CliError;

    fn try_from(line: NewLine) -> Result<Self, Self::Error> {
        let mut entry = Self::new(ProductId::new(line.id), line.name, line.price, line.quantity)?;
        if let Some(weight) = line.weight {
            entry = entry.with_weight(weight);
        }
        if let Some(image) = line.image {
            entry = entry.with_image(image);
        }
        Ok(entry)
    }
}

/// Open the cart in `data_dir` with a subscriber that prints every change.
fn open(data_dir: &Path) -> Cart<FileStore> {
    let mut cart = Cart::open(FileStore::new(data_dir));
    cart.subscribe(|items| {
        write_summary(&mut io::stdout().lock(), items)
            .map_err(|e| SubscriberError::new(format!("failed to print cart: {e}")))
    });
    cart
}

/// Print the cart.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn list(data_dir: &Path) -> Result<(), CliError> {
    let cart = Cart::open(FileStore::new(data_dir));
    write_summary(&mut io::stdout().lock(), cart.entries())?;
    Ok(())
}

/// Add a line, merging with an existing line for the same product and
/// pack size.
///
/// # Errors
///
/// Returns an error if the line has a negative price or zero quantity, or
/// if the cart file cannot be written.
pub fn add(data_dir: &Path, line: NewLine) -> Result<(), CliError> {
    let entry = CartEntry::try_from(line)?;
    tracing::debug!(product_id = %entry.id(), quantity = entry.quantity(), "Adding to cart");
    open(data_dir).add_item(entry)?;
    Ok(())
}

/// Remove the line at `index`.
///
/// # Errors
///
/// Returns an error if `index` is out of range or the cart file cannot be
/// written.
pub fn remove(data_dir: &Path, index: usize) -> Result<(), CliError> {
    let removed = open(data_dir).remove_item(index)?;
    tracing::info!(product_id = %removed.id(), name = removed.name(), "Removed from cart");
    Ok(())
}

/// Set the quantity of the line at `index`. Zero is ignored.
///
/// # Errors
///
/// Returns an error if `index` is out of range or the cart file cannot be
/// written.
pub fn update(data_dir: &Path, index: usize, quantity: u32) -> Result<(), CliError> {
    if quantity < 1 {
        tracing::warn!(index, "Quantity must be at least 1; cart unchanged");
    }
    open(data_dir).update_quantity(index, quantity)?;
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart file cannot be written.
pub fn clear(data_dir: &Path) -> Result<(), CliError> {
    open(data_dir).clear()?;
    Ok(())
}

/// Print the order message for the current cart.
///
/// # Errors
///
/// Returns `CliError::EmptyCart` if there is nothing to order.
pub fn message(data_dir: &Path) -> Result<(), CliError> {
    let cart = non_empty(data_dir)?;
    writeln!(io::stdout().lock(), "{}", cart.order_message())?;
    Ok(())
}

/// Print the WhatsApp checkout link for the current cart.
///
/// # Errors
///
/// Returns an error if the cart is empty or the phone number is invalid.
pub fn checkout(data_dir: &Path, phone: &str) -> Result<(), CliError> {
    let phone = normalize_phone(phone)?;
    let cart = non_empty(data_dir)?;
    writeln!(
        io::stdout().lock(),
        "{}",
        checkout_url(&phone, &cart.order_message())
    )?;
    Ok(())
}

fn non_empty(data_dir: &Path) -> Result<Cart<FileStore>, CliError> {
    let cart = Cart::open(FileStore::new(data_dir));
    if cart.is_empty() {
        return Err(CliError::EmptyCart);
    }
    Ok(cart)
}

fn write_summary(out: &mut impl Write, items: &[CartEntry]) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "Cart is empty");
    }

    for (index, item) in items.iter().enumerate() {
        let weight = item.weight().map(|w| format!(" ({w})")).unwrap_or_default();
        writeln!(
            out,
            "{index:>3}  {}x {}{weight}  {}",
            item.quantity(),
            item.name(),
            format_inr(item.line_total())
        )?;
    }

    let total: Decimal = items.iter().map(CartEntry::line_total).sum();
    let count = items
        .iter()
        .fold(0_u32, |sum, item| sum.saturating_add(item.quantity()));
    writeln!(out, "     {count} items, total {}", format_inr(total))
}
