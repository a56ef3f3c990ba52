//! Order hand-off to the shop's messaging channel.
//!
//! Checkout has no server-side order flow: the customer is sent to a WhatsApp
//! deep link with the order summary pre-filled, and the shop replies there
//! asking for shipping details.

use rust_decimal::Decimal;
use thiserror::Error;

use super::CartEntry;
use crate::types::format_inr;

/// Base URL of the click-to-chat service.
pub const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Shortest accepted phone number (digits).
pub const MIN_PHONE_DIGITS: usize = 7;
/// Longest accepted phone number (E.164 limit).
pub const MAX_PHONE_DIGITS: usize = 15;

/// Why a phone number cannot be used in a checkout link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("must contain only digits")]
    NotDigits,
    #[error("must have {MIN_PHONE_DIGITS} to {MAX_PHONE_DIGITS} digits (got {0})")]
    Length(usize),
}

/// Strip formatting from a phone number and check it is a plausible
/// international number.
///
/// A leading `+`, spaces and dashes are removed: `+91 98765-43210` becomes
/// `919876543210`.
///
/// # Errors
///
/// Returns `PhoneError` if anything but digits remains or the digit count is
/// outside `MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS`.
pub fn normalize_phone(raw: &str) -> Result<String, PhoneError> {
    let digits: String = raw
        .trim()
        .trim_start_matches('+')
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PhoneError::NotDigits);
    }
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(PhoneError::Length(digits.len()));
    }
    Ok(digits)
}

/// Render the order summary for the given cart lines.
///
/// Uses WhatsApp markup (`*bold*`, `_italic_`). Each line shows the line
/// total, not the unit price.
#[must_use]
pub fn order_message(entries: &[CartEntry]) -> String {
    let items = entries
        .iter()
        .map(|entry| {
            format!(
                "{}x {} - {}",
                entry.quantity(),
                entry.name(),
                format_inr(entry.line_total())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let total: Decimal = entries.iter().map(CartEntry::line_total).sum();

    format!(
        "🛒 *New Order*\n\n*Items:*\n{items}\n\n*Total: {}*\n\n\
         _Please provide shipping details to complete the order._",
        format_inr(total)
    )
}

/// Build the deep link that opens a chat with `phone` and a pre-filled message.
///
/// `phone` is used verbatim. Pass it through [`normalize_phone`] first.
#[must_use]
pub fn checkout_url(phone: &str, message: &str) -> String {
    format!(
        "{WHATSAPP_BASE_URL}/{phone}?text={}",
        urlencoding::encode(message)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn entry(id: i32, name: &str, price: i64, quantity: u32) -> CartEntry {
        CartEntry::new(ProductId::new(id), name, Decimal::from(price), quantity).unwrap()
    }

    #[test]
    fn test_order_message_layout() {
        let entries = vec![
            entry(1, "Garam Masala", 150, 2),
            entry(2, "Kashmiri Saffron", 1_200, 1),
        ];

        let message = order_message(&entries);

        assert_eq!(
            message,
            "🛒 *New Order*\n\n\
             *Items:*\n\
             2x Garam Masala - ₹300\n\
             1x Kashmiri Saffron - ₹1,200\n\n\
             *Total: ₹1,500*\n\n\
             _Please provide shipping details to complete the order._"
        );
    }

    #[test]
    fn test_order_message_empty_cart() {
        let message = order_message(&[]);
        assert!(message.contains("*Total: ₹0*"));
    }

    #[test]
    fn test_checkout_url_percent_encodes_message() {
        let url = checkout_url("919876543210", "2x Hing - ₹90\n*Total*");
        assert_eq!(
            url,
            "https://wa.me/919876543210?text=2x%20Hing%20-%20%E2%82%B990%0A%2ATotal%2A"
        );
    }

    #[test]
    fn test_normalize_phone_strips_formatting() {
        assert_eq!(normalize_phone("+91 98765-43210").unwrap(), "919876543210");
    }

    #[test]
    fn test_normalize_phone_rejects_letters() {
        assert_eq!(normalize_phone("call me"), Err(PhoneError::NotDigits));
    }

    #[test]
    fn test_normalize_phone_rejects_bad_length() {
        assert_eq!(normalize_phone("1"), Err(PhoneError::Length(1)));
        assert_eq!(normalize_phone("+"), Err(PhoneError::Length(0)));
        assert_eq!(
            normalize_phone("1234567890123456"),
            Err(PhoneError::Length(16))
        );
        assert!(normalize_phone("1234567").is_ok());
    }
}
