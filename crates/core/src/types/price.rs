//! Rupee amount formatting.
//!
//! Amounts are rendered the way `Intl.NumberFormat('en-IN')` shows them in the
//! shop's browser views: a rupee sign, Indian digit grouping (the last three
//! digits, then groups of two) and at most two fraction digits with trailing
//! zeros dropped.

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol used on every rendered price.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Format an amount as Indian rupees.
///
/// ```
/// use masala_core::format_inr;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_inr(Decimal::from(123_456)), "₹1,23,456");
/// assert_eq!(format_inr(Decimal::new(12_345, 1)), "₹1,234.5");
/// ```
#[must_use]
pub fn format_inr(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();
    let (whole, fraction) = text
        .split_once('.')
        .map_or((text.as_str(), None), |(whole, fraction)| {
            (whole, Some(fraction))
        });

    let mut out = String::with_capacity(text.len() + 8);
    if negative {
        out.push('-');
    }
    out.push_str(CURRENCY_SYMBOL);
    out.push_str(&group_indian(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Insert lakh/crore separators into a run of ASCII digits.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}
