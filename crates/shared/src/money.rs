//! Money arithmetic in currency minor units.
//!
//! All amounts in the system are integer minor units (cents for two-decimal
//! currencies), matching what the payment gateway reports. Floating point is
//! never used for money.

/// Computes a percentage discount on a price, rounded half-up to the nearest
/// minor unit, optionally capped at `max_discount`.
///
/// `percent` is a whole-number percentage (20 = 20%). The result never
/// exceeds the price itself.
pub fn percentage_discount(price: i64, percent: i64, max_discount: Option<i64>) -> i64 {
    if price <= 0 || percent <= 0 {
        return 0;
    }
    // Half-up rounding of price * percent / 100 in integer arithmetic.
    let discount = (price * percent + 50) / 100;
    let discount = match max_discount {
        Some(cap) if cap >= 0 => discount.min(cap),
        _ => discount,
    };
    discount.min(price)
}

/// Computes a fixed-amount discount, clamped to the price.
pub fn fixed_discount(price: i64, value: i64) -> i64 {
    if price <= 0 || value <= 0 {
        return 0;
    }
    value.min(price)
}

/// Final price after applying a discount: `max(0, price - discount)`.
pub fn apply_discount(price: i64, discount: i64) -> i64 {
    (price - discount).max(0)
}

/// Formats a minor-unit amount as a decimal string, e.g. `4999` -> `"49.99"`.
///
/// Assumes a two-decimal currency; used for logging and API responses only.
pub fn format_minor(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
