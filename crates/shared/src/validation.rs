//! Common validation utilities.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Promo codes: 3-32 chars, uppercase letters, digits, hyphens.
    static ref PROMO_CODE_RE: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9-]{2,31}$").expect("valid regex");
    /// ISO 4217 alphabetic currency codes.
    static ref CURRENCY_RE: Regex = Regex::new(r"^[A-Z]{3}$").expect("valid regex");
}

/// Validates a promo code string format.
pub fn validate_promo_code(code: &str) -> Result<(), ValidationError> {
    if PROMO_CODE_RE.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("promo_code_format");
        err.message =
            Some("Promo code must be 3-32 uppercase letters, digits or hyphens".into());
        Err(err)
    }
}

/// Validates an ISO 4217 currency code (e.g. "USD", "EUR").
pub fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if CURRENCY_RE.is_match(currency) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency_format");
        err.message = Some("Currency must be a 3-letter ISO 4217 code".into());
        Err(err)
    }
}

/// Validates that a minor-unit amount is non-negative.
pub fn validate_amount(amount: i64) -> Result<(), ValidationError> {
    if amount >= 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("amount_range");
        err.message = Some("Amount must be non-negative".into());
        Err(err)
    }
}

/// Validates that an optional time window is well-formed (opens before closes).
pub fn validate_window(
    opens_at: Option<DateTime<Utc>>,
    closes_at: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if let (Some(opens), Some(closes)) = (opens_at, closes_at) {
        if opens >= closes {
            let mut err = ValidationError::new("window_order");
            err.message = Some("Registration window must open before it closes".into());
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_valid_promo_codes() {
        assert!(validate_promo_code("SUMMER25").is_ok());
        assert!(validate_promo_code("ABC-DEF-123").is_ok());
        assert!(validate_promo_code("X25").is_ok());
    }

    #[test]
    fn test_invalid_promo_codes() {
        assert!(validate_promo_code("ab").is_err()); // lowercase
        assert!(validate_promo_code("AB").is_err()); // too short
        assert!(validate_promo_code("-LEADING").is_err());
        assert!(validate_promo_code("HAS SPACE").is_err());
        assert!(validate_promo_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_currency_codes() {
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("EUR").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("USDX").is_err());
    }

    #[test]
    fn test_amount_range() {
        assert!(validate_amount(0).is_ok());
        assert!(validate_amount(4999).is_ok());
        assert!(validate_amount(-1).is_err());
    }

    #[test]
    fn test_window_order() {
        let now = Utc::now();
        assert!(validate_window(Some(now), Some(now + Duration::hours(1))).is_ok());
        assert!(validate_window(Some(now), Some(now)).is_err());
        assert!(validate_window(None, Some(now)).is_ok());
        assert!(validate_window(Some(now), None).is_ok());
        assert!(validate_window(None, None).is_ok());
    }
}
