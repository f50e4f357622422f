//! Promo code validation rules engine.
//!
//! Pure function of code state and usage history as of call time. Validation
//! never mutates usage counters; the counter is incremented by the admission
//! transaction when the code is actually applied, so validation can be
//! retried freely while application happens exactly once per registration.

use uuid::Uuid;

use crate::models::promo_code::{DiscountType, PromoCode, PromoCodeError};
use shared::money::{apply_discount, fixed_discount, percentage_discount};

/// Everything about the requester and the order the rules need to see.
#[derive(Debug, Clone)]
pub struct PromoContext {
    pub event_id: Uuid,
    /// Order price before discount, in minor units.
    pub price: i64,
    /// How many times this email has already used this code.
    pub uses_by_email: i64,
    /// Whether this email has any prior registration in the organization.
    pub has_prior_registration: bool,
    pub now: chrono::DateTime<chrono::Utc>,
}

/// A successfully computed discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    /// Discount amount in minor units.
    pub amount: i64,
    /// `max(0, price - amount)`.
    pub final_price: i64,
}

/// Validates a promo code against an order and computes the discount.
///
/// Rules are checked in a fixed order so the caller always surfaces the
/// same error for the same state.
pub fn validate_promo(code: &PromoCode, ctx: &PromoContext) -> Result<Discount, PromoCodeError> {
    if !code.is_active {
        return Err(PromoCodeError::Inactive);
    }
    if let Some(from) = code.valid_from {
        if ctx.now < from {
            return Err(PromoCodeError::NotYetValid);
        }
    }
    if let Some(until) = code.valid_until {
        if ctx.now > until {
            return Err(PromoCodeError::Expired);
        }
    }
    if let Some(event_id) = code.event_id {
        if event_id != ctx.event_id {
            return Err(PromoCodeError::NotApplicableToEvent);
        }
    }
    if let Some(max_uses) = code.max_uses {
        if code.current_uses >= max_uses {
            return Err(PromoCodeError::Exhausted);
        }
    }
    if let Some(limit) = code.per_user_limit {
        if ctx.uses_by_email >= i64::from(limit) {
            return Err(PromoCodeError::PerUserLimitReached);
        }
    }
    if let Some(min_order) = code.min_order_amount {
        if ctx.price < min_order {
            return Err(PromoCodeError::MinimumOrderNotMet);
        }
    }
    if code.first_time_only && ctx.has_prior_registration {
        return Err(PromoCodeError::FirstTimeOnly);
    }

    let amount = match code.discount_type {
        DiscountType::Percentage => {
            percentage_discount(ctx.price, code.discount_value, code.max_discount)
        }
        DiscountType::FixedAmount => fixed_discount(ctx.price, code.discount_value),
    };

    Ok(Discount {
        amount,
        final_price: apply_discount(ctx.price, amount),
    })
}
