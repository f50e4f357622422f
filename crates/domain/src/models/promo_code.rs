//! Promo code domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_amount, validate_promo_code};

/// How a promo code discounts the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a whole-number percentage of the price.
    Percentage,
    /// `discount_value` is a fixed amount in minor units.
    FixedAmount,
}

/// A promo code and its redemption rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromoCode {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    /// Cap for percentage discounts, in minor units.
    pub max_discount: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    /// None = unlimited redemptions.
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub per_user_limit: Option<i32>,
    /// Minimum order price in minor units for the code to apply.
    pub min_order_amount: Option<i64>,
    /// Only valid for a requester with no prior registration in the org.
    pub first_time_only: bool,
    /// None = applies to any event in the organization.
    pub event_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Why a promo code cannot be applied. All variants are user-facing and
/// non-retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoCodeError {
    #[error("Promo code not found")]
    NotFound,
    #[error("Promo code is no longer active")]
    Inactive,
    #[error("Promo code has expired")]
    Expired,
    #[error("Promo code is not yet valid")]
    NotYetValid,
    #[error("Promo code has reached its usage limit")]
    Exhausted,
    #[error("Promo code usage limit reached for this email")]
    PerUserLimitReached,
    #[error("Promo code does not apply to this event")]
    NotApplicableToEvent,
    #[error("Order does not meet the minimum amount for this promo code")]
    MinimumOrderNotMet,
    #[error("Promo code is only valid for first-time registrants")]
    FirstTimeOnly,
}

impl PromoCodeError {
    /// Stable machine-readable reason code for API responses.
    pub fn reason(&self) -> &'static str {
        match self {
            PromoCodeError::NotFound => "promo_not_found",
            PromoCodeError::Inactive => "promo_inactive",
            PromoCodeError::Expired => "promo_expired",
            PromoCodeError::NotYetValid => "promo_not_yet_valid",
            PromoCodeError::Exhausted => "promo_exhausted",
            PromoCodeError::PerUserLimitReached => "promo_per_user_limit",
            PromoCodeError::NotApplicableToEvent => "promo_not_applicable",
            PromoCodeError::MinimumOrderNotMet => "promo_minimum_order",
            PromoCodeError::FirstTimeOnly => "promo_first_time_only",
        }
    }
}

/// Request to create a promo code for an event's organization.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreatePromoCodeRequest {
    /// Auto-generated when omitted.
    #[validate(custom(function = "validate_promo_code"))]
    pub code: Option<String>,

    pub discount_type: DiscountType,

    #[validate(range(min = 1, message = "discount_value must be positive"))]
    pub discount_value: i64,

    #[validate(custom(function = "validate_amount"))]
    pub max_discount: Option<i64>,

    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,

    #[validate(range(min = 1, message = "max_uses must be at least 1"))]
    pub max_uses: Option<i32>,

    #[validate(range(min = 1, message = "per_user_limit must be at least 1"))]
    pub per_user_limit: Option<i32>,

    #[validate(custom(function = "validate_amount"))]
    pub min_order_amount: Option<i64>,

    #[serde(default)]
    pub first_time_only: bool,

    /// Restrict the code to the event it is created under (default true).
    #[serde(default = "default_event_scoped")]
    pub event_scoped: bool,
}

fn default_event_scoped() -> bool {
    true
}

/// Generates a random promo code of the form `XXXX-XXXX`, avoiding
/// easily-confused characters.
pub fn generate_promo_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let chars: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    let mut segment = || -> String {
        (0..4)
            .map(|_| {
                let idx = rng.gen_range(0..chars.len());
                chars[idx] as char
            })
            .collect()
    };

    format!("{}-{}", segment(), segment())
}
