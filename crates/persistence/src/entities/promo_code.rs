//! Promo code entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::promo_code::{DiscountType, PromoCode};

/// Database enum for discount_type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "discount_type", rename_all = "snake_case")]
pub enum DiscountTypeDb {
    Percentage,
    FixedAmount,
}

impl From<DiscountTypeDb> for DiscountType {
    fn from(db: DiscountTypeDb) -> Self {
        match db {
            DiscountTypeDb::Percentage => DiscountType::Percentage,
            DiscountTypeDb::FixedAmount => DiscountType::FixedAmount,
        }
    }
}

impl From<DiscountType> for DiscountTypeDb {
    fn from(t: DiscountType) -> Self {
        match t {
            DiscountType::Percentage => DiscountTypeDb::Percentage,
            DiscountType::FixedAmount => DiscountTypeDb::FixedAmount,
        }
    }
}

/// Database row mapping for the promo_codes table.
#[derive(Debug, Clone, FromRow)]
pub struct PromoCodeEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: String,
    pub discount_type: DiscountTypeDb,
    pub discount_value: i64,
    pub max_discount: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub per_user_limit: Option<i32>,
    pub min_order_amount: Option<i64>,
    pub first_time_only: bool,
    pub event_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PromoCodeEntity> for PromoCode {
    fn from(e: PromoCodeEntity) -> Self {
        PromoCode {
            id: e.id,
            organization_id: e.organization_id,
            code: e.code,
            discount_type: e.discount_type.into(),
            discount_value: e.discount_value,
            max_discount: e.max_discount,
            valid_from: e.valid_from,
            valid_until: e.valid_until,
            max_uses: e.max_uses,
            current_uses: e.current_uses,
            per_user_limit: e.per_user_limit,
            min_order_amount: e.min_order_amount,
            first_time_only: e.first_time_only,
            event_id: e.event_id,
            is_active: e.is_active,
            created_at: e.created_at,
        }
    }
}

/// Database row mapping for the promo_code_usages table.
#[derive(Debug, Clone, FromRow)]
pub struct PromoCodeUsageEntity {
    pub id: Uuid,
    pub promo_code_id: Uuid,
    pub registration_id: Uuid,
    pub email: String,
    pub discount_amount: i64,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}
