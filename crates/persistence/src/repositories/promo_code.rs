//! Promo code repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{DiscountTypeDb, PromoCodeEntity, PromoCodeUsageEntity};
use crate::metrics::QueryTimer;

const PROMO_COLUMNS: &str = "id, organization_id, code, discount_type, discount_value, \
     max_discount, valid_from, valid_until, max_uses, current_uses, per_user_limit, \
     min_order_amount, first_time_only, event_id, is_active, created_at";

const USAGE_COLUMNS: &str =
    "id, promo_code_id, registration_id, email, discount_amount, created_at, released_at";

/// Repository for promo-code-related database operations.
#[derive(Clone)]
pub struct PromoCodeRepository {
    pool: PgPool,
}

impl PromoCodeRepository {
    /// Creates a new PromoCodeRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new promo code.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        organization_id: Uuid,
        code: &str,
        discount_type: DiscountTypeDb,
        discount_value: i64,
        max_discount: Option<i64>,
        valid_from: Option<DateTime<Utc>>,
        valid_until: Option<DateTime<Utc>>,
        max_uses: Option<i32>,
        per_user_limit: Option<i32>,
        min_order_amount: Option<i64>,
        first_time_only: bool,
        event_id: Option<Uuid>,
    ) -> Result<PromoCodeEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_promo_code");
        let result = sqlx::query_as::<_, PromoCodeEntity>(&format!(
            r#"
            INSERT INTO promo_codes (organization_id, code, discount_type, discount_value,
                max_discount, valid_from, valid_until, max_uses, per_user_limit,
                min_order_amount, first_time_only, event_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PROMO_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(code)
        .bind(discount_type)
        .bind(discount_value)
        .bind(max_discount)
        .bind(valid_from)
        .bind(valid_until)
        .bind(max_uses)
        .bind(per_user_limit)
        .bind(min_order_amount)
        .bind(first_time_only)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find and lock a code by (organization, code) inside the admission
    /// transaction. The lock makes the usage-count check and the increment
    /// one atomic step.
    pub async fn find_by_code_for_update(
        conn: &mut PgConnection,
        organization_id: Uuid,
        code: &str,
    ) -> Result<Option<PromoCodeEntity>, sqlx::Error> {
        sqlx::query_as::<_, PromoCodeEntity>(&format!(
            r#"
            SELECT {PROMO_COLUMNS} FROM promo_codes
            WHERE organization_id = $1 AND UPPER(code) = UPPER($2)
            FOR UPDATE
            "#
        ))
        .bind(organization_id)
        .bind(code)
        .fetch_optional(conn)
        .await
    }

    /// How many unreleased usages of this code belong to an email.
    pub async fn count_uses_by_email(
        conn: &mut PgConnection,
        promo_code_id: Uuid,
        email: &str,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM promo_code_usages
            WHERE promo_code_id = $1 AND LOWER(email) = LOWER($2) AND released_at IS NULL
            "#,
        )
        .bind(promo_code_id)
        .bind(email)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    /// Whether an email has any active registration in the organization
    /// (first-time-only rule input).
    pub async fn email_has_prior_registration(
        conn: &mut PgConnection,
        organization_id: Uuid,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM registrations r
                JOIN events e ON e.id = r.event_id
                WHERE e.organization_id = $1
                  AND LOWER(r.email) = LOWER($2)
                  AND r.status <> 'cancelled'
            )
            "#,
        )
        .bind(organization_id)
        .bind(email)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    /// Record one application of the code and bump its usage counter, in the
    /// caller's transaction (atomic with the registration insert).
    pub async fn apply_usage(
        conn: &mut PgConnection,
        promo_code_id: Uuid,
        registration_id: Uuid,
        email: &str,
        discount_amount: i64,
    ) -> Result<PromoCodeUsageEntity, sqlx::Error> {
        let usage = sqlx::query_as::<_, PromoCodeUsageEntity>(&format!(
            r#"
            INSERT INTO promo_code_usages (promo_code_id, registration_id, email, discount_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING {USAGE_COLUMNS}
            "#
        ))
        .bind(promo_code_id)
        .bind(registration_id)
        .bind(email)
        .bind(discount_amount)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "UPDATE promo_codes SET current_uses = current_uses + 1 WHERE id = $1",
        )
        .bind(promo_code_id)
        .execute(conn)
        .await?;

        Ok(usage)
    }

    /// Release a usage when the payment ultimately fails or is refunded for
    /// capacity, so the code's slot becomes available again. Idempotent: a
    /// usage is only released once.
    pub async fn release_usage(
        conn: &mut PgConnection,
        usage_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let released: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE promo_code_usages SET released_at = NOW()
            WHERE id = $1 AND released_at IS NULL
            RETURNING promo_code_id
            "#,
        )
        .bind(usage_id)
        .fetch_optional(&mut *conn)
        .await?;

        match released {
            Some((promo_code_id,)) => {
                sqlx::query(
                    "UPDATE promo_codes SET current_uses = GREATEST(current_uses - 1, 0) \
                     WHERE id = $1",
                )
                .bind(promo_code_id)
                .execute(conn)
                .await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// List codes for an event's organization (admin listing).
    pub async fn list_for_event(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<PromoCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_promo_codes_for_event");
        let result = sqlx::query_as::<_, PromoCodeEntity>(&format!(
            r#"
            SELECT {PROMO_COLUMNS} FROM promo_codes
            WHERE event_id = $1 OR (event_id IS NULL AND organization_id = (
                SELECT organization_id FROM events WHERE id = $1
            ))
            ORDER BY created_at DESC
            "#
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
