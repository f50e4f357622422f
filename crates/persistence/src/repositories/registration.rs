//! Registration repository for database operations.
//!
//! Financial fields are only written by the reconciliation helpers here,
//! always inside a transaction that holds the registration and event row
//! locks (in that order).

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{PaymentStatusDb, RegistrationEntity, RegistrationStatusDb};
use crate::metrics::QueryTimer;

const REGISTRATION_COLUMNS: &str = "id, event_id, email, first_name, last_name, status, \
     payment_status, waitlist_position, total_amount, amount_paid, payment_intent_id, \
     promo_code_usage_id, created_at, updated_at";

/// Repository for registration-related database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new registration inside the admission transaction.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        conn: &mut PgConnection,
        event_id: Uuid,
        email: &str,
        first_name: &str,
        last_name: &str,
        status: RegistrationStatusDb,
        payment_status: PaymentStatusDb,
        waitlist_position: Option<i32>,
        total_amount: i64,
    ) -> Result<RegistrationEntity, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            INSERT INTO registrations (event_id, email, first_name, last_name, status,
                payment_status, waitlist_position, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(status)
        .bind(payment_status)
        .bind(waitlist_position)
        .bind(total_amount)
        .fetch_one(conn)
        .await
    }

    /// Find registration by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_id");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find registration by its payment intent id, without locking. Used by
    /// the reconciler's idempotency fast-path.
    pub async fn find_by_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_intent");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE payment_intent_id = $1"
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lock a registration row by intent id. First half of the documented
    /// lock order (registration before event).
    pub async fn find_by_intent_for_update(
        conn: &mut PgConnection,
        intent_id: &str,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE payment_intent_id = $1 FOR UPDATE"
        ))
        .bind(intent_id)
        .fetch_optional(conn)
        .await
    }

    /// Lock a registration row by id (cancellation path).
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Active (non-cancelled) registration for the natural key (event, email).
    pub async fn find_active_by_event_email(
        conn: &mut PgConnection,
        event_id: Uuid,
        email: &str,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE event_id = $1 AND LOWER(email) = LOWER($2) AND status <> 'cancelled'
            "#
        ))
        .bind(event_id)
        .bind(email)
        .fetch_optional(conn)
        .await
    }

    /// Live confirmed-seat count. Must be read under the event row lock so
    /// the count and the subsequent mutation are one atomic decision.
    pub async fn count_confirmed(
        conn: &mut PgConnection,
        event_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    /// Highest waitlist position currently assigned for an event.
    pub async fn max_waitlist_position(
        conn: &mut PgConnection,
        event_id: Uuid,
    ) -> Result<Option<i32>, sqlx::Error> {
        let (max,): (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(waitlist_position) FROM registrations \
             WHERE event_id = $1 AND status = 'waitlisted'",
        )
        .bind(event_id)
        .fetch_one(conn)
        .await?;
        Ok(max)
    }

    /// Attach the gateway intent id to a freshly created registration.
    pub async fn set_payment_intent(
        conn: &mut PgConnection,
        id: Uuid,
        intent_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE registrations SET payment_intent_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(intent_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Attach the promo code usage to a registration.
    pub async fn set_promo_usage(
        conn: &mut PgConnection,
        id: Uuid,
        usage_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE registrations SET promo_code_usage_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(usage_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Terminal success: payment captured and the seat held. Flips a pending
    /// registration to confirmed and records the gateway's captured amount.
    pub async fn mark_paid(
        conn: &mut PgConnection,
        id: Uuid,
        captured_amount: i64,
    ) -> Result<RegistrationEntity, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations SET
                payment_status = 'paid',
                status = CASE WHEN status = 'pending' THEN 'confirmed'::registration_status
                              ELSE status END,
                amount_paid = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(captured_amount)
        .fetch_one(conn)
        .await
    }

    /// Terminal failure of the payment.
    pub async fn mark_failed(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<RegistrationEntity, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations SET payment_status = 'failed', updated_at = NOW()
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(conn)
        .await
    }

    /// Compensating path: payment succeeded but the event was full, and the
    /// captured amount was refunded.
    pub async fn mark_refunded(
        conn: &mut PgConnection,
        id: Uuid,
        refunded_amount: i64,
    ) -> Result<RegistrationEntity, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations SET
                payment_status = 'refunded',
                amount_paid = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(refunded_amount)
        .fetch_one(conn)
        .await
    }

    /// Cancel a registration, clearing any waitlist position.
    pub async fn cancel(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<RegistrationEntity, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations SET
                status = 'cancelled',
                waitlist_position = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(conn)
        .await
    }

    /// Lowest-position waitlisted registration for an event, locked.
    pub async fn next_waitlisted_for_update(
        conn: &mut PgConnection,
        event_id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE event_id = $1 AND status = 'waitlisted'
            ORDER BY waitlist_position ASC
            LIMIT 1
            FOR UPDATE
            "#
        ))
        .bind(event_id)
        .fetch_optional(conn)
        .await
    }

    /// Promote a waitlisted registration: confirmed, position cleared.
    pub async fn promote(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<RegistrationEntity, sqlx::Error> {
        sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations SET
                status = 'confirmed',
                waitlist_position = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'waitlisted'
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(conn)
        .await
    }

    /// Count registrations for an event.
    pub async fn count_for_event(&self, event_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
