//! Append-only audit trail of registration status transitions.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{PaymentStatusDb, RegistrationStatusDb};

/// One recorded transition, for operability queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRecord {
    pub id: i64,
    pub registration_id: Uuid,
    pub from_status: RegistrationStatusDb,
    pub to_status: RegistrationStatusDb,
    pub from_payment_status: PaymentStatusDb,
    pub to_payment_status: PaymentStatusDb,
    pub trigger: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Repository for the registration_audit table.
#[derive(Clone)]
pub struct RegistrationAuditRepository {
    pool: PgPool,
}

impl RegistrationAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a transition inside the transaction that performs it.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        conn: &mut PgConnection,
        registration_id: Uuid,
        from_status: RegistrationStatusDb,
        to_status: RegistrationStatusDb,
        from_payment_status: PaymentStatusDb,
        to_payment_status: PaymentStatusDb,
        trigger: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO registration_audit
                (registration_id, from_status, to_status, from_payment_status,
                 to_payment_status, trigger)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(registration_id)
        .bind(from_status)
        .bind(to_status)
        .bind(from_payment_status)
        .bind(to_payment_status)
        .bind(trigger)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Transition history for one registration, oldest first.
    pub async fn list_for_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Vec<AuditRecord>, sqlx::Error> {
        sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, registration_id, from_status, to_status, from_payment_status,
                   to_payment_status, trigger, created_at
            FROM registration_audit
            WHERE registration_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await
    }
}
