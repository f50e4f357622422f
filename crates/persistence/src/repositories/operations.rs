//! Repositories for the meeting-sync outbox and the operator alert queue.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{MeetingSyncEntity, ReconciliationAlertEntity};
use crate::metrics::QueryTimer;

const SYNC_COLUMNS: &str = "id, registration_id, status, attempts, last_error, registrant_id, \
     join_url, next_attempt_at, created_at, updated_at";

const ALERT_COLUMNS: &str =
    "id, registration_id, payment_intent_id, amount, reason, created_at, resolved_at";

/// Repository for the meeting_sync_queue outbox.
#[derive(Clone)]
pub struct MeetingSyncRepository {
    pool: PgPool,
}

impl MeetingSyncRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue the add-registrant side effect for a registration, inside the
    /// transaction that confirms it. The unique index makes this a no-op on
    /// replay, which is what bounds the side effect to at-most-once.
    pub async fn enqueue(
        conn: &mut PgConnection,
        registration_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO meeting_sync_queue (registration_id)
            VALUES ($1)
            ON CONFLICT (registration_id) DO NOTHING
            "#,
        )
        .bind(registration_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Pending entries that are due for an attempt.
    pub async fn due_batch(&self, limit: i64) -> Result<Vec<MeetingSyncEntity>, sqlx::Error> {
        let timer = QueryTimer::new("meeting_sync_due_batch");
        let result = sqlx::query_as::<_, MeetingSyncEntity>(&format!(
            r#"
            SELECT {SYNC_COLUMNS} FROM meeting_sync_queue
            WHERE status = 'pending' AND next_attempt_at <= NOW()
            ORDER BY next_attempt_at ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Mark an entry delivered, recording the registrant handle.
    pub async fn mark_completed(
        &self,
        id: Uuid,
        registrant_id: &str,
        join_url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE meeting_sync_queue SET
                status = 'completed',
                registrant_id = $2,
                join_url = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(registrant_id)
        .bind(join_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a failed attempt; schedules the next one with exponential
    /// backoff, or gives up once `max_attempts` is reached.
    pub async fn mark_attempt_failed(
        &self,
        id: Uuid,
        attempts: i32,
        max_attempts: i32,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        if attempts >= max_attempts {
            sqlx::query(
                r#"
                UPDATE meeting_sync_queue SET
                    status = 'failed', attempts = $2, last_error = $3, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(attempts)
            .bind(error)
            .execute(&self.pool)
            .await?;
        } else {
            let delay_secs = 60i64 << (attempts.min(10) as u32);
            let next_attempt: DateTime<Utc> = Utc::now() + Duration::seconds(delay_secs);
            sqlx::query(
                r#"
                UPDATE meeting_sync_queue SET
                    attempts = $2, last_error = $3, next_attempt_at = $4, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(attempts)
            .bind(error)
            .bind(next_attempt)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

/// Repository for the reconciliation_alerts operator queue.
#[derive(Clone)]
pub struct ReconciliationAlertRepository {
    pool: PgPool,
}

impl ReconciliationAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Raise an alert. Written outside the reconciliation transaction (the
    /// transaction is rolled back when the refund fails), so it uses the
    /// pool directly.
    pub async fn create(
        &self,
        registration_id: Uuid,
        payment_intent_id: &str,
        amount: i64,
        reason: &str,
    ) -> Result<ReconciliationAlertEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_reconciliation_alert");
        let result = sqlx::query_as::<_, ReconciliationAlertEntity>(&format!(
            r#"
            INSERT INTO reconciliation_alerts (registration_id, payment_intent_id, amount, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(registration_id)
        .bind(payment_intent_id)
        .bind(amount)
        .bind(reason)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Unresolved alerts, oldest first.
    pub async fn list_open(&self) -> Result<Vec<ReconciliationAlertEntity>, sqlx::Error> {
        sqlx::query_as::<_, ReconciliationAlertEntity>(&format!(
            r#"
            SELECT {ALERT_COLUMNS} FROM reconciliation_alerts
            WHERE resolved_at IS NULL
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Number of unresolved alerts (exported as a gauge).
    pub async fn count_open(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reconciliation_alerts WHERE resolved_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Mark an alert resolved. Returns false if it was already resolved or
    /// does not exist.
    pub async fn resolve(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reconciliation_alerts SET resolved_at = NOW() \
             WHERE id = $1 AND resolved_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
