//! Event repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::EventEntity;
use crate::metrics::QueryTimer;

const EVENT_COLUMNS: &str = "id, organization_id, title, description, status, price, currency, \
     max_attendees, waitlist_enabled, registration_opens_at, registration_closes_at, starts_at, \
     meeting_id, confirmed_count, waitlisted_count, attended_count, created_at, updated_at";

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event (in draft status).
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        organization_id: Uuid,
        title: &str,
        description: Option<&str>,
        price: i64,
        currency: &str,
        max_attendees: Option<i32>,
        waitlist_enabled: bool,
        registration_opens_at: Option<DateTime<Utc>>,
        registration_closes_at: Option<DateTime<Utc>>,
        starts_at: DateTime<Utc>,
        meeting_id: Option<&str>,
    ) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            INSERT INTO events (organization_id, title, description, price, currency,
                max_attendees, waitlist_enabled, registration_opens_at,
                registration_closes_at, starts_at, meeting_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(currency)
        .bind(max_attendees)
        .bind(waitlist_enabled)
        .bind(registration_opens_at)
        .bind(registration_closes_at)
        .bind(starts_at)
        .bind(meeting_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find event by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lock an event row for the duration of the surrounding transaction.
    ///
    /// This is the serialization point for every capacity-affecting
    /// operation: the caller must hold this lock while reading the live
    /// confirmed count and mutating registrations for the event.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Publish a draft event. Returns the updated row, or None if the event
    /// does not exist or is not a draft.
    pub async fn publish(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("publish_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            UPDATE events SET status = 'published', updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List events, optionally filtered by organization, newest first.
    pub async fn list(
        &self,
        organization_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_events");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(organization_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count events for pagination metadata.
    pub async fn count(&self, organization_id: Option<Uuid>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_events");
        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            "SELECT COUNT(*) FROM events WHERE ($1::uuid IS NULL OR organization_id = $1)",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(|(count,)| count)
    }

    /// Recompute the denormalized per-event counters from the registration
    /// rows. Safe to run from scratch at any time; purely for display.
    /// No registration status feeds `attended_count`, so the projection
    /// pins it at zero.
    pub async fn recompute_counters(&self, event_id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("recompute_event_counters");
        let result = sqlx::query(
            r#"
            UPDATE events SET
                confirmed_count = (
                    SELECT COUNT(*) FROM registrations
                    WHERE event_id = $1 AND status = 'confirmed'
                ),
                waitlisted_count = (
                    SELECT COUNT(*) FROM registrations
                    WHERE event_id = $1 AND status = 'waitlisted'
                ),
                attended_count = 0,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Recompute counters for every event. Used by the periodic refresh job
    /// to repair any drift from best-effort post-transition recomputes.
    pub async fn recompute_all_counters(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("recompute_all_event_counters");
        let result = sqlx::query(
            r#"
            UPDATE events e SET
                confirmed_count = c.confirmed,
                waitlisted_count = c.waitlisted,
                attended_count = 0,
                updated_at = NOW()
            FROM (
                SELECT ev.id,
                    COUNT(r.id) FILTER (WHERE r.status = 'confirmed') AS confirmed,
                    COUNT(r.id) FILTER (WHERE r.status = 'waitlisted') AS waitlisted
                FROM events ev
                LEFT JOIN registrations r ON r.event_id = ev.id
                GROUP BY ev.id
            ) c
            WHERE e.id = c.id
              AND (e.confirmed_count <> c.confirmed
                   OR e.waitlisted_count <> c.waitlisted
                   OR e.attended_count <> 0)
            "#,
        )
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }
}
