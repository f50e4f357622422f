//! Operational entities: meeting-sync outbox and reconciliation alerts.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for sync_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "sync_status", rename_all = "snake_case")]
pub enum SyncStatusDb {
    Pending,
    Completed,
    Failed,
}

/// Database row mapping for the meeting_sync_queue table.
#[derive(Debug, Clone, FromRow)]
pub struct MeetingSyncEntity {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub status: SyncStatusDb,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub registrant_id: Option<String>,
    pub join_url: Option<String>,
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row mapping for the reconciliation_alerts table.
#[derive(Debug, Clone, FromRow)]
pub struct ReconciliationAlertEntity {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub payment_intent_id: String,
    pub amount: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
