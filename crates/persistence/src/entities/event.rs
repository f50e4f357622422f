//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::event::{Event, EventStatus};

/// Database enum for event_status that maps to the PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatusDb {
    Draft,
    Published,
    Closed,
    Cancelled,
}

impl From<EventStatusDb> for EventStatus {
    fn from(db: EventStatusDb) -> Self {
        match db {
            EventStatusDb::Draft => EventStatus::Draft,
            EventStatusDb::Published => EventStatus::Published,
            EventStatusDb::Closed => EventStatus::Closed,
            EventStatusDb::Cancelled => EventStatus::Cancelled,
        }
    }
}

impl From<EventStatus> for EventStatusDb {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Draft => EventStatusDb::Draft,
            EventStatus::Published => EventStatusDb::Published,
            EventStatus::Closed => EventStatusDb::Closed,
            EventStatus::Cancelled => EventStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: EventStatusDb,
    pub price: i64,
    pub currency: String,
    pub max_attendees: Option<i32>,
    pub waitlist_enabled: bool,
    pub registration_opens_at: Option<DateTime<Utc>>,
    pub registration_closes_at: Option<DateTime<Utc>>,
    pub starts_at: DateTime<Utc>,
    pub meeting_id: Option<String>,
    pub confirmed_count: i32,
    pub waitlisted_count: i32,
    pub attended_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(e: EventEntity) -> Self {
        Event {
            id: e.id,
            organization_id: e.organization_id,
            title: e.title,
            description: e.description,
            status: e.status.into(),
            price: e.price,
            currency: e.currency.trim_end().to_string(),
            max_attendees: e.max_attendees,
            waitlist_enabled: e.waitlist_enabled,
            registration_opens_at: e.registration_opens_at,
            registration_closes_at: e.registration_closes_at,
            starts_at: e.starts_at,
            meeting_id: e.meeting_id,
            confirmed_count: e.confirmed_count,
            waitlisted_count: e.waitlisted_count,
            attended_count: e.attended_count,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}
