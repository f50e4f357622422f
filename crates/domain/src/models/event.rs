//! Event domain models and request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_amount, validate_currency};

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Published,
    Closed,
    Cancelled,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "draft"),
            EventStatus::Published => write!(f, "published"),
            EventStatus::Closed => write!(f, "closed"),
            EventStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An event as seen by the admission core: capacity, pricing and the
/// registration window. Counter fields are a derived projection, never the
/// source of truth for capacity decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: EventStatus,
    /// Price in currency minor units; 0 = free event.
    pub price: i64,
    pub currency: String,
    /// None = unbounded capacity.
    pub max_attendees: Option<i32>,
    pub waitlist_enabled: bool,
    pub registration_opens_at: Option<DateTime<Utc>>,
    pub registration_closes_at: Option<DateTime<Utc>>,
    pub starts_at: DateTime<Utc>,
    /// External meeting id for the video integration, if any.
    pub meeting_id: Option<String>,
    pub confirmed_count: i32,
    pub waitlisted_count: i32,
    pub attended_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event is free of charge.
    pub fn is_free(&self) -> bool {
        self.price == 0
    }
}

/// Request to create a new event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateEventRequest {
    pub organization_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    /// Price in minor units (default: 0 = free).
    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    pub price: i64,

    #[serde(default = "default_currency")]
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,

    #[validate(range(min = 1, message = "max_attendees must be at least 1"))]
    pub max_attendees: Option<i32>,

    #[serde(default)]
    pub waitlist_enabled: bool,

    pub registration_opens_at: Option<DateTime<Utc>>,
    pub registration_closes_at: Option<DateTime<Utc>>,
    pub starts_at: DateTime<Utc>,
    pub meeting_id: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Query parameters for listing events.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEventsQuery {
    pub organization_id: Option<Uuid>,
    #[serde(flatten)]
    pub page: shared::pagination::PageParams,
}

/// Paginated event listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListEventsResponse {
    pub events: Vec<Event>,
    pub meta: shared::pagination::PageMeta,
}
