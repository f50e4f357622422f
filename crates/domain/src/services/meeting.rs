//! Meeting integration trait seam.
//!
//! Used only to add a confirmed attendee to the external meeting. Failures
//! are retried by a bounded background job, never by the reconciler.

use async_trait::async_trait;
use thiserror::Error;

/// A registrant added to an external meeting.
#[derive(Debug, Clone)]
pub struct MeetingRegistrant {
    pub registrant_id: String,
    pub join_url: String,
}

#[derive(Debug, Error)]
pub enum MeetingError {
    #[error("Meeting request failed: {0}")]
    Request(String),
    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),
    #[error("Meeting integration is disabled")]
    Disabled,
}

/// External meeting provider.
#[async_trait]
pub trait MeetingIntegration: Send + Sync {
    /// Adds a registrant to the meeting; logically at-most-once per
    /// confirmed registration, enforced by the caller's outbox.
    async fn add_registrant(
        &self,
        meeting_id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<MeetingRegistrant, MeetingError>;
}
