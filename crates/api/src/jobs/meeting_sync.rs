//! Background job that drains the meeting sync outbox.
//!
//! Confirmed registrations for events with a meeting are enqueued exactly
//! once by the confirming transaction; this job delivers them to the
//! meeting provider with bounded, backed-off retries.

use std::sync::Arc;

use sqlx::PgPool;

use domain::services::{MeetingError, MeetingIntegration};
use persistence::entities::MeetingSyncEntity;
use persistence::repositories::{EventRepository, MeetingSyncRepository, RegistrationRepository};

use super::scheduler::{Job, JobFrequency};

/// Job that delivers queued registrants to the meeting provider.
pub struct MeetingSyncJob {
    pool: PgPool,
    meeting: Arc<dyn MeetingIntegration>,
    batch_size: i64,
    max_attempts: i32,
}

impl MeetingSyncJob {
    pub fn new(
        pool: PgPool,
        meeting: Arc<dyn MeetingIntegration>,
        batch_size: i64,
        max_attempts: i32,
    ) -> Self {
        Self {
            pool,
            meeting,
            batch_size,
            max_attempts,
        }
    }

    async fn deliver(&self, entry: &MeetingSyncEntity) -> Result<(), String> {
        let sync = MeetingSyncRepository::new(self.pool.clone());
        let registrations = RegistrationRepository::new(self.pool.clone());
        let events = EventRepository::new(self.pool.clone());

        let registration = registrations
            .find_by_id(entry.registration_id)
            .await
            .map_err(|e| e.to_string())?;
        let registration = match registration {
            Some(r) => r,
            None => {
                // Row purged after enqueue; nothing left to deliver.
                sync.mark_attempt_failed(
                    entry.id,
                    self.max_attempts,
                    self.max_attempts,
                    "Registration no longer exists",
                )
                .await
                .map_err(|e| e.to_string())?;
                return Ok(());
            }
        };

        let event = events
            .find_by_id(registration.event_id)
            .await
            .map_err(|e| e.to_string())?;
        let meeting_id = match event.and_then(|e| e.meeting_id) {
            Some(id) => id,
            None => {
                sync.mark_attempt_failed(
                    entry.id,
                    self.max_attempts,
                    self.max_attempts,
                    "Event has no meeting",
                )
                .await
                .map_err(|e| e.to_string())?;
                return Ok(());
            }
        };

        match self
            .meeting
            .add_registrant(
                &meeting_id,
                &registration.email,
                &registration.first_name,
                &registration.last_name,
            )
            .await
        {
            Ok(registrant) => {
                sync.mark_completed(entry.id, &registrant.registrant_id, &registrant.join_url)
                    .await
                    .map_err(|e| e.to_string())?;
                tracing::info!(
                    registration_id = %entry.registration_id,
                    registrant_id = %registrant.registrant_id,
                    "Meeting registrant added"
                );
                Ok(())
            }
            Err(err) => {
                // Disabled integration and missing meetings will not heal
                // with retries.
                let attempts = match err {
                    MeetingError::Disabled | MeetingError::MeetingNotFound(_) => self.max_attempts,
                    MeetingError::Request(_) => entry.attempts + 1,
                };
                sync.mark_attempt_failed(entry.id, attempts, self.max_attempts, &err.to_string())
                    .await
                    .map_err(|e| e.to_string())?;
                tracing::warn!(
                    registration_id = %entry.registration_id,
                    attempts = attempts,
                    error = %err,
                    "Meeting sync attempt failed"
                );
                Ok(())
            }
        }
    }
}

#[async_trait::async_trait]
impl Job for MeetingSyncJob {
    fn name(&self) -> &'static str {
        "meeting_sync"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(30)
    }

    async fn execute(&self) -> Result<(), String> {
        let sync = MeetingSyncRepository::new(self.pool.clone());
        let batch = sync
            .due_batch(self.batch_size)
            .await
            .map_err(|e| e.to_string())?;

        for entry in &batch {
            self.deliver(entry).await?;
        }

        if !batch.is_empty() {
            metrics::counter!("meeting_sync_processed_total").increment(batch.len() as u64);
        }
        Ok(())
    }
}
