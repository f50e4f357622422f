//! Background job that repairs drift in the denormalized event counters.
//!
//! Counters are recomputed best-effort after every transition; this job is
//! the backstop that restores them from the registration rows.

use sqlx::PgPool;

use persistence::repositories::EventRepository;

use super::scheduler::{Job, JobFrequency};

/// Job that periodically recomputes per-event counters.
pub struct CounterRefreshJob {
    events: EventRepository,
    frequency_minutes: u64,
}

impl CounterRefreshJob {
    pub fn new(pool: PgPool, frequency_minutes: u64) -> Self {
        Self {
            events: EventRepository::new(pool),
            frequency_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for CounterRefreshJob {
    fn name(&self) -> &'static str {
        "counter_refresh"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.frequency_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let repaired = self
            .events
            .recompute_all_counters()
            .await
            .map_err(|e| format!("Counter refresh failed: {}", e))?;

        if repaired > 0 {
            tracing::warn!(repaired = repaired, "Event counters had drifted");
            metrics::counter!("event_counter_repairs_total").increment(repaired);
        }
        Ok(())
    }
}
