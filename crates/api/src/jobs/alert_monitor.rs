//! Background job that surfaces the open reconciliation alert count.
//!
//! Open alerts mean captured money is waiting on an operator; the gauge
//! drives the paging rule.

use sqlx::PgPool;

use persistence::repositories::ReconciliationAlertRepository;

use super::scheduler::{Job, JobFrequency};

/// Job that exports the open alert count and warns while it is nonzero.
pub struct AlertMonitorJob {
    alerts: ReconciliationAlertRepository,
}

impl AlertMonitorJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            alerts: ReconciliationAlertRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for AlertMonitorJob {
    fn name(&self) -> &'static str {
        "alert_monitor"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<(), String> {
        let open = self
            .alerts
            .count_open()
            .await
            .map_err(|e| format!("Alert count query failed: {}", e))?;

        metrics::gauge!("reconciliation_alerts_open").set(open as f64);
        if open > 0 {
            tracing::warn!(open = open, "Unresolved reconciliation alerts");
        }
        Ok(())
    }
}
