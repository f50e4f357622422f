//! Background jobs.

pub mod alert_monitor;
pub mod counter_refresh;
pub mod meeting_sync;
pub mod pool_metrics;
pub mod scheduler;

pub use alert_monitor::AlertMonitorJob;
pub use counter_refresh::CounterRefreshJob;
pub use meeting_sync::MeetingSyncJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
