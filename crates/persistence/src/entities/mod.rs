//! Database entity definitions (row mappings).

pub mod event;
pub mod operations;
pub mod promo_code;
pub mod registration;

pub use event::{EventEntity, EventStatusDb};
pub use operations::{MeetingSyncEntity, ReconciliationAlertEntity, SyncStatusDb};
pub use promo_code::{DiscountTypeDb, PromoCodeEntity, PromoCodeUsageEntity};
pub use registration::{PaymentStatusDb, RegistrationEntity, RegistrationStatusDb};
