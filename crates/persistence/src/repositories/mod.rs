//! Repository implementations.
//!
//! Plain reads go through the pool. Anything that participates in the
//! admission or reconciliation transactions takes a `&mut PgConnection`
//! so the caller controls the transaction and the lock scope.

pub mod event;
pub mod operations;
pub mod promo_code;
pub mod registration;
pub mod registration_audit;

pub use event::EventRepository;
pub use operations::{MeetingSyncRepository, ReconciliationAlertRepository};
pub use promo_code::PromoCodeRepository;
pub use registration::RegistrationRepository;
pub use registration_audit::RegistrationAuditRepository;
