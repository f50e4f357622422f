//! Domain models for Eventra.

pub mod event;
pub mod promo_code;
pub mod registration;

pub use event::{Event, EventStatus};
pub use promo_code::{DiscountType, PromoCode, PromoCodeError};
pub use registration::{
    PaymentStatus, ReconcileTrigger, ReconciliationOutcome, Registration, RegistrationStatus,
};
