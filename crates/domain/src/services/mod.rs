//! Pure domain services and collaborator trait seams.

pub mod admission_policy;
pub mod gateway;
pub mod meeting;
pub mod promo_validation;
pub mod reconciliation;

pub use admission_policy::{decide_slot, registration_open, AdmissionSlot};
pub use gateway::{
    CreatedIntent, GatewayError, IntentMetadata, IntentSnapshot, PaymentGateway, RefundReceipt,
};
pub use meeting::{MeetingError, MeetingIntegration, MeetingRegistrant};
pub use promo_validation::{validate_promo, Discount, PromoContext};
pub use reconciliation::{disposition, seat_available, IntentDisposition, IntentStatus};
