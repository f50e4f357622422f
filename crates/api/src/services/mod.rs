//! Application services: admission, payment reconciliation and the HTTP
//! clients for the external payment gateway and meeting provider.

pub mod admission;
pub mod meeting;
pub mod payment_gateway;
pub mod reconciler;

pub use admission::AdmissionService;
pub use meeting::{HttpMeetingClient, NoopMeetingClient};
pub use payment_gateway::{verify_signature, HttpPaymentGateway, MockPaymentGateway};
pub use reconciler::{PaymentReconciler, ReconcileError};
