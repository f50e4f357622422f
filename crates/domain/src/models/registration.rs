//! Registration domain models: statuses, admission requests and the
//! reconciliation outcome vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Attendance status of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Waitlisted,
    Cancelled,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Pending => write!(f, "pending"),
            RegistrationStatus::Confirmed => write!(f, "confirmed"),
            RegistrationStatus::Waitlisted => write!(f, "waitlisted"),
            RegistrationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Financial status of a registration. Once `Paid` or `Refunded` is reached
/// no further financial transition occurs except the explicit refund path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    NotRequired,
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::NotRequired => write!(f, "not_required"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

/// One attendee's claim on one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    /// Set iff status is waitlisted.
    pub waitlist_position: Option<i32>,
    /// Price owed after discounts, in minor units.
    pub total_amount: i64,
    /// Amount actually captured (or refunded) by the gateway.
    pub amount_paid: i64,
    pub payment_intent_id: Option<String>,
    pub promo_code_usage_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for admitting a participant to an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct AdmissionRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    /// Optional promo code to apply.
    pub promo_code: Option<String>,
}

/// Client-usable handle for completing a payment out of band.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PaymentHandle {
    pub payment_intent_id: String,
    pub client_secret: String,
}

/// Response to a successful admission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdmissionResponse {
    pub registration: Registration,
    /// Present only when the registration requires payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentHandle>,
}

/// Terminal answer of one reconciliation attempt, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    /// Payment captured and the seat is held.
    Paid,
    /// Gateway still processing; no state change, retry later.
    Processing,
    /// Payment failed or was abandoned.
    Failed,
    /// Payment succeeded but the event filled up; money was refunded.
    EventFull,
    /// Payment succeeded, capacity exceeded, refund failed. Requires an
    /// operator; the registration stays pending.
    Error,
}

/// Which path invoked the reconciler (or mutated a registration); recorded
/// in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileTrigger {
    Admission,
    Poll,
    Webhook,
    Cancellation,
    Promotion,
}

impl std::fmt::Display for ReconcileTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileTrigger::Admission => write!(f, "admission"),
            ReconcileTrigger::Poll => write!(f, "poll"),
            ReconcileTrigger::Webhook => write!(f, "webhook"),
            ReconcileTrigger::Cancellation => write!(f, "cancellation"),
            ReconcileTrigger::Promotion => write!(f, "promotion"),
        }
    }
}

/// Response for the synchronous confirm-payment poll.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfirmPaymentResponse {
    pub outcome: ReconciliationOutcome,
    pub registration: Registration,
}
