//! Payment gateway trait seam.
//!
//! The gateway is an opaque external collaborator: it creates, reports and
//! refunds payment intents. Implementations live in the api crate; the
//! reconciler and admission service depend only on this trait.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::reconciliation::IntentStatus;

/// Metadata attached to an intent so gateway records can be traced back to
/// a registration.
#[derive(Debug, Clone)]
pub struct IntentMetadata {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub email: String,
}

/// Result of creating an intent: the id plus the client-side secret the
/// caller needs to complete payment.
#[derive(Debug, Clone)]
pub struct CreatedIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// A point-in-time observation of an intent.
#[derive(Debug, Clone)]
pub struct IntentSnapshot {
    pub intent_id: String,
    pub status: IntentStatus,
    /// Amount actually captured, in minor units. Source of truth for money.
    pub captured_amount: i64,
    pub last_error: Option<String>,
}

/// A successful refund.
#[derive(Debug, Clone)]
pub struct RefundReceipt {
    pub refund_id: String,
    pub amount: i64,
}

/// Gateway failures. All variants are transient from the reconciler's point
/// of view; the caller retries or the webhook redelivers.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Request(String),
    #[error("Gateway returned an unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("Intent not found at gateway: {0}")]
    IntentNotFound(String),
}

/// External payment gateway. Idempotent on the gateway's side by intent id.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent for `amount` minor units.
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> Result<CreatedIntent, GatewayError>;

    /// Retrieves the current status of an intent.
    async fn retrieve_intent(&self, intent_id: &str) -> Result<IntentSnapshot, GatewayError>;

    /// Refunds `amount` minor units of a captured intent.
    async fn refund(&self, intent_id: &str, amount: i64) -> Result<RefundReceipt, GatewayError>;
}
