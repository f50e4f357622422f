//! Reconciliation disposition logic.
//!
//! The gateway's intent status is a closed enum with exhaustive matching so
//! the terminal-state set is checkable at compile time; the reconciler never
//! branches on raw status strings.

use serde::Deserialize;

/// Observed state of an external payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Processing,
    Succeeded,
    RequiresAction,
    Failed,
    Canceled,
}

impl IntentStatus {
    /// Parses a gateway status string. Unknown statuses are rejected rather
    /// than guessed at.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(IntentStatus::Processing),
            "succeeded" => Some(IntentStatus::Succeeded),
            "requires_action" => Some(IntentStatus::RequiresAction),
            "failed" => Some(IntentStatus::Failed),
            "canceled" => Some(IntentStatus::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentStatus::Processing => write!(f, "processing"),
            IntentStatus::Succeeded => write!(f, "succeeded"),
            IntentStatus::RequiresAction => write!(f, "requires_action"),
            IntentStatus::Failed => write!(f, "failed"),
            IntentStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// What the reconciler must do with an intent in a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentDisposition {
    /// No state change; the caller retries or the webhook redelivers.
    AwaitGateway,
    /// Terminal failure: mark failed, release the promo usage.
    MarkFailed,
    /// Payment captured: proceed to the capacity re-check.
    CheckCapacity,
}

/// Maps an intent status to the reconciler's next step.
pub fn disposition(status: IntentStatus) -> IntentDisposition {
    match status {
        IntentStatus::Processing => IntentDisposition::AwaitGateway,
        IntentStatus::Succeeded => IntentDisposition::CheckCapacity,
        IntentStatus::RequiresAction | IntentStatus::Failed | IntentStatus::Canceled => {
            IntentDisposition::MarkFailed
        }
    }
}

/// Capacity re-check under a succeeded payment: can this registration still
/// be seated? `confirmed_count` must be read under the event row lock.
pub fn seat_available(confirmed_count: i64, max_attendees: Option<i32>) -> bool {
    match max_attendees {
        Some(max) => confirmed_count < i64::from(max),
        None => true,
    }
}
