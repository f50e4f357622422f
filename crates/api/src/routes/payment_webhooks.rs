//! Payment gateway webhook handler.
//!
//! The webhook is a delivery hint, not a source of truth: the handler
//! verifies the signature, extracts the intent id and runs the same
//! reconciler as every other trigger. Redelivered events hit the
//! reconciler's idempotency fast path and change nothing.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use domain::models::registration::{ReconcileTrigger, ReconciliationOutcome};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{verify_signature, PaymentReconciler, ReconcileError};

/// Signature header set by the gateway.
pub const SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Webhook event payload. Only the intent id matters; the reconciler asks
/// the gateway for the authoritative status.
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(default)]
    #[allow(dead_code)]
    r#type: Option<String>,
    payment_intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ReconciliationOutcome>,
}

/// POST /api/v1/webhooks/payment
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<WebhookAck>), ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Validation("Missing webhook signature".into()))?;

    let cfg = &state.config;
    if !verify_signature(
        &body,
        signature,
        &cfg.gateway.webhook_secret,
        cfg.reconciliation.webhook_tolerance_secs,
        Utc::now().timestamp(),
    ) {
        metrics::counter!("webhook_signature_failures_total").increment(1);
        return Err(ApiError::Validation("Invalid webhook signature".into()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Malformed webhook payload: {}", e)))?;

    let reconciler = PaymentReconciler::new(state.pool.clone(), state.gateway.clone());
    match reconciler
        .reconcile(&event.payment_intent_id, ReconcileTrigger::Webhook)
        .await
    {
        Ok(outcome) => {
            tracing::info!(
                intent_id = %event.payment_intent_id,
                outcome = ?outcome,
                "Webhook reconciled"
            );
            Ok((
                StatusCode::OK,
                Json(WebhookAck {
                    received: true,
                    outcome: Some(outcome),
                }),
            ))
        }
        // The gateway may notify about intents we never created (or that
        // were purged). Acknowledge so it stops redelivering.
        Err(ReconcileError::NotFound(intent)) => {
            tracing::warn!(intent_id = %intent, "Webhook for unknown intent ignored");
            Ok((
                StatusCode::OK,
                Json(WebhookAck {
                    received: true,
                    outcome: None,
                }),
            ))
        }
        // Infrastructure errors return 5xx so the gateway redelivers.
        Err(err) => Err(err.into()),
    }
}
