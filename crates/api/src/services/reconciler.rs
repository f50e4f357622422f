//! Payment reconciler: converges a registration with the gateway's record
//! of its payment intent.
//!
//! All triggers (synchronous poll, webhook delivery, operator retry) funnel
//! into [`PaymentReconciler::reconcile`], which is idempotent: a terminal
//! registration short-circuits to its prior outcome without touching the
//! gateway, so webhook redelivery is harmless.
//!
//! Lock order is registration row first, then event row. The event lock is
//! held across the capacity re-check and the state transition so a seat can
//! never be granted twice.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use domain::models::registration::{ReconcileTrigger, ReconciliationOutcome};
use domain::services::{
    disposition, seat_available, GatewayError, IntentDisposition, PaymentGateway,
};
use persistence::entities::{PaymentStatusDb, RegistrationEntity, RegistrationStatusDb};
use persistence::repositories::{
    EventRepository, MeetingSyncRepository, PromoCodeRepository, ReconciliationAlertRepository,
    RegistrationAuditRepository, RegistrationRepository,
};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("No registration for payment intent {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<ReconcileError> for crate::error::ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::NotFound(intent) => {
                crate::error::ApiError::NotFound(format!("No registration for intent {}", intent))
            }
            ReconcileError::Database(e) => e.into(),
            ReconcileError::Gateway(e) => e.into(),
        }
    }
}

/// Reconciles registrations against the payment gateway.
#[derive(Clone)]
pub struct PaymentReconciler {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentReconciler {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }

    /// Reconciles the registration owning `intent_id` with the gateway.
    pub async fn reconcile(
        &self,
        intent_id: &str,
        trigger: ReconcileTrigger,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        let outcome = self.reconcile_inner(intent_id, trigger).await?;
        crate::middleware::metrics::record_reconciliation(outcome, &trigger.to_string());
        Ok(outcome)
    }

    async fn reconcile_inner(
        &self,
        intent_id: &str,
        trigger: ReconcileTrigger,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        let registrations = RegistrationRepository::new(self.pool.clone());

        // Idempotency fast path: no lock, no gateway call.
        let entity = registrations
            .find_by_intent(intent_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(intent_id.to_string()))?;
        if let Some(outcome) = terminal_outcome(&entity) {
            return Ok(outcome);
        }

        let mut tx = self.pool.begin().await?;

        // Re-check under the row lock; a concurrent trigger may have won.
        let entity = RegistrationRepository::find_by_intent_for_update(&mut tx, intent_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(intent_id.to_string()))?;
        if let Some(outcome) = terminal_outcome(&entity) {
            return Ok(outcome);
        }

        let event = EventRepository::lock_for_update(&mut tx, entity.event_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(intent_id.to_string()))?;

        // Gateway is the source of truth for money. An error here drops the
        // transaction with no state change; the caller retries.
        let snapshot = self.gateway.retrieve_intent(intent_id).await?;

        match disposition(snapshot.status) {
            IntentDisposition::AwaitGateway => {
                tx.rollback().await?;
                Ok(ReconciliationOutcome::Processing)
            }
            IntentDisposition::MarkFailed => {
                let updated = RegistrationRepository::mark_failed(&mut tx, entity.id).await?;
                release_promo(&mut tx, &entity).await?;
                record_transition(&mut tx, &entity, &updated, trigger).await?;
                tx.commit().await?;

                tracing::info!(
                    registration_id = %entity.id,
                    intent_id = intent_id,
                    status = %snapshot.status,
                    trigger = %trigger,
                    "Payment failed"
                );
                Ok(ReconciliationOutcome::Failed)
            }
            IntentDisposition::CheckCapacity => {
                self.settle_succeeded(tx, entity, event.max_attendees, &event.meeting_id, &snapshot, trigger)
                    .await
            }
        }
    }

    /// Payment captured at the gateway: seat the registration if capacity
    /// still allows, refund otherwise.
    async fn settle_succeeded(
        &self,
        mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
        entity: RegistrationEntity,
        max_attendees: Option<i32>,
        meeting_id: &Option<String>,
        snapshot: &domain::services::IntentSnapshot,
        trigger: ReconcileTrigger,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        let needs_seat = entity.status == RegistrationStatusDb::Pending;
        let confirmed = RegistrationRepository::count_confirmed(&mut tx, entity.event_id).await?;
        let seat_ok = seat_available(confirmed, max_attendees);

        // A cancelled registration whose payment landed anyway is refunded
        // outright; a pending one is refunded only when the event filled up
        // while the payment was in flight.
        let refund_needed =
            entity.status == RegistrationStatusDb::Cancelled || (needs_seat && !seat_ok);

        if !refund_needed {
            let updated =
                RegistrationRepository::mark_paid(&mut tx, entity.id, snapshot.captured_amount)
                    .await?;

            let flipped = entity.status == RegistrationStatusDb::Pending
                && updated.status == RegistrationStatusDb::Confirmed;
            if flipped && meeting_id.is_some() {
                MeetingSyncRepository::enqueue(&mut tx, entity.id).await?;
            }

            record_transition(&mut tx, &entity, &updated, trigger).await?;
            tx.commit().await?;
            self.recompute_counters(entity.event_id).await;

            tracing::info!(
                registration_id = %entity.id,
                amount = snapshot.captured_amount,
                trigger = %trigger,
                "Payment reconciled as paid"
            );
            return Ok(ReconciliationOutcome::Paid);
        }

        match self
            .gateway
            .refund(&snapshot.intent_id, snapshot.captured_amount)
            .await
        {
            Ok(receipt) => {
                let updated =
                    RegistrationRepository::mark_refunded(&mut tx, entity.id, receipt.amount)
                        .await?;
                release_promo(&mut tx, &entity).await?;
                record_transition(&mut tx, &entity, &updated, trigger).await?;
                tx.commit().await?;

                let outcome = if entity.status == RegistrationStatusDb::Cancelled {
                    ReconciliationOutcome::Failed
                } else {
                    ReconciliationOutcome::EventFull
                };
                tracing::info!(
                    registration_id = %entity.id,
                    refund_id = %receipt.refund_id,
                    amount = receipt.amount,
                    outcome = ?outcome,
                    "Captured payment refunded"
                );
                Ok(outcome)
            }
            Err(err) => {
                // Money is captured, the seat cannot be granted, and the
                // refund failed. Roll everything back and hand the case to
                // an operator; the registration stays pending.
                drop(tx);

                tracing::error!(
                    registration_id = %entity.id,
                    intent_id = %snapshot.intent_id,
                    error = %err,
                    "Refund failed; raising reconciliation alert"
                );
                metrics::counter!("reconciliation_alerts_raised_total").increment(1);

                let alerts = ReconciliationAlertRepository::new(self.pool.clone());
                alerts
                    .create(
                        entity.id,
                        &snapshot.intent_id,
                        snapshot.captured_amount,
                        &format!("Refund failed: {}", err),
                    )
                    .await?;
                Ok(ReconciliationOutcome::Error)
            }
        }
    }

    async fn recompute_counters(&self, event_id: uuid::Uuid) {
        let events = EventRepository::new(self.pool.clone());
        if let Err(err) = events.recompute_counters(event_id).await {
            tracing::warn!(event_id = %event_id, error = %err, "Counter refresh failed");
        }
    }
}

/// Prior outcome of a registration already in a terminal financial state.
fn terminal_outcome(entity: &RegistrationEntity) -> Option<ReconciliationOutcome> {
    match entity.payment_status {
        PaymentStatusDb::Paid => Some(ReconciliationOutcome::Paid),
        PaymentStatusDb::Failed => Some(ReconciliationOutcome::Failed),
        PaymentStatusDb::Refunded => {
            if entity.status == RegistrationStatusDb::Cancelled {
                Some(ReconciliationOutcome::Failed)
            } else {
                Some(ReconciliationOutcome::EventFull)
            }
        }
        PaymentStatusDb::NotRequired | PaymentStatusDb::Pending => None,
    }
}

async fn release_promo(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entity: &RegistrationEntity,
) -> Result<(), sqlx::Error> {
    if let Some(usage_id) = entity.promo_code_usage_id {
        PromoCodeRepository::release_usage(&mut *tx, usage_id).await?;
    }
    Ok(())
}

async fn record_transition(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    before: &RegistrationEntity,
    after: &RegistrationEntity,
    trigger: ReconcileTrigger,
) -> Result<(), sqlx::Error> {
    RegistrationAuditRepository::record(
        &mut *tx,
        before.id,
        before.status,
        after.status,
        before.payment_status,
        after.payment_status,
        &trigger.to_string(),
    )
    .await
}
