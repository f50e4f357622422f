//! Registration route handlers: admission, retrieval, payment confirmation
//! and cancellation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::time::Duration;
use uuid::Uuid;

use domain::models::registration::{
    AdmissionRequest, AdmissionResponse, ConfirmPaymentResponse, ReconcileTrigger, Registration,
    ReconciliationOutcome,
};
use persistence::entities::{PaymentStatusDb, RegistrationStatusDb};
use persistence::repositories::{
    EventRepository, MeetingSyncRepository, RegistrationAuditRepository, RegistrationRepository,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{AdmissionService, PaymentReconciler};

/// POST /api/v1/events/:event_id/registrations
///
/// Admits a participant: a confirmed seat for free events, a pending
/// registration plus payment handle for paid ones, or a waitlist entry.
pub async fn admit(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<AdmissionRequest>,
) -> Result<(StatusCode, Json<AdmissionResponse>), ApiError> {
    let service = AdmissionService::new(state.pool.clone(), state.gateway.clone());
    let response = service.admit(event_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/registrations/:registration_id
pub async fn get_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<Registration>, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(registration_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".into()))?;
    Ok(Json(entity.into()))
}

/// POST /api/v1/registrations/:registration_id/confirm-payment
///
/// Synchronous reconciliation poll, for clients that just completed the
/// payment flow. Retries while the gateway still reports the intent as
/// processing, with a doubling delay, then gives up with a processing
/// outcome; the webhook settles it later.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<ConfirmPaymentResponse>, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(registration_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".into()))?;

    let intent_id = match &entity.payment_intent_id {
        Some(id) => id.clone(),
        None => {
            // Free or waitlisted registrations have nothing to confirm.
            return Err(ApiError::Conflict(
                "Registration has no payment to confirm".into(),
            ));
        }
    };

    let reconciler = PaymentReconciler::new(state.pool.clone(), state.gateway.clone());
    let cfg = &state.config.reconciliation;

    let mut outcome = ReconciliationOutcome::Processing;
    let mut delay = Duration::from_millis(cfg.poll_initial_delay_ms);
    for attempt in 0..cfg.max_poll_attempts {
        if attempt > 0 {
            tokio::time::sleep(delay).await;
            delay *= 2;
        }
        outcome = reconciler
            .reconcile(&intent_id, ReconcileTrigger::Poll)
            .await?;
        if outcome != ReconciliationOutcome::Processing {
            break;
        }
    }

    let entity = repo
        .find_by_id(registration_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".into()))?;

    Ok(Json(ConfirmPaymentResponse {
        outcome,
        registration: entity.into(),
    }))
}

/// DELETE /api/v1/registrations/:registration_id
///
/// Cancels a registration. Freeing a confirmed seat promotes the head of
/// the waitlist for free events; paid events leave the seat to the next
/// admission since a promoted attendee would still owe payment.
pub async fn cancel_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<Registration>, ApiError> {
    let mut tx = state.pool.begin().await?;

    let entity = RegistrationRepository::find_by_id_for_update(&mut tx, registration_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".into()))?;

    if entity.status == RegistrationStatusDb::Cancelled {
        // Idempotent; the first cancellation already did the work.
        return Ok(Json(entity.into()));
    }

    let event = EventRepository::lock_for_update(&mut tx, entity.event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;

    let was_confirmed = entity.status == RegistrationStatusDb::Confirmed;
    let cancelled = RegistrationRepository::cancel(&mut tx, registration_id).await?;

    RegistrationAuditRepository::record(
        &mut tx,
        entity.id,
        entity.status,
        cancelled.status,
        entity.payment_status,
        cancelled.payment_status,
        &ReconcileTrigger::Cancellation.to_string(),
    )
    .await?;

    // Promotion is restricted to free events: waitlisted rows carry no
    // payment intent, so a promoted seat must not require payment.
    if was_confirmed && event.waitlist_enabled && event.price == 0 {
        if let Some(next) =
            RegistrationRepository::next_waitlisted_for_update(&mut tx, entity.event_id).await?
        {
            let promoted = RegistrationRepository::promote(&mut tx, next.id).await?;

            RegistrationAuditRepository::record(
                &mut tx,
                next.id,
                next.status,
                promoted.status,
                next.payment_status,
                promoted.payment_status,
                &ReconcileTrigger::Promotion.to_string(),
            )
            .await?;

            if event.meeting_id.is_some() {
                MeetingSyncRepository::enqueue(&mut tx, next.id).await?;
            }

            tracing::info!(
                registration_id = %next.id,
                event_id = %entity.event_id,
                "Waitlisted registration promoted"
            );
        }
    }

    tx.commit().await?;

    let events = EventRepository::new(state.pool.clone());
    if let Err(err) = events.recompute_counters(entity.event_id).await {
        tracing::warn!(event_id = %entity.event_id, error = %err, "Counter refresh failed");
    }

    if entity.payment_status == PaymentStatusDb::Paid {
        tracing::info!(
            registration_id = %registration_id,
            "Paid registration cancelled; refund requires an operator"
        );
    }

    tracing::info!(registration_id = %registration_id, "Registration cancelled");
    Ok(Json(cancelled.into()))
}
