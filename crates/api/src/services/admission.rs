//! Admission service: the single write path for new registrations.
//!
//! Every admission runs inside one transaction holding the event row lock,
//! so the capacity decision, the duplicate check, the promo application and
//! the registration insert are one atomic step. The gateway intent is
//! created while the transaction is still open; if intent creation fails
//! the transaction rolls back and no registration exists.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use domain::models::event::Event;
use domain::models::promo_code::{PromoCode, PromoCodeError};
use domain::models::registration::{
    AdmissionRequest, AdmissionResponse, PaymentHandle, ReconcileTrigger, Registration,
};
use domain::services::{
    decide_slot, registration_open, validate_promo, AdmissionSlot, IntentMetadata, PaymentGateway,
    PromoContext,
};
use persistence::entities::{PaymentStatusDb, RegistrationStatusDb};
use persistence::repositories::{
    EventRepository, MeetingSyncRepository, PromoCodeRepository, RegistrationAuditRepository,
    RegistrationRepository,
};

use crate::error::ApiError;

/// Orchestrates admission of one participant to one event.
#[derive(Clone)]
pub struct AdmissionService {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
}

impl AdmissionService {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }

    /// Admits a participant: seat, waitlist entry or rejection.
    pub async fn admit(
        &self,
        event_id: Uuid,
        request: AdmissionRequest,
    ) -> Result<AdmissionResponse, ApiError> {
        request.validate()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // The event row lock serializes all capacity-affecting work.
        let event_entity = EventRepository::lock_for_update(&mut tx, event_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;
        let event: Event = event_entity.into();

        if !registration_open(&event, now) {
            return Err(ApiError::RegistrationClosed(
                "Event is not currently accepting registrations".into(),
            ));
        }

        if RegistrationRepository::find_active_by_event_email(&mut tx, event_id, &request.email)
            .await?
            .is_some()
        {
            return Err(ApiError::AlreadyRegistered);
        }

        let confirmed = RegistrationRepository::count_confirmed(&mut tx, event_id).await?;
        let max_position = RegistrationRepository::max_waitlist_position(&mut tx, event_id).await?;

        match decide_slot(&event, confirmed, max_position) {
            AdmissionSlot::Full => {
                crate::middleware::metrics::record_admission("rejected_full");
                Err(ApiError::EventFull)
            }
            AdmissionSlot::Waitlist { position } => {
                // Waitlisted registrations never carry a payment intent or a
                // promo usage; price is settled if a seat opens up.
                let entity = RegistrationRepository::create(
                    &mut tx,
                    event_id,
                    &request.email,
                    &request.first_name,
                    &request.last_name,
                    RegistrationStatusDb::Waitlisted,
                    PaymentStatusDb::NotRequired,
                    Some(position),
                    event.price,
                )
                .await?;

                RegistrationAuditRepository::record(
                    &mut tx,
                    entity.id,
                    entity.status,
                    entity.status,
                    entity.payment_status,
                    entity.payment_status,
                    &ReconcileTrigger::Admission.to_string(),
                )
                .await?;

                tx.commit().await?;
                self.recompute_counters(event_id).await;
                crate::middleware::metrics::record_admission("waitlisted");

                tracing::info!(
                    registration_id = %entity.id,
                    event_id = %event_id,
                    position = position,
                    "Registration waitlisted"
                );

                Ok(AdmissionResponse {
                    registration: entity.into(),
                    payment: None,
                })
            }
            AdmissionSlot::Seat => {
                let (total_amount, promo) = self
                    .resolve_price(&mut tx, &event, &request, now)
                    .await?;

                if total_amount == 0 {
                    self.admit_free(tx, &event, &request, promo).await
                } else {
                    self.admit_paid(tx, &event, &request, total_amount, promo)
                        .await
                }
            }
        }
    }

    /// Computes the amount owed, applying the promo code when one was given.
    /// Promo codes only apply to seated registrations with a nonzero price.
    async fn resolve_price(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event: &Event,
        request: &AdmissionRequest,
        now: chrono::DateTime<Utc>,
    ) -> Result<(i64, Option<AppliedPromo>), ApiError> {
        let code_str = match &request.promo_code {
            Some(code) if !event.is_free() => code,
            _ => return Ok((event.price, None)),
        };

        let entity = PromoCodeRepository::find_by_code_for_update(
            &mut *tx,
            event.organization_id,
            code_str,
        )
        .await?
        .ok_or(PromoCodeError::NotFound)?;
        let code: PromoCode = entity.into();

        let uses_by_email =
            PromoCodeRepository::count_uses_by_email(&mut *tx, code.id, &request.email).await?;
        let has_prior_registration = if code.first_time_only {
            PromoCodeRepository::email_has_prior_registration(
                &mut *tx,
                event.organization_id,
                &request.email,
            )
            .await?
        } else {
            false
        };

        let discount = validate_promo(
            &code,
            &PromoContext {
                event_id: event.id,
                price: event.price,
                uses_by_email,
                has_prior_registration,
                now,
            },
        )?;

        Ok((
            discount.final_price,
            Some(AppliedPromo {
                promo_code_id: code.id,
                discount_amount: discount.amount,
            }),
        ))
    }

    /// Free (or fully discounted) seat: confirmed immediately, no gateway
    /// involvement.
    async fn admit_free(
        &self,
        mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
        event: &Event,
        request: &AdmissionRequest,
        promo: Option<AppliedPromo>,
    ) -> Result<AdmissionResponse, ApiError> {
        let entity = RegistrationRepository::create(
            &mut tx,
            event.id,
            &request.email,
            &request.first_name,
            &request.last_name,
            RegistrationStatusDb::Confirmed,
            PaymentStatusDb::NotRequired,
            None,
            0,
        )
        .await?;

        let registration = self
            .apply_promo_usage(&mut tx, entity.id, &request.email, promo)
            .await?;

        if event.meeting_id.is_some() {
            MeetingSyncRepository::enqueue(&mut tx, entity.id).await?;
        }

        RegistrationAuditRepository::record(
            &mut tx,
            entity.id,
            entity.status,
            entity.status,
            entity.payment_status,
            entity.payment_status,
            &ReconcileTrigger::Admission.to_string(),
        )
        .await?;

        tx.commit().await?;
        self.recompute_counters(event.id).await;
        crate::middleware::metrics::record_admission("seated_free");

        tracing::info!(
            registration_id = %entity.id,
            event_id = %event.id,
            "Registration confirmed without payment"
        );

        Ok(AdmissionResponse {
            registration,
            payment: None,
        })
    }

    /// Paid seat: pending registration plus a gateway intent, created while
    /// the transaction is open so a gateway failure leaves nothing behind.
    async fn admit_paid(
        &self,
        mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
        event: &Event,
        request: &AdmissionRequest,
        total_amount: i64,
        promo: Option<AppliedPromo>,
    ) -> Result<AdmissionResponse, ApiError> {
        let entity = RegistrationRepository::create(
            &mut tx,
            event.id,
            &request.email,
            &request.first_name,
            &request.last_name,
            RegistrationStatusDb::Pending,
            PaymentStatusDb::Pending,
            None,
            total_amount,
        )
        .await?;

        let mut registration = self
            .apply_promo_usage(&mut tx, entity.id, &request.email, promo)
            .await?;

        let created = match self
            .gateway
            .create_intent(
                total_amount,
                &event.currency,
                &IntentMetadata {
                    registration_id: entity.id,
                    event_id: event.id,
                    email: request.email.clone(),
                },
            )
            .await
        {
            Ok(created) => created,
            Err(err) => {
                tracing::error!(
                    event_id = %event.id,
                    error = %err,
                    "Intent creation failed; rolling back admission"
                );
                tx.rollback().await?;
                return Err(ApiError::PaymentSystemUnavailable);
            }
        };

        RegistrationRepository::set_payment_intent(&mut tx, entity.id, &created.intent_id).await?;
        registration.payment_intent_id = Some(created.intent_id.clone());

        RegistrationAuditRepository::record(
            &mut tx,
            entity.id,
            entity.status,
            entity.status,
            entity.payment_status,
            entity.payment_status,
            &ReconcileTrigger::Admission.to_string(),
        )
        .await?;

        tx.commit().await?;
        crate::middleware::metrics::record_admission("seated_pending_payment");

        tracing::info!(
            registration_id = %entity.id,
            event_id = %event.id,
            amount = total_amount,
            "Registration pending payment"
        );

        Ok(AdmissionResponse {
            registration,
            payment: Some(PaymentHandle {
                payment_intent_id: created.intent_id,
                client_secret: created.client_secret,
            }),
        })
    }

    /// Records the promo usage against the new registration and returns the
    /// registration with the usage attached.
    async fn apply_promo_usage(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        registration_id: Uuid,
        email: &str,
        promo: Option<AppliedPromo>,
    ) -> Result<Registration, ApiError> {
        let mut usage_id = None;
        if let Some(promo) = promo {
            let usage = PromoCodeRepository::apply_usage(
                &mut *tx,
                promo.promo_code_id,
                registration_id,
                email,
                promo.discount_amount,
            )
            .await?;
            RegistrationRepository::set_promo_usage(&mut *tx, registration_id, usage.id).await?;
            usage_id = Some(usage.id);
        }

        let entity = RegistrationRepository::find_by_id_for_update(&mut *tx, registration_id)
            .await?
            .ok_or_else(|| ApiError::Internal("Registration vanished mid-transaction".into()))?;
        let mut registration: Registration = entity.into();
        registration.promo_code_usage_id = usage_id;
        Ok(registration)
    }

    /// Counter refresh is display-only and must not fail the admission.
    async fn recompute_counters(&self, event_id: Uuid) {
        let events = EventRepository::new(self.pool.clone());
        if let Err(err) = events.recompute_counters(event_id).await {
            tracing::warn!(event_id = %event_id, error = %err, "Counter refresh failed");
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AppliedPromo {
    promo_code_id: Uuid,
    discount_amount: i64,
}
