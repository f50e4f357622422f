//! Promo code route handlers.
//!
//! Codes are managed under the event they were created for; an unscoped
//! code applies to any event in the same organization.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::promo_code::{generate_promo_code, CreatePromoCodeRequest, PromoCode};
use persistence::repositories::{EventRepository, PromoCodeRepository};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListPromoCodesResponse {
    pub promo_codes: Vec<PromoCode>,
}

/// POST /api/v1/events/:event_id/promo-codes
///
/// Creates a promo code in the event's organization. The code itself is
/// auto-generated when omitted.
pub async fn create_promo_code(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<CreatePromoCodeRequest>,
) -> Result<(StatusCode, Json<PromoCode>), ApiError> {
    request.validate()?;

    if let (Some(from), Some(until)) = (request.valid_from, request.valid_until) {
        if until <= from {
            return Err(ApiError::Validation(
                "valid_until must be after valid_from".into(),
            ));
        }
    }

    let events = EventRepository::new(state.pool.clone());
    let event = events
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;

    let code = match &request.code {
        Some(code) => code.to_uppercase(),
        None => generate_promo_code(),
    };

    let repo = PromoCodeRepository::new(state.pool.clone());
    let entity = repo
        .create(
            event.organization_id,
            &code,
            request.discount_type.into(),
            request.discount_value,
            request.max_discount,
            request.valid_from,
            request.valid_until,
            request.max_uses,
            request.per_user_limit,
            request.min_order_amount,
            request.first_time_only,
            request.event_scoped.then_some(event_id),
        )
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                ApiError::Conflict(format!("Promo code {} already exists", code))
            }
            _ => err.into(),
        })?;

    tracing::info!(promo_code_id = %entity.id, event_id = %event_id, "Promo code created");
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// GET /api/v1/events/:event_id/promo-codes
///
/// Lists codes applicable to the event: its own plus the organization-wide
/// ones.
pub async fn list_promo_codes(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ListPromoCodesResponse>, ApiError> {
    let events = EventRepository::new(state.pool.clone());
    if events.find_by_id(event_id).await?.is_none() {
        return Err(ApiError::NotFound("Event not found".into()));
    }

    let repo = PromoCodeRepository::new(state.pool.clone());
    let entities = repo.list_for_event(event_id).await?;

    Ok(Json(ListPromoCodesResponse {
        promo_codes: entities.into_iter().map(Into::into).collect(),
    }))
}
