//! Event route handlers: creation, publishing, retrieval and listing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::event::{CreateEventRequest, Event, ListEventsQuery, ListEventsResponse};
use persistence::repositories::EventRepository;
use shared::pagination::PageMeta;

use crate::app::AppState;
use crate::error::ApiError;

/// POST /api/v1/events
///
/// Creates a new event in draft status.
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    request.validate()?;

    if let (Some(opens), Some(closes)) =
        (request.registration_opens_at, request.registration_closes_at)
    {
        if closes <= opens {
            return Err(ApiError::Validation(
                "registration_closes_at must be after registration_opens_at".into(),
            ));
        }
    }

    let repo = EventRepository::new(state.pool.clone());
    let entity = repo
        .create(
            request.organization_id,
            &request.title,
            request.description.as_deref(),
            request.price,
            &request.currency,
            request.max_attendees,
            request.waitlist_enabled,
            request.registration_opens_at,
            request.registration_closes_at,
            request.starts_at,
            request.meeting_id.as_deref(),
        )
        .await?;

    tracing::info!(event_id = %entity.id, title = %request.title, "Event created");
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// POST /api/v1/events/:event_id/publish
///
/// Publishes a draft event, opening it for registration.
pub async fn publish_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());

    match repo.publish(event_id).await? {
        Some(entity) => {
            tracing::info!(event_id = %event_id, "Event published");
            Ok(Json(entity.into()))
        }
        None => {
            // Distinguish "missing" from "not a draft" for the caller.
            if repo.find_by_id(event_id).await?.is_some() {
                Err(ApiError::Conflict("Only draft events can be published".into()))
            } else {
                Err(ApiError::NotFound("Event not found".into()))
            }
        }
    }
}

/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;
    Ok(Json(entity.into()))
}

/// GET /api/v1/events
///
/// Lists events, optionally scoped to an organization, newest first.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());

    let total = repo.count(query.organization_id).await?;
    let entities = repo
        .list(
            query.organization_id,
            query.page.per_page(),
            query.page.offset(),
        )
        .await?;

    Ok(Json(ListEventsResponse {
        events: entities.into_iter().map(Into::into).collect(),
        meta: PageMeta::new(&query.page, total),
    }))
}
