//! Operator endpoints for the reconciliation alert queue.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use persistence::entities::ReconciliationAlertEntity;
use persistence::repositories::ReconciliationAlertRepository;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AlertResponse {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub payment_intent_id: String,
    pub amount: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<ReconciliationAlertEntity> for AlertResponse {
    fn from(e: ReconciliationAlertEntity) -> Self {
        AlertResponse {
            id: e.id,
            registration_id: e.registration_id,
            payment_intent_id: e.payment_intent_id,
            amount: e.amount,
            reason: e.reason,
            created_at: e.created_at,
            resolved_at: e.resolved_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListAlertsResponse {
    pub alerts: Vec<AlertResponse>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub resolved: bool,
}

/// GET /api/v1/admin/reconciliation-alerts
///
/// Unresolved alerts, oldest first.
pub async fn list_alerts(
    State(state): State<AppState>,
) -> Result<Json<ListAlertsResponse>, ApiError> {
    let repo = ReconciliationAlertRepository::new(state.pool.clone());
    let alerts = repo.list_open().await?;
    Ok(Json(ListAlertsResponse {
        alerts: alerts.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/v1/admin/reconciliation-alerts/:alert_id/resolve
///
/// Marks an alert handled after the operator settled the refund out of
/// band.
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let repo = ReconciliationAlertRepository::new(state.pool.clone());
    let resolved = repo.resolve(alert_id).await?;
    if !resolved {
        return Err(ApiError::NotFound(
            "Alert not found or already resolved".into(),
        ));
    }
    tracing::info!(alert_id = %alert_id, "Reconciliation alert resolved");
    Ok(Json(ResolveResponse { resolved }))
}
