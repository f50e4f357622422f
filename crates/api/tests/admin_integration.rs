//! Integration tests for the operator reconciliation-alert endpoints.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{
    admit_paid, create_published_event, get_request, json_request, parse_response_body, test_app,
    test_pool, unique_email,
};
use eventra_api::services::MockPaymentGateway;
use persistence::repositories::ReconciliationAlertRepository;

#[tokio::test]
async fn test_list_and_resolve_alert() {
    let Some(pool) = test_pool().await else { return };
    let gateway = Arc::new(MockPaymentGateway::new());
    let event = create_published_event(&pool, 2500, Some(10), false, None).await;
    let (response, intent_id) =
        admit_paid(&pool, gateway.clone(), event.id, &unique_email(), None).await;

    let alert = ReconciliationAlertRepository::new(pool.clone())
        .create(
            response.registration.id,
            &intent_id,
            2500,
            "Refund failed: simulated outage",
        )
        .await
        .unwrap();

    let app = test_app(pool.clone(), gateway);

    let list = app
        .clone()
        .oneshot(get_request("/api/v1/admin/reconciliation-alerts"))
        .await
        .unwrap();
    assert_eq!(list.status(), StatusCode::OK);
    let body = parse_response_body(list).await;
    let alerts = body["alerts"].as_array().unwrap();
    let found = alerts
        .iter()
        .find(|a| a["id"].as_str() == Some(alert.id.to_string().as_str()))
        .expect("Alert missing from listing");
    assert_eq!(found["amount"], 2500);
    assert_eq!(found["payment_intent_id"].as_str().unwrap(), intent_id);

    let resolve = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/admin/reconciliation-alerts/{}/resolve", alert.id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resolve.status(), StatusCode::OK);

    // Resolved alerts drop out of the listing; resolving twice is an error.
    let list = app
        .clone()
        .oneshot(get_request("/api/v1/admin/reconciliation-alerts"))
        .await
        .unwrap();
    let body = parse_response_body(list).await;
    assert!(body["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .all(|a| a["id"].as_str() != Some(alert.id.to_string().as_str())));

    let resolve_again = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/admin/reconciliation-alerts/{}/resolve", alert.id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resolve_again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resolve_unknown_alert_not_found() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/admin/reconciliation-alerts/{}/resolve", Uuid::new_v4()),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
