//! Integration tests for registration retrieval, the synchronous
//! confirm-payment poll and cancellation with waitlist promotion.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{
    create_published_event, delete_request, get_request, json_request, meeting_sync_rows,
    parse_response_body, test_app, test_pool, unique_email,
};
use domain::services::IntentStatus;
use eventra_api::services::MockPaymentGateway;

async fn admit_over_http(
    app: &axum::Router,
    event_id: Uuid,
    email: &str,
) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/registrations", event_id),
            json!({"email": email, "first_name": "Ada", "last_name": "Lovelace"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_response_body(response).await
}

#[tokio::test]
async fn test_get_registration() {
    let Some(pool) = test_pool().await else { return };
    let event = create_published_event(&pool, 0, None, false, None).await;
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let body = admit_over_http(&app, event.id, &unique_email()).await;
    let id = body["registration"]["id"].as_str().unwrap();

    let response = app
        .oneshot(get_request(&format!("/api/v1/registrations/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = parse_response_body(response).await;
    assert_eq!(fetched["id"].as_str().unwrap(), id);
    assert_eq!(fetched["status"], "confirmed");
}

#[tokio::test]
async fn test_confirm_payment_settles_to_paid() {
    let Some(pool) = test_pool().await else { return };
    let event = create_published_event(&pool, 4999, Some(10), false, None).await;
    let gateway = Arc::new(MockPaymentGateway::new());
    let app = test_app(pool.clone(), gateway.clone());

    let body = admit_over_http(&app, event.id, &unique_email()).await;
    let id = body["registration"]["id"].as_str().unwrap().to_string();
    let intent_id = body["payment"]["payment_intent_id"].as_str().unwrap();
    gateway.set_status(intent_id, IntentStatus::Succeeded, 4999);

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/registrations/{}/confirm-payment", id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["outcome"], "paid");
    assert_eq!(body["registration"]["status"], "confirmed");
    assert_eq!(body["registration"]["payment_status"], "paid");
    assert_eq!(body["registration"]["amount_paid"], 4999);
}

#[tokio::test]
async fn test_confirm_payment_gives_up_while_processing() {
    let Some(pool) = test_pool().await else { return };
    let event = create_published_event(&pool, 4999, Some(10), false, None).await;
    let gateway = Arc::new(MockPaymentGateway::new());
    let app = test_app(pool.clone(), gateway.clone());

    let body = admit_over_http(&app, event.id, &unique_email()).await;
    let id = body["registration"]["id"].as_str().unwrap().to_string();

    // The intent stays processing; the poll exhausts its attempts.
    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/registrations/{}/confirm-payment", id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["outcome"], "processing");
    assert_eq!(body["registration"]["status"], "pending");
}

#[tokio::test]
async fn test_confirm_payment_without_intent_conflicts() {
    let Some(pool) = test_pool().await else { return };
    let event = create_published_event(&pool, 0, None, false, None).await;
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let body = admit_over_http(&app, event.id, &unique_email()).await;
    let id = body["registration"]["id"].as_str().unwrap();

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/registrations/{}/confirm-payment", id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_promotes_waitlist_on_free_event() {
    let Some(pool) = test_pool().await else { return };
    let event =
        create_published_event(&pool, 0, Some(1), true, Some("meeting-77")).await;
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let seated = admit_over_http(&app, event.id, &unique_email()).await;
    let waitlisted = admit_over_http(&app, event.id, &unique_email()).await;
    assert_eq!(waitlisted["registration"]["status"], "waitlisted");
    let seated_id = seated["registration"]["id"].as_str().unwrap();
    let waitlisted_id = waitlisted["registration"]["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(delete_request(&format!(
            "/api/v1/registrations/{}",
            seated_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "cancelled");

    // The head of the waitlist takes the seat and gets the meeting side
    // effect queued.
    let response = app
        .oneshot(get_request(&format!(
            "/api/v1/registrations/{}",
            waitlisted_id
        )))
        .await
        .unwrap();
    let promoted = parse_response_body(response).await;
    assert_eq!(promoted["status"], "confirmed");
    assert!(promoted["waitlist_position"].is_null());
    assert_eq!(
        meeting_sync_rows(&pool, Uuid::parse_str(waitlisted_id).unwrap()).await,
        1
    );
}

#[tokio::test]
async fn test_cancel_paid_event_does_not_promote() {
    let Some(pool) = test_pool().await else { return };
    let event = create_published_event(&pool, 2500, Some(1), true, None).await;
    let gateway = Arc::new(MockPaymentGateway::new());
    let app = test_app(pool.clone(), gateway.clone());

    let seated = admit_over_http(&app, event.id, &unique_email()).await;
    let seated_id = seated["registration"]["id"].as_str().unwrap().to_string();
    let intent_id = seated["payment"]["payment_intent_id"].as_str().unwrap();
    gateway.set_status(intent_id, IntentStatus::Succeeded, 2500);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/registrations/{}/confirm-payment", seated_id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let waitlisted = admit_over_http(&app, event.id, &unique_email()).await;
    assert_eq!(waitlisted["registration"]["status"], "waitlisted");
    let waitlisted_id = waitlisted["registration"]["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(delete_request(&format!(
            "/api/v1/registrations/{}",
            seated_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A promoted attendee would owe payment, so the seat goes to the next
    // admission instead.
    let response = app
        .oneshot(get_request(&format!(
            "/api/v1/registrations/{}",
            waitlisted_id
        )))
        .await
        .unwrap();
    let still_waitlisted = parse_response_body(response).await;
    assert_eq!(still_waitlisted["status"], "waitlisted");
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let Some(pool) = test_pool().await else { return };
    let event = create_published_event(&pool, 0, None, false, None).await;
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let body = admit_over_http(&app, event.id, &unique_email()).await;
    let id = body["registration"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/registrations/{}", id);

    for _ in 0..2 {
        let response = app.clone().oneshot(delete_request(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_response_body(response).await;
        assert_eq!(body["status"], "cancelled");
    }
}

#[tokio::test]
async fn test_cancel_unknown_registration_not_found() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let response = app
        .oneshot(delete_request(&format!(
            "/api/v1/registrations/{}",
            Uuid::new_v4()
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
