//! Integration tests for event and promo code management endpoints.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{get_request, json_request, parse_response_body, test_app, test_pool};
use domain::models::registration::AdmissionRequest;
use eventra_api::services::{AdmissionService, MockPaymentGateway};
use persistence::repositories::EventRepository;

fn event_body(organization_id: Uuid, title: &str) -> serde_json::Value {
    json!({
        "organization_id": organization_id,
        "title": title,
        "price": 4999,
        "currency": "USD",
        "max_attendees": 30,
        "waitlist_enabled": true,
        "starts_at": Utc::now() + chrono::Duration::days(14)
    })
}

#[tokio::test]
async fn test_create_and_publish_event() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/events",
            event_body(Uuid::new_v4(), "Rust Workshop"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = parse_response_body(response).await;
    assert_eq!(created["status"], "draft");
    assert_eq!(created["price"], 4999);
    let event_id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/publish", event_id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let published = parse_response_body(response).await;
    assert_eq!(published["status"], "published");

    // Publishing is draft-only; a second publish conflicts.
    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/publish", event_id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_event_rejects_invalid_window() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let mut body = event_body(Uuid::new_v4(), "Backwards Window");
    body["registration_opens_at"] = json!(Utc::now() + chrono::Duration::days(5));
    body["registration_closes_at"] = json!(Utc::now() + chrono::Duration::days(1));

    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/events", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_event_rejects_empty_title() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/events",
            event_body(Uuid::new_v4(), ""),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_event_not_found() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let response = app
        .oneshot(get_request(&format!("/api/v1/events/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_events_paginates_by_organization() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));
    let organization_id = Uuid::new_v4();

    for i in 0..3 {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/events",
                event_body(organization_id, &format!("Event {}", i)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(get_request(&format!(
            "/api/v1/events?organization_id={}&page=1&per_page=2",
            organization_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["events"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["total_pages"], 2);
    assert_eq!(body["meta"]["per_page"], 2);
}

#[tokio::test]
async fn test_create_promo_code_and_duplicate_conflict() {
    let Some(pool) = test_pool().await else { return };
    let event = common::create_published_event(&pool, 4999, None, false, None).await;
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let body = json!({
        "code": "LAUNCH25",
        "discount_type": "percentage",
        "discount_value": 25,
        "max_uses": 100
    });
    let uri = format!("/api/v1/events/{}/promo-codes", event.id);

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, &uri, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = parse_response_body(response).await;
    assert_eq!(created["code"], "LAUNCH25");
    assert_eq!(created["event_id"].as_str().unwrap(), event.id.to_string());

    let response = app
        .oneshot(json_request(Method::POST, &uri, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_promo_code_generates_code_when_omitted() {
    let Some(pool) = test_pool().await else { return };
    let event = common::create_published_event(&pool, 4999, None, false, None).await;
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/promo-codes", event.id),
            json!({"discount_type": "fixed_amount", "discount_value": 500}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = parse_response_body(response).await;
    let code = created["code"].as_str().unwrap();
    assert_eq!(code.len(), 9);
    assert_eq!(&code[4..5], "-");
}

#[tokio::test]
async fn test_list_promo_codes_for_event() {
    let Some(pool) = test_pool().await else { return };
    let event = common::create_published_event(&pool, 4999, None, false, None).await;
    common::create_percentage_promo(&pool, &event, "LISTME", 10).await;
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    let response = app
        .oneshot(get_request(&format!(
            "/api/v1/events/{}/promo-codes",
            event.id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let codes = body["promo_codes"].as_array().unwrap();
    assert!(codes.iter().any(|c| c["code"] == "LISTME"));
}

#[tokio::test]
async fn test_counter_projection_recomputes_from_registrations() {
    let Some(pool) = test_pool().await else { return };
    let event = common::create_published_event(&pool, 0, Some(1), true, None).await;

    // One free seat plus one waitlisted registration.
    let service = AdmissionService::new(pool.clone(), Arc::new(MockPaymentGateway::new()));
    for _ in 0..2 {
        service
            .admit(
                event.id,
                AdmissionRequest {
                    email: common::unique_email(),
                    first_name: "Counter".to_string(),
                    last_name: "Check".to_string(),
                    promo_code: None,
                },
            )
            .await
            .unwrap();
    }

    let repo = EventRepository::new(pool.clone());
    repo.recompute_counters(event.id).await.unwrap();
    let row = repo.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(row.confirmed_count, 1);
    assert_eq!(row.waitlisted_count, 1);
    // Nothing writes attendance; the projection always lands on zero.
    assert_eq!(row.attended_count, 0);
}

#[tokio::test]
async fn test_health_endpoints() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool.clone(), Arc::new(MockPaymentGateway::new()));

    for uri in ["/health", "/health/live", "/health/ready"] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "endpoint {}", uri);
    }
}
