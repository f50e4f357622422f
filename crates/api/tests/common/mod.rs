//! Common test utilities for integration tests.
//!
//! These tests run against a real PostgreSQL database named by the
//! `TEST_DATABASE_URL` environment variable. When the variable is not set
//! every test returns early, so the suite is safe to run without a database.
//!
//! Isolation comes from data, not truncation: each test creates its own
//! organization id and events, so tests can run in parallel against one
//! database.

// Allow dead code in this module - these are helper utilities that may not be
// used by every integration test binary.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Utc;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use domain::models::registration::{AdmissionRequest, AdmissionResponse};
use domain::services::{MeetingIntegration, PaymentGateway};
use eventra_api::app::create_app;
use eventra_api::config::Config;
use eventra_api::services::{AdmissionService, MockPaymentGateway, NoopMeetingClient};
use persistence::entities::{DiscountTypeDb, EventEntity, PromoCodeEntity};
use persistence::repositories::{EventRepository, PromoCodeRepository};

/// Connect to the test database, or None when `TEST_DATABASE_URL` is unset.
///
/// Migrations are applied on every call; they are idempotent.
pub async fn test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Test configuration with fast reconciliation polling.
pub fn test_config() -> Config {
    let url = std::env::var("TEST_DATABASE_URL").unwrap_or_default();
    Config::load_for_test(&[
        ("database.url", url.as_str()),
        ("reconciliation.max_poll_attempts", "3"),
        ("reconciliation.poll_initial_delay_ms", "10"),
    ])
    .expect("Failed to build test config")
}

/// Build the application router over a mock gateway and a disabled meeting
/// integration.
pub fn test_app(pool: PgPool, gateway: Arc<MockPaymentGateway>) -> Router {
    let gateway: Arc<dyn PaymentGateway> = gateway;
    let meeting: Arc<dyn MeetingIntegration> = Arc::new(NoopMeetingClient);
    create_app(test_config(), pool, gateway, meeting)
}

/// Generate a unique email for testing.
pub fn unique_email() -> String {
    format!("test_{}@example.com", Uuid::new_v4().simple())
}

/// Create a published event owned by a fresh organization.
pub async fn create_published_event(
    pool: &PgPool,
    price: i64,
    max_attendees: Option<i32>,
    waitlist_enabled: bool,
    meeting_id: Option<&str>,
) -> EventEntity {
    let repo = EventRepository::new(pool.clone());
    let event = repo
        .create(
            Uuid::new_v4(),
            "Integration Test Event",
            None,
            price,
            "USD",
            max_attendees,
            waitlist_enabled,
            None,
            None,
            Utc::now() + chrono::Duration::days(7),
            meeting_id,
        )
        .await
        .expect("Failed to create event");

    repo.publish(event.id)
        .await
        .expect("Failed to publish event")
        .expect("Event was not a draft")
}

/// Create an event that stays in draft status.
pub async fn create_draft_event(pool: &PgPool, price: i64) -> EventEntity {
    EventRepository::new(pool.clone())
        .create(
            Uuid::new_v4(),
            "Draft Event",
            None,
            price,
            "USD",
            None,
            false,
            None,
            None,
            Utc::now() + chrono::Duration::days(7),
            None,
        )
        .await
        .expect("Failed to create event")
}

/// Create a percentage promo code scoped to the event.
pub async fn create_percentage_promo(
    pool: &PgPool,
    event: &EventEntity,
    code: &str,
    percent: i64,
) -> PromoCodeEntity {
    PromoCodeRepository::new(pool.clone())
        .create(
            event.organization_id,
            code,
            DiscountTypeDb::Percentage,
            percent,
            None,
            None,
            None,
            None,
            None,
            None,
            false,
            Some(event.id),
        )
        .await
        .expect("Failed to create promo code")
}

/// Admit a participant to a paid event through the admission service,
/// returning the response and the gateway intent id.
pub async fn admit_paid(
    pool: &PgPool,
    gateway: Arc<MockPaymentGateway>,
    event_id: Uuid,
    email: &str,
    promo_code: Option<&str>,
) -> (AdmissionResponse, String) {
    let service = AdmissionService::new(pool.clone(), gateway);
    let response = service
        .admit(
            event_id,
            AdmissionRequest {
                email: email.to_string(),
                first_name: FirstName().fake::<String>(),
                last_name: LastName().fake::<String>(),
                promo_code: promo_code.map(String::from),
            },
        )
        .await
        .expect("Admission failed");

    let intent_id = response
        .payment
        .as_ref()
        .expect("Expected a payment handle")
        .payment_intent_id
        .clone();
    (response, intent_id)
}

/// Build a JSON request.
pub fn json_request(
    method: axum::http::Method,
    uri: &str,
    body: serde_json::Value,
) -> axum::http::Request<axum::body::Body> {
    use axum::{
        body::Body,
        http::{header, Request},
    };

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request.
pub fn get_request(uri: &str) -> axum::http::Request<axum::body::Body> {
    use axum::{
        body::Body,
        http::{Method, Request},
    };

    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a DELETE request.
pub fn delete_request(uri: &str) -> axum::http::Request<axum::body::Body> {
    use axum::{
        body::Body,
        http::{Method, Request},
    };

    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a webhook delivery with a signature computed under `secret` at the
/// current time.
pub fn signed_webhook_request(
    uri: &str,
    payload: &serde_json::Value,
    secret: &str,
) -> axum::http::Request<axum::body::Body> {
    use axum::{
        body::Body,
        http::{header, Method, Request},
    };

    let body = serde_json::to_string(payload).unwrap();
    let timestamp = Utc::now().timestamp();

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            eventra_api::routes::payment_webhooks::SIGNATURE_HEADER,
            format!("t={},v1={}", timestamp, signature),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Helper to parse a JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// Rows in the meeting sync outbox for a registration.
pub async fn meeting_sync_rows(pool: &PgPool, registration_id: Uuid) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM meeting_sync_queue WHERE registration_id = $1")
            .bind(registration_id)
            .fetch_one(pool)
            .await
            .expect("Outbox count query failed");
    count
}
