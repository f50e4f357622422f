//! HTTP payment gateway client and webhook signature verification.
//!
//! The gateway API is Stripe-shaped: form-encoded intent creation, JSON
//! responses, bearer authentication with the secret key. Webhook payloads
//! are authenticated with a timestamped HMAC signature header.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;

use domain::services::{
    CreatedIntent, GatewayError, IntentMetadata, IntentSnapshot, IntentStatus, PaymentGateway,
    RefundReceipt,
};

use crate::config::GatewayConfig;

type HmacSha256 = Hmac<Sha256>;

/// Payment gateway client over HTTP.
pub struct HttpPaymentGateway {
    client: Client,
    config: GatewayConfig,
}

/// Gateway intent response body.
#[derive(Debug, Deserialize)]
struct IntentBody {
    id: String,
    status: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    amount_received: i64,
    #[serde(default)]
    last_payment_error: Option<PaymentErrorBody>,
}

#[derive(Debug, Deserialize)]
struct PaymentErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Gateway refund response body.
#[derive(Debug, Deserialize)]
struct RefundBody {
    id: String,
    amount: i64,
}

impl HttpPaymentGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Request(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn snapshot_from_body(body: IntentBody) -> Result<IntentSnapshot, GatewayError> {
        let status = IntentStatus::parse(&body.status).ok_or_else(|| {
            GatewayError::UnexpectedResponse(format!("Unknown intent status: {}", body.status))
        })?;
        Ok(IntentSnapshot {
            intent_id: body.id,
            status,
            captured_amount: body.amount_received,
            last_error: body.last_payment_error.and_then(|e| e.message),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> Result<CreatedIntent, GatewayError> {
        let params = [
            ("amount", amount.to_string()),
            ("currency", currency.to_lowercase()),
            (
                "metadata[registration_id]",
                metadata.registration_id.to_string(),
            ),
            ("metadata[event_id]", metadata.event_id.to_string()),
            ("metadata[email]", metadata.email.clone()),
        ];

        let response = self
            .client
            .post(self.url("/v1/payment_intents"))
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UnexpectedResponse(format!(
                "Intent creation returned {}: {}",
                status, text
            )));
        }

        let body: IntentBody = response
            .json()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))?;

        let client_secret = body.client_secret.ok_or_else(|| {
            GatewayError::UnexpectedResponse("Intent response missing client_secret".to_string())
        })?;

        Ok(CreatedIntent {
            intent_id: body.id,
            client_secret,
        })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<IntentSnapshot, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/v1/payment_intents/{}", intent_id)))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::IntentNotFound(intent_id.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(GatewayError::UnexpectedResponse(format!(
                "Intent retrieval returned {}",
                status
            )));
        }

        let body: IntentBody = response
            .json()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))?;
        Self::snapshot_from_body(body)
    }

    async fn refund(&self, intent_id: &str, amount: i64) -> Result<RefundReceipt, GatewayError> {
        let params = [
            ("payment_intent", intent_id.to_string()),
            ("amount", amount.to_string()),
        ];

        let response = self
            .client
            .post(self.url("/v1/refunds"))
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UnexpectedResponse(format!(
                "Refund returned {}: {}",
                status, text
            )));
        }

        let body: RefundBody = response
            .json()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))?;

        Ok(RefundReceipt {
            refund_id: body.id,
            amount: body.amount,
        })
    }
}

/// Verifies a webhook signature header of the form `t=<unix>,v1=<hex>`,
/// where v1 is the HMAC-SHA256 of `"{t}.{payload}"` under the shared
/// webhook secret. The timestamp must be within `tolerance_secs` of `now`.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> bool {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<Vec<u8>> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signature = hex::decode(value).ok(),
            _ => {}
        }
    }

    let (timestamp, signature) = match (timestamp, signature) {
        (Some(t), Some(s)) => (t, s),
        _ => return false,
    };

    if (now - timestamp).abs() > tolerance_secs {
        return false;
    }

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Constant-time comparison via the Mac verify API.
    mac.verify_slice(&signature).is_ok()
}

/// In-memory gateway for tests. Intents are programmed with `set_status`;
/// every call is counted so tests can assert that redelivered webhooks do
/// not cause extra gateway traffic.
pub struct MockPaymentGateway {
    intents: std::sync::Mutex<std::collections::HashMap<String, IntentSnapshot>>,
    next_id: std::sync::atomic::AtomicUsize,
    pub create_calls: std::sync::atomic::AtomicUsize,
    pub retrieve_calls: std::sync::atomic::AtomicUsize,
    pub refund_calls: std::sync::atomic::AtomicUsize,
    fail_refunds: std::sync::atomic::AtomicBool,
    fail_creates: std::sync::atomic::AtomicBool,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            intents: std::sync::Mutex::new(std::collections::HashMap::new()),
            next_id: std::sync::atomic::AtomicUsize::new(1),
            create_calls: std::sync::atomic::AtomicUsize::new(0),
            retrieve_calls: std::sync::atomic::AtomicUsize::new(0),
            refund_calls: std::sync::atomic::AtomicUsize::new(0),
            fail_refunds: std::sync::atomic::AtomicBool::new(false),
            fail_creates: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Move an intent to a new status, as if the payer acted out of band.
    pub fn set_status(&self, intent_id: &str, status: IntentStatus, captured_amount: i64) {
        let mut intents = self.intents.lock().unwrap();
        intents.insert(
            intent_id.to_string(),
            IntentSnapshot {
                intent_id: intent_id.to_string(),
                status,
                captured_amount,
                last_error: None,
            },
        );
    }

    pub fn fail_refunds(&self, fail: bool) {
        self.fail_refunds
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn retrieve_count(&self) -> usize {
        self.retrieve_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn refund_count(&self) -> usize {
        self.refund_calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(
        &self,
        amount: i64,
        _currency: &str,
        _metadata: &IntentMetadata,
    ) -> Result<CreatedIntent, GatewayError> {
        self.create_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_creates.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(GatewayError::Request("simulated outage".to_string()));
        }
        let n = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let intent_id = format!("pi_mock_{}", n);
        let mut intents = self.intents.lock().unwrap();
        intents.insert(
            intent_id.clone(),
            IntentSnapshot {
                intent_id: intent_id.clone(),
                status: IntentStatus::Processing,
                captured_amount: amount,
                last_error: None,
            },
        );
        Ok(CreatedIntent {
            client_secret: format!("{}_secret", intent_id),
            intent_id,
        })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<IntentSnapshot, GatewayError> {
        self.retrieve_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let intents = self.intents.lock().unwrap();
        intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| GatewayError::IntentNotFound(intent_id.to_string()))
    }

    async fn refund(&self, intent_id: &str, amount: i64) -> Result<RefundReceipt, GatewayError> {
        self.refund_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_refunds.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(GatewayError::Request("simulated refund outage".to_string()));
        }
        let intents = self.intents.lock().unwrap();
        if !intents.contains_key(intent_id) {
            return Err(GatewayError::IntentNotFound(intent_id.to_string()));
        }
        Ok(RefundReceipt {
            refund_id: format!("re_mock_{}", intent_id),
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"payment_intent_id":"pi_123"}"#;
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert!(verify_signature(payload, &header, "whsec_test", 300, 1_700_000_000));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"{}";
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert!(!verify_signature(payload, &header, "whsec_other", 300, 1_700_000_000));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign(b"{\"a\":1}", "whsec_test", 1_700_000_000);
        assert!(!verify_signature(b"{\"a\":2}", &header, "whsec_test", 300, 1_700_000_000));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert!(!verify_signature(payload, &header, "whsec_test", 300, 1_700_000_301));
    }

    #[test]
    fn test_timestamp_within_tolerance_accepted() {
        let payload = b"{}";
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert!(verify_signature(payload, &header, "whsec_test", 300, 1_700_000_299));
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(!verify_signature(b"{}", "", "whsec_test", 300, 0));
        assert!(!verify_signature(b"{}", "t=abc,v1=zz", "whsec_test", 300, 0));
        assert!(!verify_signature(b"{}", "v1=00ff", "whsec_test", 300, 0));
    }

    #[tokio::test]
    async fn test_mock_gateway_counts_calls() {
        let gateway = MockPaymentGateway::new();
        let metadata = IntentMetadata {
            registration_id: uuid::Uuid::new_v4(),
            event_id: uuid::Uuid::new_v4(),
            email: "ada@example.com".to_string(),
        };
        let created = gateway.create_intent(4999, "USD", &metadata).await.unwrap();
        gateway.set_status(&created.intent_id, IntentStatus::Succeeded, 4999);

        let snapshot = gateway.retrieve_intent(&created.intent_id).await.unwrap();
        assert_eq!(snapshot.status, IntentStatus::Succeeded);
        assert_eq!(snapshot.captured_amount, 4999);
        assert_eq!(gateway.retrieve_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_gateway_refund_failure_mode() {
        let gateway = MockPaymentGateway::new();
        gateway.set_status("pi_x", IntentStatus::Succeeded, 100);
        gateway.fail_refunds(true);
        assert!(gateway.refund("pi_x", 100).await.is_err());
        gateway.fail_refunds(false);
        assert!(gateway.refund("pi_x", 100).await.is_ok());
    }
}
