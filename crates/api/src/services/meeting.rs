//! Meeting provider client.
//!
//! Adds confirmed attendees as registrants of the event's external meeting.
//! Called only from the background sync job, which drains the outbox with
//! bounded retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use domain::services::{MeetingError, MeetingIntegration, MeetingRegistrant};

use crate::config::MeetingConfig;

/// Meeting provider client over HTTP.
pub struct HttpMeetingClient {
    client: Client,
    config: MeetingConfig,
}

#[derive(Debug, Serialize)]
struct RegistrantRequest<'a> {
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegistrantResponse {
    registrant_id: String,
    join_url: String,
}

impl HttpMeetingClient {
    pub fn new(config: MeetingConfig) -> Result<Self, MeetingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MeetingError::Request(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MeetingIntegration for HttpMeetingClient {
    async fn add_registrant(
        &self,
        meeting_id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<MeetingRegistrant, MeetingError> {
        let url = format!(
            "{}/meetings/{}/registrants",
            self.config.api_base.trim_end_matches('/'),
            meeting_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&RegistrantRequest {
                email,
                first_name,
                last_name,
            })
            .send()
            .await
            .map_err(|e| MeetingError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MeetingError::MeetingNotFound(meeting_id.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(MeetingError::Request(format!(
                "Registrant creation returned {}",
                status
            )));
        }

        let body: RegistrantResponse = response
            .json()
            .await
            .map_err(|e| MeetingError::Request(e.to_string()))?;

        Ok(MeetingRegistrant {
            registrant_id: body.registrant_id,
            join_url: body.join_url,
        })
    }
}

/// Stand-in when meeting sync is disabled. The sync job treats `Disabled`
/// as a terminal failure rather than retrying.
pub struct NoopMeetingClient;

#[async_trait]
impl MeetingIntegration for NoopMeetingClient {
    async fn add_registrant(
        &self,
        _meeting_id: &str,
        _email: &str,
        _first_name: &str,
        _last_name: &str,
    ) -> Result<MeetingRegistrant, MeetingError> {
        Err(MeetingError::Disabled)
    }
}
