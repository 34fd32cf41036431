//! Hosted payment-session function client.
//!
//! Posts a session request to the backend function that holds the provider
//! credentials and returns `{ success, session | error }`. Pure parsing in
//! `parse_session_response` for testability.

use std::time::Duration;

use reqwest::Method;

use super::types::{PaymentError, PaymentGateway, PaymentSession, PaymentSessionRequest};
use crate::config::PortalConfig;

// =============================================================================
// CLIENT
// =============================================================================

pub struct PaymentClient {
    http: reqwest::Client,
    session_url: String,
    anon_key: String,
}

impl PaymentClient {
    /// Build a payment client from portal config.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &PortalConfig) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| PaymentError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            session_url: config.payment_session_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        })
    }
}

#[async_trait::async_trait]
impl PaymentGateway for PaymentClient {
    async fn create_session(&self, request: &PaymentSessionRequest) -> Result<PaymentSession, PaymentError> {
        let response = self
            .http
            .post(&self.session_url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(PaymentError::Response { status, body: text });
        }

        parse_session_response(&text)
    }

    async fn ping(&self) -> Result<(), PaymentError> {
        let response = self
            .http
            .request(Method::OPTIONS, &self.session_url)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 500 {
            return Err(PaymentError::Response { status, body: String::new() });
        }
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Deserialize)]
struct SessionResponse {
    success: bool,
    session: Option<PaymentSession>,
    error: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_session_response(json: &str) -> Result<PaymentSession, PaymentError> {
    let resp: SessionResponse = serde_json::from_str(json).map_err(|e| PaymentError::Parse(e.to_string()))?;

    if !resp.success {
        return Err(PaymentError::Rejected(
            resp.error
                .unwrap_or_else(|| "Failed to create payment session".to_string()),
        ));
    }

    resp.session
        .ok_or_else(|| PaymentError::Parse("success response without session".to_string()))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
