//! Payment types: session request/response, result codes, errors.

use std::fmt::{self, Write};

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by payment service operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The HTTP request to the payment service failed.
    #[error("payment request failed: {0}")]
    Request(String),

    /// The payment service returned a non-success HTTP status.
    #[error("payment response error: status {status}")]
    Response { status: u16, body: String },

    /// The payment service response body could not be deserialized.
    #[error("payment response parse failed: {0}")]
    Parse(String),

    /// The payment service answered `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for PaymentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_PAYMENT_REQUEST",
            Self::Response { .. } => "E_PAYMENT_RESPONSE",
            Self::Parse(_) => "E_PAYMENT_PARSE",
            Self::Rejected(_) => "E_PAYMENT_REJECTED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// PAYMENT METHOD
// =============================================================================

/// Payment methods offered in the review step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    #[serde(rename = "gcash")]
    GCash,
    #[serde(rename = "paymaya")]
    PayMaya,
    #[serde(rename = "grabpay")]
    GrabPay,
}

impl PaymentMethod {
    pub const ALL: [Self; 4] = [Self::Card, Self::GCash, Self::PayMaya, Self::GrabPay];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::GCash => "gcash",
            Self::PayMaya => "paymaya",
            Self::GrabPay => "grabpay",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RESULT CODE
// =============================================================================

/// Provider-reported payment outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultCode {
    Authorised,
    Pending,
    Received,
    Refused,
    Cancelled,
    Error,
    Other(String),
}

/// What a result code means for the booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Confirmed,
    Pending,
    Failed,
}

impl ResultCode {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Authorised" => Self::Authorised,
            "Pending" => Self::Pending,
            "Received" => Self::Received,
            "Refused" => Self::Refused,
            "Cancelled" => Self::Cancelled,
            "Error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Authorised => "Authorised",
            Self::Pending => "Pending",
            Self::Received => "Received",
            Self::Refused => "Refused",
            Self::Cancelled => "Cancelled",
            Self::Error => "Error",
            Self::Other(s) => s,
        }
    }

    /// Only `Authorised`, `Pending` and `Received` lead forward.
    #[must_use]
    pub fn outcome(&self) -> PaymentOutcome {
        match self {
            Self::Authorised => PaymentOutcome::Confirmed,
            Self::Pending | Self::Received => PaymentOutcome::Pending,
            _ => PaymentOutcome::Failed,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Minor units (centavos for PHP).
    pub value: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    pub amount: Amount,
    pub reference: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub patient_id: Uuid,
    pub clinic_id: Uuid,
    pub appointment_type: String,
}

/// Session handle passed to the checkout widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub id: String,
    pub session_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Generate a merchant reference: `APPT-` followed by 12 hex chars.
#[must_use]
pub fn generate_reference() -> String {
    let bytes: [u8; 6] = rand::rng().random();
    let mut s = String::with_capacity(17);
    s.push_str("APPT-");
    for b in bytes {
        let _ = write!(s, "{b:02X}");
    }
    s
}

// =============================================================================
// PAYMENT GATEWAY TRAIT
// =============================================================================

/// Provider-neutral async trait for payment session creation. Enables
/// mocking in tests.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a checkout session for the drop-in widget.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] if the request fails or the service
    /// rejects it.
    async fn create_session(&self, request: &PaymentSessionRequest) -> Result<PaymentSession, PaymentError>;

    /// Check that the payment service is reachable.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] if the service cannot be reached.
    async fn ping(&self) -> Result<(), PaymentError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
