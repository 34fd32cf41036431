//! Portal configuration parsed from environment variables.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CURRENCY: &str = "PHP";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_WIZARD_TTL_SECS: u64 = 1800;
pub const DEFAULT_RATING_RESET_DELAY_MS: u64 = 2000;
const PAYMENT_SESSION_FUNCTION: &str = "functions/v1/create-payment-session";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "E_CONFIG_MISSING",
            Self::Invalid { .. } => "E_CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub payment_session_url: String,
    pub payment_return_url: Option<String>,
    pub currency: String,
    pub timeouts: HttpTimeouts,
    pub wizard_ttl_secs: u64,
    pub rating_reset_delay_ms: u64,
}

impl PortalConfig {
    /// Build typed portal config from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `PAYMENT_SESSION_URL`: default `<SUPABASE_URL>/functions/v1/create-payment-session`
    /// - `PAYMENT_RETURN_URL`: forwarded to the payment provider when set
    /// - `PAYMENT_CURRENCY`: default `PHP`
    /// - `HTTP_REQUEST_TIMEOUT_SECS`: default 30
    /// - `HTTP_CONNECT_TIMEOUT_SECS`: default 10
    /// - `BOOKING_WIZARD_TTL_SECS`: default 1800
    /// - `RATING_RESET_DELAY_MS`: default 2000
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required variable is absent or `PORT`
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = std::env::var("SUPABASE_URL")
            .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?
            .trim_end_matches('/')
            .to_string();
        let supabase_anon_key = std::env::var("SUPABASE_ANON_KEY").map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value: raw })?,
            Err(_) => DEFAULT_PORT,
        };

        let payment_session_url = std::env::var("PAYMENT_SESSION_URL")
            .unwrap_or_else(|_| format!("{supabase_url}/{PAYMENT_SESSION_FUNCTION}"));
        let payment_return_url = std::env::var("PAYMENT_RETURN_URL").ok().filter(|v| !v.is_empty());
        let currency = std::env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());

        let timeouts = HttpTimeouts {
            request_secs: env_parse("HTTP_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("HTTP_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            port,
            supabase_url,
            supabase_anon_key,
            payment_session_url,
            payment_return_url,
            currency,
            timeouts,
            wizard_ttl_secs: env_parse("BOOKING_WIZARD_TTL_SECS", DEFAULT_WIZARD_TTL_SECS),
            rating_reset_delay_ms: env_parse("RATING_RESET_DELAY_MS", DEFAULT_RATING_RESET_DELAY_MS),
        })
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
