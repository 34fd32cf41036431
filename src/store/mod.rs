//! Data store: row-based CRUD against the hosted backend.
//!
//! DESIGN
//! ======
//! Services depend on the `DataStore` trait, never on a concrete backend.
//! Rows travel as `serde_json::Value` objects so each service owns the
//! typed view of its own tables. The production implementation speaks
//! PostgREST (`supabase::SupabaseStore`); tests substitute an in-memory
//! store from `state::test_helpers`.
//!
//! TRADE-OFFS
//! ==========
//! No transactional guarantees are assumed. Callers that write more than
//! one row handle partial failure themselves (see the booking service's
//! reconciliation step).

pub mod supabase;

use serde_json::Value;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by data store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request to the store failed before a response arrived.
    #[error("store request failed: {0}")]
    Request(String),

    /// The store returned a non-success HTTP status.
    #[error("store response error: status {status}")]
    Response { status: u16, body: String },

    /// The store response body could not be decoded.
    #[error("store response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_STORE_REQUEST",
            Self::Response { .. } => "E_STORE_RESPONSE",
            Self::Parse(_) => "E_STORE_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// Column equality predicate (`col=eq.value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self { column: column.into(), value: value.to_string() }
    }

    /// Evaluate the predicate against a JSON row. Used by in-memory stores.
    #[cfg(test)]
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        let Some(field) = row.get(&self.column) else {
            return false;
        };
        match field {
            Value::String(s) => *s == self.value,
            Value::Null => false,
            other => other.to_string() == self.value,
        }
    }
}

/// Select query: filters, optional ordering, optional row limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order { column: column.into(), ascending });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// DATA STORE TRAIT
// =============================================================================

/// Row-based CRUD. `access_token` is the caller's backend token, forwarded
/// so the store can enforce its own row-level policies.
#[async_trait::async_trait]
pub trait DataStore: Send + Sync {
    /// Read rows from `table` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails or the body is malformed.
    async fn select(&self, table: &str, query: &Query, access_token: Option<&str>) -> Result<Vec<Value>, StoreError>;

    /// Insert one row into `table`, returning the stored representation.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails or the body is malformed.
    async fn insert(&self, table: &str, row: Value, access_token: Option<&str>) -> Result<Vec<Value>, StoreError>;

    /// Patch rows in `table` matching `filters`, returning the updated rows.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails or the body is malformed.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
        access_token: Option<&str>,
    ) -> Result<Vec<Value>, StoreError>;
}
