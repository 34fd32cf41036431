//! Supabase (PostgREST) data store client.
//!
//! Thin HTTP wrapper for `/rest/v1/<table>`. Query-string encoding and
//! response parsing are pure functions for testability.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use super::{DataStore, Filter, Query, StoreError};
use crate::config::{HttpTimeouts, PortalConfig};

const REST_PREFIX: &str = "rest/v1";

// =============================================================================
// CLIENT
// =============================================================================

pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseStore {
    /// Build a store client from portal config.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &PortalConfig) -> Result<Self, StoreError> {
        Self::with_parts(&config.supabase_url, &config.supabase_anon_key, config.timeouts)
    }

    /// Build a store client from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn with_parts(base_url: &str, anon_key: &str, timeouts: HttpTimeouts) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), anon_key: anon_key.to_string() })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{REST_PREFIX}/{table}", self.base_url)
    }

    async fn send(
        &self,
        method: Method,
        table: &str,
        params: &[(String, String)],
        body: Option<Value>,
        access_token: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        let bearer = access_token.unwrap_or(&self.anon_key);
        let mut request = self
            .http
            .request(method, self.table_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .query(params);

        if let Some(body) = body {
            request = request.header("Prefer", "return=representation").json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(StoreError::Response { status, body: text });
        }

        parse_rows(&text)
    }
}

#[async_trait::async_trait]
impl DataStore for SupabaseStore {
    async fn select(&self, table: &str, query: &Query, access_token: Option<&str>) -> Result<Vec<Value>, StoreError> {
        self.send(Method::GET, table, &query_params(query), None, access_token)
            .await
    }

    async fn insert(&self, table: &str, row: Value, access_token: Option<&str>) -> Result<Vec<Value>, StoreError> {
        self.send(Method::POST, table, &[], Some(row), access_token)
            .await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
        access_token: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        self.send(Method::PATCH, table, &filter_params(filters), Some(patch), access_token)
            .await
    }
}

// =============================================================================
// ENCODING
// =============================================================================

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
        .collect()
}

fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        let dir = if order.ascending { "asc" } else { "desc" };
        params.push(("order".into(), format!("{}.{dir}", order.column)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".into(), limit.to_string()));
    }
    params
}

// =============================================================================
// PARSING
// =============================================================================

/// PostgREST returns an array for representation responses and an empty
/// body for `return=minimal`. A bare object is wrapped.
fn parse_rows(text: &str) -> Result<Vec<Value>, StoreError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(text).map_err(|e| StoreError::Parse(e.to_string()))? {
        Value::Array(rows) => Ok(rows),
        obj @ Value::Object(_) => Ok(vec![obj]),
        other => Err(StoreError::Parse(format!("unexpected response shape: {other}"))),
    }
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
