//! Connectivity diagnostics for the two external dependencies.
//!
//! Both checks run concurrently and never fail the request; a failed check
//! is reported with `ok: false` and the error text in `detail`.

use std::future::Future;
use std::time::Instant;

use serde::Serialize;
use tracing::warn;

use crate::state::AppState;
use crate::store::Query;

const STORE_PROBE_TABLE: &str = "appointment_types";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub ok: bool,
    pub latency_ms: u64,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub ok: bool,
    pub checks: Vec<CheckResult>,
}

async fn timed<F, T, E>(name: &'static str, probe: F, on_ok: impl FnOnce(T) -> String) -> CheckResult
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let started = Instant::now();
    let result = probe.await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(value) => CheckResult { name, ok: true, latency_ms, detail: on_ok(value) },
        Err(e) => {
            warn!(check = name, error = %e, latency_ms, "diagnostic check failed");
            CheckResult { name, ok: false, latency_ms, detail: e.to_string() }
        }
    }
}

/// Probe the data store and the payment service.
pub async fn run_diagnostics(state: &AppState) -> DiagnosticsReport {
    let probe_query = Query::new().limit(1);
    let store_check = timed(
        "data_store",
        state.store.select(STORE_PROBE_TABLE, &probe_query, None),
        |rows| format!("{} row(s) from {STORE_PROBE_TABLE}", rows.len()),
    );
    let payment_check = timed("payment_service", state.payments.ping(), |()| "reachable".to_string());

    let (store, payment) = tokio::join!(store_check, payment_check);
    DiagnosticsReport { ok: store.ok && payment.ok, checks: vec![store, payment] }
}

#[cfg(test)]
#[path = "diagnostics_test.rs"]
mod tests;
