//! History dashboard: appointment aggregates for one patient.
//!
//! DESIGN
//! ======
//! Rows are loaded once from the `appointments` table and folded into a
//! `HistorySummary` by a pure function so the counting rules can be tested
//! without a store. Formatting into display cards is a second pure step.

use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::error::ErrorCode;
use crate::services::session::PatientSession;
use crate::state::AppState;
use crate::store::{Filter, Query, StoreError};

const APPOINTMENTS_TABLE: &str = "appointments";

/// Statuses that count as upcoming when dated today or later.
const UPCOMING_STATUSES: [&str; 3] = ["scheduled", "confirmed", "pending_payment"];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ErrorCode for HistoryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
        }
    }
}

/// The slice of an `appointments` row the dashboard needs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentRecord {
    pub appointment_date: Option<String>,
    pub status: Option<String>,
    pub clinic_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub total_appointments: usize,
    pub completed_appointments: usize,
    pub upcoming_appointments: usize,
    pub cancelled_appointments: usize,
    pub last_visit: Option<Date>,
    pub next_appointment: Option<Date>,
    pub clinics_visited: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryDashboard {
    pub cards: Vec<StatCard>,
}

// =============================================================================
// DATES
// =============================================================================

/// Parse a `YYYY-MM-DD` date. Timestamps are cut to their date part.
#[must_use]
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
}

/// `Mar 5, 2025`.
#[must_use]
pub fn format_date(date: Date) -> String {
    date.format(format_description!("[month repr:short] [day padding:none], [year]"))
        .unwrap_or_else(|_| date.to_string())
}

// =============================================================================
// AGGREGATION
// =============================================================================

/// Fold appointment rows into counts and key dates relative to `today`.
#[must_use]
pub fn summarize(rows: &[AppointmentRecord], today: Date) -> HistorySummary {
    let mut summary = HistorySummary { total_appointments: rows.len(), ..HistorySummary::default() };
    let mut clinics: Vec<&str> = Vec::new();

    for row in rows {
        let status = row.status.as_deref().unwrap_or_default();
        let date = row.appointment_date.as_deref().and_then(parse_date);

        match status {
            "completed" => {
                summary.completed_appointments += 1;
                if let Some(d) = date {
                    summary.last_visit = summary.last_visit.max(Some(d));
                }
                if let Some(clinic) = row.clinic_id.as_deref() {
                    if !clinics.contains(&clinic) {
                        clinics.push(clinic);
                    }
                }
            }
            "cancelled" => summary.cancelled_appointments += 1,
            s if UPCOMING_STATUSES.contains(&s) => {
                if let Some(d) = date.filter(|d| *d >= today) {
                    summary.upcoming_appointments += 1;
                    summary.next_appointment = Some(summary.next_appointment.map_or(d, |n| n.min(d)));
                }
            }
            _ => {}
        }
    }

    summary.clinics_visited = clinics.len();
    summary
}

/// Display cards for a summary.
#[must_use]
pub fn dashboard(summary: &HistorySummary) -> HistoryDashboard {
    let last_visit = summary
        .last_visit
        .map_or_else(|| "No visits yet".to_string(), format_date);
    let next = summary
        .next_appointment
        .map_or_else(|| "None scheduled".to_string(), format_date);

    HistoryDashboard {
        cards: vec![
            StatCard {
                label: "Total Appointments",
                value: summary.total_appointments.to_string(),
                detail: format!("{} completed", summary.completed_appointments),
            },
            StatCard {
                label: "Upcoming",
                value: summary.upcoming_appointments.to_string(),
                detail: format!("Next: {next}"),
            },
            StatCard {
                label: "Last Visit",
                value: last_visit,
                detail: format!("{} clinics visited", summary.clinics_visited),
            },
            StatCard {
                label: "Cancelled",
                value: summary.cancelled_appointments.to_string(),
                detail: "appointments".to_string(),
            },
        ],
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// Load the patient's appointments and build the dashboard.
///
/// # Errors
///
/// Returns a store error if the appointments cannot be loaded.
pub async fn history_dashboard(
    state: &AppState,
    patient: &PatientSession,
    today: Date,
) -> Result<HistoryDashboard, HistoryError> {
    let query = Query::new()
        .filter(Filter::eq("patient_id", patient.patient_id))
        .order_by("appointment_date", false);
    let rows = state
        .store
        .select(APPOINTMENTS_TABLE, &query, Some(&patient.access_token))
        .await?;

    // Malformed rows still count toward the total; they just carry no status.
    let total = rows.len();
    let mut records = Vec::with_capacity(total);
    for row in rows {
        match serde_json::from_value::<AppointmentRecord>(row) {
            Ok(record) => records.push(record),
            Err(e) => warn!(patient_id = %patient.patient_id, error = %e, "malformed appointment row"),
        }
    }
    let summary = HistorySummary { total_appointments: total, ..summarize(&records, today) };
    debug!(patient_id = %patient.patient_id, total = summary.total_appointments, "history summarized");
    Ok(dashboard(&summary))
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
