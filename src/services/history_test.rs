use super::*;
use crate::state::test_helpers;
use serde_json::json;
use time::macros::date;

fn record(date: &str, status: &str, clinic: &str) -> AppointmentRecord {
    AppointmentRecord {
        appointment_date: Some(date.into()),
        status: Some(status.into()),
        clinic_id: Some(clinic.into()),
    }
}

// =========================================================================
// dates
// =========================================================================

#[test]
fn parse_date_accepts_iso_and_timestamps() {
    assert_eq!(parse_date("2025-03-05"), Some(date!(2025 - 03 - 05)));
    assert_eq!(parse_date("2025-03-05T09:30:00+00:00"), Some(date!(2025 - 03 - 05)));
    assert_eq!(parse_date(" 2025-12-31 "), Some(date!(2025 - 12 - 31)));
}

#[test]
fn parse_date_rejects_garbage() {
    assert_eq!(parse_date(""), None);
    assert_eq!(parse_date("05/03/2025"), None);
    assert_eq!(parse_date("2025-02-30"), None);
}

#[test]
fn format_date_uses_short_month_unpadded_day() {
    assert_eq!(format_date(date!(2025 - 03 - 05)), "Mar 5, 2025");
    assert_eq!(format_date(date!(2024 - 12 - 25)), "Dec 25, 2024");
}

// =========================================================================
// summarize
// =========================================================================

#[test]
fn empty_history_summarizes_to_zero() {
    let summary = summarize(&[], date!(2025 - 03 - 01));
    assert_eq!(summary, HistorySummary::default());
}

#[test]
fn counts_and_key_dates() {
    let today = date!(2025 - 03 - 01);
    let rows = vec![
        record("2025-01-10", "completed", "c1"),
        record("2025-02-14", "completed", "c2"),
        record("2025-02-20", "completed", "c1"),
        record("2025-01-05", "cancelled", "c3"),
        record("2025-03-20", "scheduled", "c1"),
        record("2025-03-05", "pending_payment", "c2"),
        record("2025-03-01", "confirmed", "c2"),
    ];
    let summary = summarize(&rows, today);
    assert_eq!(summary.total_appointments, 7);
    assert_eq!(summary.completed_appointments, 3);
    assert_eq!(summary.cancelled_appointments, 1);
    assert_eq!(summary.upcoming_appointments, 3);
    assert_eq!(summary.last_visit, Some(date!(2025 - 02 - 20)));
    assert_eq!(summary.next_appointment, Some(date!(2025 - 03 - 01)));
    assert_eq!(summary.clinics_visited, 2);
}

#[test]
fn past_scheduled_appointments_are_not_upcoming() {
    let rows = vec![record("2025-02-01", "scheduled", "c1")];
    let summary = summarize(&rows, date!(2025 - 03 - 01));
    assert_eq!(summary.upcoming_appointments, 0);
    assert_eq!(summary.next_appointment, None);
}

#[test]
fn bare_pending_status_is_not_upcoming() {
    let rows = vec![record("2025-03-10", "pending", "c1"), record("2025-03-12", "pending_payment", "c1")];
    let summary = summarize(&rows, date!(2025 - 03 - 01));
    assert_eq!(summary.upcoming_appointments, 1);
    assert_eq!(summary.next_appointment, Some(date!(2025 - 03 - 12)));
}

#[test]
fn undated_rows_still_count_toward_total() {
    let rows = vec![AppointmentRecord { status: Some("completed".into()), ..Default::default() }];
    let summary = summarize(&rows, date!(2025 - 03 - 01));
    assert_eq!(summary.total_appointments, 1);
    assert_eq!(summary.completed_appointments, 1);
    assert_eq!(summary.last_visit, None);
}

// =========================================================================
// dashboard
// =========================================================================

#[test]
fn dashboard_uses_placeholders_for_missing_dates() {
    let cards = dashboard(&HistorySummary::default()).cards;
    assert_eq!(cards.len(), 4);
    assert_eq!(cards[1].detail, "Next: None scheduled");
    assert_eq!(cards[2].value, "No visits yet");
}

#[test]
fn dashboard_formats_dates() {
    let summary = HistorySummary {
        total_appointments: 2,
        completed_appointments: 1,
        upcoming_appointments: 1,
        last_visit: Some(date!(2025 - 02 - 20)),
        next_appointment: Some(date!(2025 - 03 - 05)),
        clinics_visited: 1,
        ..HistorySummary::default()
    };
    let cards = dashboard(&summary).cards;
    assert_eq!(cards[0].value, "2");
    assert_eq!(cards[0].detail, "1 completed");
    assert_eq!(cards[1].detail, "Next: Mar 5, 2025");
    assert_eq!(cards[2].value, "Feb 20, 2025");
}

// =========================================================================
// service
// =========================================================================

#[tokio::test]
async fn history_dashboard_reads_only_own_rows() {
    let (state, store, _) = test_helpers::test_app_state();
    let patient = test_helpers::test_patient();
    store.seed(
        "appointments",
        json!({ "patient_id": patient.patient_id.to_string(), "appointment_date": "2025-02-01", "status": "completed", "clinic_id": "c1" }),
    );
    store.seed(
        "appointments",
        json!({ "patient_id": "someone-else", "appointment_date": "2025-02-02", "status": "completed", "clinic_id": "c9" }),
    );

    let view = history_dashboard(&state, &patient, date!(2025 - 03 - 01)).await.unwrap();
    assert_eq!(view.cards[0].value, "1");
    assert_eq!(view.cards[2].value, "Feb 1, 2025");
}

#[tokio::test]
async fn history_dashboard_counts_malformed_rows_in_total() {
    let (state, store, _) = test_helpers::test_app_state();
    let patient = test_helpers::test_patient();
    store.seed(
        "appointments",
        json!({ "patient_id": patient.patient_id.to_string(), "appointment_date": "2025-02-01", "status": "completed", "clinic_id": "c1" }),
    );
    store.seed(
        "appointments",
        json!({ "patient_id": patient.patient_id.to_string(), "appointment_date": "2025-02-03", "status": "completed", "clinic_id": 42 }),
    );

    let view = history_dashboard(&state, &patient, date!(2025 - 03 - 01)).await.unwrap();
    assert_eq!(view.cards[0].value, "2");
    assert_eq!(view.cards[0].detail, "1 completed");
}

#[tokio::test]
async fn history_dashboard_surfaces_store_errors() {
    let (state, store, _) = test_helpers::test_app_state();
    store.fail_table("appointments");
    let err = history_dashboard(&state, &test_helpers::test_patient(), date!(2025 - 03 - 01))
        .await
        .unwrap_err();
    assert!(err.retryable());
}
