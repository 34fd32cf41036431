//! Booking service: drives wizards through their external calls.
//!
//! DESIGN
//! ======
//! Each operation locks the registry, asks the wizard for the next payload,
//! releases the lock, performs the external call, then re-locks and feeds
//! the result back. The registry lock is never held across I/O; the
//! wizard's own `busy` flag rejects overlapping submissions instead.
//!
//! ERROR HANDLING
//! ==============
//! Session-creation failures stay inline on the wizard (review keeps the
//! message). A failed appointment insert after a forward result code means
//! the provider has captured money with nothing to show for it, so a
//! `payment_reconciliations` row is written before the wizard fails. A
//! callback that lands after its wizard was closed is logged and dropped.
//!
//! CANCELLATION
//! ============
//! Once `busy` is set, the external call and its feed-back run in a spawned
//! task that the handler only awaits. A handler dropped mid-call (client
//! gone) leaves that task running, so `busy` is always cleared and a
//! captured payment always settles or reaches the reconciliation table.

use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::payment::types::PaymentError;
use crate::payment::{Amount, PaymentMethod, PaymentOutcome, PaymentSession, ResultCode};
use crate::services::session::PatientSession;
use crate::services::wizard::{BookingDetails, BookingWizard, TransitionError, WizardView};
use crate::state::AppState;
use crate::store::{Filter, Query, StoreError};

const APPOINTMENT_TYPES_TABLE: &str = "appointment_types";
const APPOINTMENTS_TABLE: &str = "appointments";
const RECONCILIATIONS_TABLE: &str = "payment_reconciliations";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("booking not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("{0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("booking update interrupted: {0}")]
    Interrupted(String),
}

impl ErrorCode for BookingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_BOOKING_NOT_FOUND",
            Self::Transition(TransitionError::Validation(_)) | Self::Validation(_) => "E_VALIDATION",
            Self::Transition(TransitionError::InvalidTransition { .. }) => "E_INVALID_TRANSITION",
            Self::Transition(TransitionError::Busy) => "E_BOOKING_BUSY",
            Self::Store(e) => e.error_code(),
            Self::Interrupted(_) => "E_BOOKING_INTERRUPTED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Transition(TransitionError::Busy) => true,
            Self::Store(e) => e.retryable(),
            _ => false,
        }
    }
}

/// Body of `POST /api/bookings`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenBookingRequest {
    pub clinic_id: Uuid,
    pub clinic_name: String,
    pub doctor_id: Option<Uuid>,
    pub doctor_name: Option<String>,
    pub appointment_date: String,
    pub appointment_time: String,
    /// Consultation fee in minor units.
    pub amount_minor: i64,
    pub currency: Option<String>,
    pub notes: Option<String>,
    /// Caller-supplied list; fetched from the store when absent.
    pub appointment_types: Option<Vec<String>>,
}

/// Body of `PATCH /api/bookings/{id}/selection`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionUpdate {
    pub appointment_type: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

// =============================================================================
// APPOINTMENT TYPES
// =============================================================================

/// Raw appointment type names for a clinic, in store order. An empty result
/// is left empty; the wizard applies the fallback set.
///
/// # Errors
///
/// Returns a store error if the query fails.
pub async fn list_appointment_types(
    state: &AppState,
    clinic_id: Uuid,
    access_token: Option<&str>,
) -> Result<Vec<String>, BookingError> {
    let query = Query::new()
        .filter(Filter::eq("clinic_id", clinic_id))
        .order_by("name", true);
    let rows = state
        .store
        .select(APPOINTMENT_TYPES_TABLE, &query, access_token)
        .await?;
    Ok(rows.iter().filter_map(type_name).collect())
}

fn type_name(row: &Value) -> Option<String> {
    row.get("name")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Open a wizard in `review`.
///
/// # Errors
///
/// Returns a validation error for a malformed date or negative amount, or a
/// store error if the appointment types cannot be loaded.
pub async fn open_wizard(
    state: &AppState,
    patient: &PatientSession,
    request: OpenBookingRequest,
) -> Result<WizardView, BookingError> {
    if crate::services::history::parse_date(&request.appointment_date).is_none() {
        return Err(BookingError::Validation("Invalid appointment date.".into()));
    }
    if request.amount_minor < 0 {
        return Err(BookingError::Validation("Amount cannot be negative.".into()));
    }

    let types = match request.appointment_types {
        Some(types) => types,
        None => list_appointment_types(state, request.clinic_id, Some(&patient.access_token)).await?,
    };

    let details = BookingDetails {
        clinic_id: request.clinic_id,
        clinic_name: request.clinic_name,
        doctor_id: request.doctor_id,
        doctor_name: request.doctor_name.filter(|n| !n.trim().is_empty()),
        appointment_date: request.appointment_date,
        appointment_time: request.appointment_time,
        amount: Amount {
            value: request.amount_minor,
            currency: request
                .currency
                .unwrap_or_else(|| state.config.currency.clone()),
        },
        notes: request.notes,
    };

    let wizard = BookingWizard::new(patient.patient_id, details, types);
    let view = wizard.view();
    info!(wizard_id = %wizard.id, patient_id = %patient.patient_id, "booking wizard opened");
    state.wizards.write().await.insert(wizard.id, wizard);
    Ok(view)
}

/// Current view of a wizard.
///
/// # Errors
///
/// Returns `NotFound` if the wizard does not exist or belongs to another patient.
pub async fn get_wizard(state: &AppState, patient: &PatientSession, wizard_id: Uuid) -> Result<WizardView, BookingError> {
    with_wizard(state, patient, wizard_id, |w| Ok(w.view())).await
}

/// Close (unmount) a wizard. In-flight external calls are not cancelled.
///
/// # Errors
///
/// Returns `NotFound` if the wizard does not exist or belongs to another patient.
pub async fn close_wizard(state: &AppState, patient: &PatientSession, wizard_id: Uuid) -> Result<(), BookingError> {
    let mut wizards = state.wizards.write().await;
    match wizards.get(&wizard_id) {
        Some(w) if w.patient_id == patient.patient_id => {
            if w.is_busy() {
                warn!(%wizard_id, step = %w.step(), "closing booking wizard with a request in flight");
            }
            wizards.remove(&wizard_id);
            info!(%wizard_id, "booking wizard closed");
            Ok(())
        }
        _ => Err(BookingError::NotFound(wizard_id)),
    }
}

async fn with_wizard<T>(
    state: &AppState,
    patient: &PatientSession,
    wizard_id: Uuid,
    f: impl FnOnce(&mut BookingWizard) -> Result<T, BookingError>,
) -> Result<T, BookingError> {
    let mut wizards = state.wizards.write().await;
    let wizard = wizards
        .get_mut(&wizard_id)
        .filter(|w| w.patient_id == patient.patient_id)
        .ok_or(BookingError::NotFound(wizard_id))?;
    wizard.touch();
    f(wizard)
}

// =============================================================================
// REVIEW
// =============================================================================

/// Update the review-step selections.
///
/// # Errors
///
/// Returns a transition error outside `review` or for an unknown type.
pub async fn update_selection(
    state: &AppState,
    patient: &PatientSession,
    wizard_id: Uuid,
    update: SelectionUpdate,
) -> Result<WizardView, BookingError> {
    with_wizard(state, patient, wizard_id, |w| {
        if let Some(t) = update.appointment_type.as_deref() {
            w.select_appointment_type(t)?;
        }
        if let Some(m) = update.payment_method {
            w.select_payment_method(m)?;
        }
        Ok(w.view())
    })
    .await
}

/// review → payment: create a payment session for the widget.
///
/// # Errors
///
/// Returns a validation error with no state change when no appointment type
/// is selected. Session-creation failures are not errors; the returned view
/// stays in `review` with the message set.
pub async fn proceed_to_payment(
    state: &AppState,
    patient: &PatientSession,
    wizard_id: Uuid,
) -> Result<WizardView, BookingError> {
    let return_url = state.config.payment_return_url.clone();
    let request = with_wizard(state, patient, wizard_id, |w| Ok(w.prepare_session(return_url)?)).await?;

    let state = state.clone();
    settle_detached(
        wizard_id,
        tokio::spawn(async move {
            let result = state.payments.create_session(&request).await;
            apply_session_result(&state, wizard_id, &request.reference, result).await
        }),
    )
    .await
}

async fn apply_session_result(
    state: &AppState,
    wizard_id: Uuid,
    reference: &str,
    result: Result<PaymentSession, PaymentError>,
) -> Result<WizardView, BookingError> {
    let mut wizards = state.wizards.write().await;
    let Some(wizard) = wizards.get_mut(&wizard_id) else {
        warn!(%wizard_id, %reference, "payment session returned after wizard closed");
        return Err(BookingError::NotFound(wizard_id));
    };

    match result {
        Ok(session) => {
            info!(%wizard_id, session_id = %session.id, "payment session created");
            wizard.session_created(session)?;
        }
        Err(e) => {
            warn!(%wizard_id, error = %e, "payment session creation failed");
            wizard.session_failed(&e.to_string())?;
        }
    }
    Ok(wizard.view())
}

/// Await a settle task. The task owns the external call and the feed-back,
/// so it runs to completion even if the awaiting handler is dropped.
async fn settle_detached(
    wizard_id: Uuid,
    task: JoinHandle<Result<WizardView, BookingError>>,
) -> Result<WizardView, BookingError> {
    task.await.map_err(|e| {
        error!(%wizard_id, error = %e, "booking settle task did not complete");
        BookingError::Interrupted(e.to_string())
    })?
}

// =============================================================================
// PAYMENT
// =============================================================================

/// Widget completion callback: payment → processing → success | failed.
///
/// # Errors
///
/// Returns a transition error outside `payment`, or `NotFound` if the
/// wizard was closed before the record write finished.
pub async fn record_payment_result(
    state: &AppState,
    patient: &PatientSession,
    wizard_id: Uuid,
    result_code: &str,
    psp_reference: Option<String>,
) -> Result<WizardView, BookingError> {
    let code = ResultCode::parse(result_code);
    let pending_write = with_wizard(state, patient, wizard_id, |w| {
        let outcome = w.payment_result(code, psp_reference)?;
        info!(%wizard_id, result_code, ?outcome, "payment result received");
        if outcome == PaymentOutcome::Failed {
            return Ok(Err(w.view()));
        }
        Ok(Ok((w.appointment_record(), w.reconciliation_record("appointment record creation failed"))))
    })
    .await?;

    let (record, reconciliation) = match pending_write {
        Ok(rows) => rows,
        Err(view) => return Ok(view),
    };

    let state = state.clone();
    let access_token = patient.access_token.clone();
    settle_detached(
        wizard_id,
        tokio::spawn(async move { write_appointment(&state, wizard_id, &access_token, record, reconciliation).await }),
    )
    .await
}

/// processing → success | failed. Payment is captured by the time this
/// runs, so a failed insert always attempts the reconciliation row.
async fn write_appointment(
    state: &AppState,
    wizard_id: Uuid,
    access_token: &str,
    record: Value,
    reconciliation: Value,
) -> Result<WizardView, BookingError> {
    let created = state
        .store
        .insert(APPOINTMENTS_TABLE, record, Some(access_token))
        .await;

    let reconciliation_recorded = match &created {
        Ok(_) => false,
        Err(e) => {
            error!(%wizard_id, error = %e, "appointment record creation failed after payment");
            record_reconciliation(state, wizard_id, access_token, reconciliation).await
        }
    };

    let mut wizards = state.wizards.write().await;
    let Some(wizard) = wizards.get_mut(&wizard_id) else {
        warn!(%wizard_id, created = created.is_ok(), "payment result settled after wizard closed");
        return Err(BookingError::NotFound(wizard_id));
    };

    match created {
        Ok(rows) => {
            let appointment_id = rows.first().and_then(appointment_id);
            info!(%wizard_id, ?appointment_id, "appointment created");
            wizard.record_created(appointment_id)?;
        }
        Err(_) => wizard.record_failed(reconciliation_recorded)?,
    }
    Ok(wizard.view())
}

fn appointment_id(row: &Value) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

async fn record_reconciliation(state: &AppState, wizard_id: Uuid, access_token: &str, row: Value) -> bool {
    let psp_reference = row
        .get("psp_reference")
        .and_then(Value::as_str)
        .unwrap_or("none")
        .to_string();
    match state
        .store
        .insert(RECONCILIATIONS_TABLE, row, Some(access_token))
        .await
    {
        Ok(_) => {
            warn!(%wizard_id, %psp_reference, "payment queued for reconciliation");
            true
        }
        Err(e) => {
            error!(%wizard_id, %psp_reference, error = %e, "reconciliation record failed; manual follow-up required");
            false
        }
    }
}

/// Widget error callback: payment → failed.
///
/// # Errors
///
/// Returns a transition error outside `payment`.
pub async fn record_payment_error(
    state: &AppState,
    patient: &PatientSession,
    wizard_id: Uuid,
    message: &str,
) -> Result<WizardView, BookingError> {
    with_wizard(state, patient, wizard_id, |w| {
        w.payment_error(message)?;
        warn!(%wizard_id, message, "payment widget reported an error");
        Ok(w.view())
    })
    .await
}

// =============================================================================
// FAILED
// =============================================================================

/// failed → review.
///
/// # Errors
///
/// Returns a transition error outside `failed`.
pub async fn retry(state: &AppState, patient: &PatientSession, wizard_id: Uuid) -> Result<WizardView, BookingError> {
    with_wizard(state, patient, wizard_id, |w| {
        w.retry()?;
        info!(%wizard_id, "booking wizard retry");
        Ok(w.view())
    })
    .await
}

#[cfg(test)]
#[path = "booking_test.rs"]
mod tests;
