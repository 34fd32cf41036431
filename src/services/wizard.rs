//! Booking wizard: the five-step booking state machine.
//!
//! DESIGN
//! ======
//! `review → payment → processing → success` is the happy path. `failed`
//! is entered from `payment` (widget error) or `processing` (non-forward
//! result code or record-creation failure) and left only by an explicit
//! `retry` back to `review`. Every method checks the current step first and
//! rejects anything else without touching state.
//!
//! The wizard never performs I/O. The booking service asks it for the
//! payload of the next external call (session request, appointment row),
//! performs the call with the registry lock released, then feeds the result
//! back in. The `busy` flag covers that gap so duplicate submissions are
//! rejected instead of racing.

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::payment::{
    Amount, PaymentMethod, PaymentOutcome, PaymentSession, PaymentSessionRequest, ResultCode, SessionMetadata,
};

/// Used when the clinic has no appointment types of its own.
pub const FALLBACK_APPOINTMENT_TYPES: [&str; 4] = ["consultation", "follow_up", "routine_checkup", "specialist_visit"];

// =============================================================================
// STEPS AND ACTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Review,
    Payment,
    Processing,
    Success,
    Failed,
}

impl WizardStep {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Payment => "payment",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardAction {
    SelectType,
    SelectMethod,
    Proceed,
    SessionResult,
    PaymentResult,
    PaymentError,
    RecordResult,
    Retry,
}

impl fmt::Display for WizardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SelectType => "select_type",
            Self::SelectMethod => "select_method",
            Self::Proceed => "proceed",
            Self::SessionResult => "session_result",
            Self::PaymentResult => "payment_result",
            Self::PaymentError => "payment_error",
            Self::RecordResult => "record_result",
            Self::Retry => "retry",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("{0}")]
    Validation(String),
    #[error("cannot {action} while in {step}")]
    InvalidTransition { step: WizardStep, action: WizardAction },
    #[error("a request for this booking is already in progress")]
    Busy,
}

// =============================================================================
// BOOKING DETAILS
// =============================================================================

/// Fixed facts about the slot being booked, supplied when the wizard opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingDetails {
    pub clinic_id: Uuid,
    pub clinic_name: String,
    pub doctor_id: Option<Uuid>,
    pub doctor_name: Option<String>,
    /// `YYYY-MM-DD`.
    pub appointment_date: String,
    pub appointment_time: String,
    pub amount: Amount,
    pub notes: Option<String>,
}

/// Trim, drop blanks and duplicates; fall back to the fixed set when empty.
#[must_use]
pub fn resolve_appointment_types(source: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(source.len());
    for raw in source {
        let t = raw.trim();
        if !t.is_empty() && !out.iter().any(|existing| existing == t) {
            out.push(t.to_string());
        }
    }
    if out.is_empty() {
        return FALLBACK_APPOINTMENT_TYPES.iter().map(ToString::to_string).collect();
    }
    out
}

// =============================================================================
// WIZARD
// =============================================================================

#[derive(Debug, Clone)]
pub struct BookingWizard {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub details: BookingDetails,
    appointment_types: Vec<String>,
    step: WizardStep,
    selected_type: String,
    payment_method: PaymentMethod,
    session: Option<PaymentSession>,
    merchant_reference: Option<String>,
    result_code: Option<ResultCode>,
    psp_reference: Option<String>,
    outcome: Option<PaymentOutcome>,
    appointment_id: Option<Uuid>,
    error: Option<String>,
    reconciliation_pending: bool,
    busy: bool,
    touched_at: Instant,
}

impl BookingWizard {
    /// Open a wizard in `review` with the first appointment type preselected.
    #[must_use]
    pub fn new(patient_id: Uuid, details: BookingDetails, appointment_types: Vec<String>) -> Self {
        let appointment_types = resolve_appointment_types(appointment_types);
        let selected_type = appointment_types.first().cloned().unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            details,
            appointment_types,
            step: WizardStep::Review,
            selected_type,
            payment_method: PaymentMethod::default(),
            session: None,
            merchant_reference: None,
            result_code: None,
            psp_reference: None,
            outcome: None,
            appointment_id: None,
            error: None,
            reconciliation_pending: false,
            busy: false,
            touched_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self.step {
            WizardStep::Review => "Review Booking",
            WizardStep::Payment => "Complete Payment",
            WizardStep::Processing => "Processing Payment",
            WizardStep::Success if self.outcome == Some(PaymentOutcome::Pending) => "Appointment Booked",
            WizardStep::Success => "Appointment Confirmed",
            WizardStep::Failed => "Booking Failed",
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn idle_for(&self) -> std::time::Duration {
        self.touched_at.elapsed()
    }

    pub fn touch(&mut self) {
        self.touched_at = Instant::now();
    }

    fn require(&self, step: WizardStep, action: WizardAction) -> Result<(), TransitionError> {
        if self.busy {
            return Err(TransitionError::Busy);
        }
        if self.step != step {
            return Err(TransitionError::InvalidTransition { step: self.step, action });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // review
    // -------------------------------------------------------------------------

    /// Select an appointment type. An empty value clears the selection.
    pub fn select_appointment_type(&mut self, appointment_type: &str) -> Result<(), TransitionError> {
        self.require(WizardStep::Review, WizardAction::SelectType)?;
        let t = appointment_type.trim();
        if !t.is_empty() && !self.appointment_types.iter().any(|known| known == t) {
            return Err(TransitionError::Validation(format!("Unknown appointment type: {t}")));
        }
        self.selected_type = t.to_string();
        Ok(())
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<(), TransitionError> {
        self.require(WizardStep::Review, WizardAction::SelectMethod)?;
        self.payment_method = method;
        Ok(())
    }

    /// Validate the review form and build the session request. Marks the
    /// wizard busy; the step does not change until `session_created`.
    pub fn prepare_session(&mut self, return_url: Option<String>) -> Result<PaymentSessionRequest, TransitionError> {
        self.require(WizardStep::Review, WizardAction::Proceed)?;
        if self.selected_type.is_empty() {
            return Err(TransitionError::Validation("Please select an appointment type.".to_string()));
        }

        let reference = crate::payment::types::generate_reference();
        self.merchant_reference = Some(reference.clone());
        self.error = None;
        self.busy = true;

        Ok(PaymentSessionRequest {
            amount: self.details.amount.clone(),
            reference,
            payment_method: self.payment_method,
            return_url,
            metadata: SessionMetadata {
                patient_id: self.patient_id,
                clinic_id: self.details.clinic_id,
                appointment_type: self.selected_type.clone(),
            },
        })
    }

    /// review → payment.
    pub fn session_created(&mut self, session: PaymentSession) -> Result<(), TransitionError> {
        self.finish_external(WizardStep::Review, WizardAction::SessionResult)?;
        self.session = Some(session);
        self.step = WizardStep::Payment;
        Ok(())
    }

    /// Session creation failed: stay in review with the error shown.
    pub fn session_failed(&mut self, message: &str) -> Result<(), TransitionError> {
        self.finish_external(WizardStep::Review, WizardAction::SessionResult)?;
        self.merchant_reference = None;
        self.error = Some(message.to_string());
        Ok(())
    }

    fn finish_external(&mut self, step: WizardStep, action: WizardAction) -> Result<(), TransitionError> {
        if self.step != step || !self.busy {
            return Err(TransitionError::InvalidTransition { step: self.step, action });
        }
        self.busy = false;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // payment
    // -------------------------------------------------------------------------

    /// payment → processing. A non-forward code continues straight to
    /// `failed`; a forward code leaves the wizard busy in `processing`
    /// until the appointment record is written.
    pub fn payment_result(
        &mut self,
        code: ResultCode,
        psp_reference: Option<String>,
    ) -> Result<PaymentOutcome, TransitionError> {
        self.require(WizardStep::Payment, WizardAction::PaymentResult)?;
        self.step = WizardStep::Processing;

        let outcome = code.outcome();
        self.psp_reference = psp_reference;
        self.outcome = Some(outcome);

        if outcome == PaymentOutcome::Failed {
            self.error = Some(format!("Payment was not successful ({code}). Please try again."));
            self.result_code = Some(code);
            self.step = WizardStep::Failed;
            return Ok(outcome);
        }

        self.result_code = Some(code);
        self.busy = true;
        Ok(outcome)
    }

    /// payment → failed, reported by the widget itself.
    pub fn payment_error(&mut self, message: &str) -> Result<(), TransitionError> {
        self.require(WizardStep::Payment, WizardAction::PaymentError)?;
        let message = message.trim();
        self.error = Some(if message.is_empty() {
            "Payment could not be completed. Please try again.".to_string()
        } else {
            message.to_string()
        });
        self.step = WizardStep::Failed;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // processing
    // -------------------------------------------------------------------------

    /// processing → success.
    pub fn record_created(&mut self, appointment_id: Option<Uuid>) -> Result<(), TransitionError> {
        self.finish_external(WizardStep::Processing, WizardAction::RecordResult)?;
        self.appointment_id = appointment_id;
        self.error = None;
        self.step = WizardStep::Success;
        Ok(())
    }

    /// processing → failed. Payment already went through, so the message
    /// points the patient at support with the provider reference.
    pub fn record_failed(&mut self, reconciliation_recorded: bool) -> Result<(), TransitionError> {
        self.finish_external(WizardStep::Processing, WizardAction::RecordResult)?;
        let reference = self
            .psp_reference
            .as_deref()
            .or(self.merchant_reference.as_deref())
            .unwrap_or("unavailable");
        self.error = Some(format!(
            "Payment was received but we could not create your appointment. Please contact support with reference {reference}."
        ));
        self.reconciliation_pending = reconciliation_recorded;
        self.step = WizardStep::Failed;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // failed
    // -------------------------------------------------------------------------

    /// failed → review.
    pub fn retry(&mut self) -> Result<(), TransitionError> {
        self.require(WizardStep::Failed, WizardAction::Retry)?;
        self.session = None;
        self.merchant_reference = None;
        self.result_code = None;
        self.psp_reference = None;
        self.outcome = None;
        self.appointment_id = None;
        self.error = None;
        self.reconciliation_pending = false;
        self.step = WizardStep::Review;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // payloads
    // -------------------------------------------------------------------------

    /// Row for the `appointments` table. Only meaningful after a forward
    /// result code.
    #[must_use]
    pub fn appointment_record(&self) -> Value {
        let confirmed = self.outcome == Some(PaymentOutcome::Confirmed);
        json!({
            "patient_id": self.patient_id,
            "clinic_id": self.details.clinic_id,
            "doctor_id": self.details.doctor_id,
            "doctor_name": self.details.doctor_name,
            "appointment_date": self.details.appointment_date,
            "appointment_time": self.details.appointment_time,
            "appointment_type": self.selected_type,
            "status": if confirmed { "scheduled" } else { "pending_payment" },
            "payment_status": if confirmed { "paid" } else { "pending" },
            "payment_method": self.payment_method,
            "payment_reference": self.psp_reference,
            "merchant_reference": self.merchant_reference,
            "amount_minor": self.details.amount.value,
            "currency": self.details.amount.currency,
            "patient_notes": self.details.notes,
        })
    }

    /// Row for `payment_reconciliations`, written when a captured payment
    /// has no appointment to go with it.
    #[must_use]
    pub fn reconciliation_record(&self, reason: &str) -> Value {
        json!({
            "psp_reference": self.psp_reference,
            "merchant_reference": self.merchant_reference,
            "result_code": self.result_code.as_ref().map(ResultCode::as_str),
            "patient_id": self.patient_id,
            "clinic_id": self.details.clinic_id,
            "amount_minor": self.details.amount.value,
            "currency": self.details.amount.currency,
            "reason": reason,
            "status": "pending_reconciliation",
        })
    }

    #[must_use]
    pub fn view(&self) -> WizardView {
        WizardView {
            id: self.id,
            step: self.step,
            title: self.title(),
            message: self.message(),
            details: self.details.clone(),
            appointment_types: self.appointment_types.clone(),
            selected_type: self.selected_type.clone(),
            payment_method: self.payment_method,
            payment_methods: PaymentMethod::ALL.to_vec(),
            session: self.session.clone(),
            result_code: self.result_code.as_ref().map(ToString::to_string),
            payment_reference: self.psp_reference.clone(),
            appointment_id: self.appointment_id,
            error: self.error.clone(),
            reconciliation_pending: self.reconciliation_pending,
            busy: self.busy,
        }
    }

    fn message(&self) -> Option<&'static str> {
        match (self.step, self.outcome) {
            (WizardStep::Success, Some(PaymentOutcome::Pending)) => {
                Some("Your appointment is booked. Payment is pending confirmation.")
            }
            (WizardStep::Success, _) => Some("Your appointment has been confirmed."),
            _ => None,
        }
    }
}

/// Serializable snapshot returned to the client after every transition.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub id: Uuid,
    pub step: WizardStep,
    pub title: &'static str,
    pub message: Option<&'static str>,
    pub details: BookingDetails,
    pub appointment_types: Vec<String>,
    pub selected_type: String,
    pub payment_method: PaymentMethod,
    pub payment_methods: Vec<PaymentMethod>,
    pub session: Option<PaymentSession>,
    pub result_code: Option<String>,
    pub payment_reference: Option<String>,
    pub appointment_id: Option<Uuid>,
    pub error: Option<String>,
    pub reconciliation_pending: bool,
    pub busy: bool,
}

#[cfg(test)]
#[path = "wizard_test.rs"]
mod tests;
