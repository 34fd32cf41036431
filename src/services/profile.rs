//! Patient profile read and partial update.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::ErrorCode;
use crate::services::session::PatientSession;
use crate::state::AppState;
use crate::store::{Filter, Query, StoreError};

const PATIENTS_TABLE: &str = "patients";

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("patient profile not found")]
    NotFound,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("malformed profile row: {0}")]
    Malformed(String),
}

impl ErrorCode for ProfileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "E_PROFILE_NOT_FOUND",
            Self::Store(e) => e.error_code(),
            Self::Malformed(_) => "E_PROFILE_MALFORMED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.retryable())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub medical_conditions: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub medical_conditions: Option<String>,
}

impl ProfileUpdate {
    fn fields(&self) -> [(&'static str, Option<&String>); 13] {
        [
            ("first_name", self.first_name.as_ref()),
            ("last_name", self.last_name.as_ref()),
            ("email", self.email.as_ref()),
            ("phone", self.phone.as_ref()),
            ("date_of_birth", self.date_of_birth.as_ref()),
            ("gender", self.gender.as_ref()),
            ("address", self.address.as_ref()),
            ("emergency_contact_name", self.emergency_contact_name.as_ref()),
            ("emergency_contact_phone", self.emergency_contact_phone.as_ref()),
            ("blood_type", self.blood_type.as_ref()),
            ("allergies", self.allergies.as_ref()),
            ("medications", self.medications.as_ref()),
            ("medical_conditions", self.medical_conditions.as_ref()),
        ]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
    }

    /// JSON object holding only the provided fields.
    #[must_use]
    pub fn to_patch(&self) -> Value {
        let patch: Map<String, Value> = self
            .fields()
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), Value::String(v.clone()))))
            .collect();
        Value::Object(patch)
    }
}

fn parse_profile(row: Value) -> Result<PatientProfile, ProfileError> {
    serde_json::from_value(row).map_err(|e| ProfileError::Malformed(e.to_string()))
}

fn owner_filter(patient: &PatientSession) -> Filter {
    Filter::eq("user_id", patient.patient_id)
}

/// Load the caller's profile.
///
/// # Errors
///
/// Returns `NotFound` when no row exists, or a store error.
pub async fn get_profile(state: &AppState, patient: &PatientSession) -> Result<PatientProfile, ProfileError> {
    let query = Query::new().filter(owner_filter(patient)).limit(1);
    let row = state
        .store
        .select(PATIENTS_TABLE, &query, Some(&patient.access_token))
        .await?
        .into_iter()
        .next()
        .ok_or(ProfileError::NotFound)?;
    parse_profile(row)
}

/// Patch the provided fields and return the updated profile. An empty
/// update returns the current profile without writing.
///
/// # Errors
///
/// Returns `NotFound` when no row matched, or a store error.
pub async fn update_profile(
    state: &AppState,
    patient: &PatientSession,
    update: ProfileUpdate,
) -> Result<PatientProfile, ProfileError> {
    if update.is_empty() {
        return get_profile(state, patient).await;
    }

    let rows = state
        .store
        .update(PATIENTS_TABLE, &[owner_filter(patient)], update.to_patch(), Some(&patient.access_token))
        .await?;
    let row = rows.into_iter().next().ok_or(ProfileError::NotFound)?;
    info!(patient_id = %patient.patient_id, "profile updated");
    parse_profile(row)
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
