use super::*;
use crate::state::test_helpers;
use serde_json::json;

fn seed_profile(store: &test_helpers::MemoryStore, patient: &PatientSession) {
    store.seed(
        "patients",
        json!({
            "id": "row-1",
            "user_id": patient.patient_id.to_string(),
            "first_name": "Maria",
            "last_name": "Cruz",
            "phone": "+63 917 000 0000",
            "blood_type": null,
        }),
    );
}

#[test]
fn empty_update_is_empty() {
    assert!(ProfileUpdate::default().is_empty());
    assert_eq!(ProfileUpdate::default().to_patch(), json!({}));
}

#[test]
fn patch_holds_only_provided_fields() {
    let update = ProfileUpdate { phone: Some("123".into()), allergies: Some(String::new()), ..Default::default() };
    assert!(!update.is_empty());
    assert_eq!(update.to_patch(), json!({ "phone": "123", "allergies": "" }));
}

#[tokio::test]
async fn get_profile_reads_own_row() {
    let (state, store, _) = test_helpers::test_app_state();
    let patient = test_helpers::test_patient();
    seed_profile(&store, &patient);

    let profile = get_profile(&state, &patient).await.unwrap();
    assert_eq!(profile.first_name.as_deref(), Some("Maria"));
    assert_eq!(profile.blood_type, None);
}

#[tokio::test]
async fn get_profile_missing_is_not_found() {
    let (state, _, _) = test_helpers::test_app_state();
    let err = get_profile(&state, &test_helpers::test_patient()).await.unwrap_err();
    assert!(matches!(err, ProfileError::NotFound));
    assert_eq!(err.error_code(), "E_PROFILE_NOT_FOUND");
}

#[tokio::test]
async fn update_profile_patches_fields() {
    let (state, store, _) = test_helpers::test_app_state();
    let patient = test_helpers::test_patient();
    seed_profile(&store, &patient);

    let update = ProfileUpdate { blood_type: Some("O+".into()), ..Default::default() };
    let profile = update_profile(&state, &patient, update).await.unwrap();
    assert_eq!(profile.blood_type.as_deref(), Some("O+"));
    assert_eq!(profile.last_name.as_deref(), Some("Cruz"));
    assert_eq!(store.rows("patients")[0]["blood_type"], "O+");
}

#[tokio::test]
async fn empty_update_does_not_write() {
    let (state, store, _) = test_helpers::test_app_state();
    let patient = test_helpers::test_patient();
    seed_profile(&store, &patient);
    let before = store.rows("patients");

    let profile = update_profile(&state, &patient, ProfileUpdate::default()).await.unwrap();
    assert_eq!(profile.first_name.as_deref(), Some("Maria"));
    assert_eq!(store.rows("patients"), before);
}

#[tokio::test]
async fn update_for_unknown_patient_is_not_found() {
    let (state, _, _) = test_helpers::test_app_state();
    let update = ProfileUpdate { phone: Some("1".into()), ..Default::default() };
    let err = update_profile(&state, &test_helpers::test_patient(), update).await.unwrap_err();
    assert!(matches!(err, ProfileError::NotFound));
}
