mod common;

use assert_matches::assert_matches;
use uuid::Uuid;

use appointment_cell::{AgeUnit, AppointmentKind, BookingSource, ClinicalReason, PatientDetails};
use booking_wizard_cell::*;
use shared_models::SchedulingError;

use common::*;

fn form_with(patient: appointment_cell::NewPatient) -> PatientForm {
    PatientForm {
        patient: PatientDetails::New(patient),
        referral_name: None,
        notes: None,
    }
}

#[test]
fn test_valid_new_patient_passes() {
    let validator = PatientFormValidator::new();

    let errors = validator.validate_form(&patient_form(), Some(BookingSource::WalkIn));

    assert!(errors.is_empty(), "{}", errors);
}

#[test]
fn test_age_beyond_unit_ceiling_is_rejected() {
    let validator = PatientFormValidator::new();
    let mut patient = new_patient();
    patient.age = "450".to_string();
    patient.age_unit = AgeUnit::Months;

    let errors = validator.validate_form(&form_with(patient.clone()), None);
    assert_eq!(errors.get("age"), Some("Age cannot exceed 240 months"));

    patient.age = "45".to_string();
    assert!(validator.validate_form(&form_with(patient), None).is_empty());
}

#[test]
fn test_each_invalid_field_is_keyed() {
    let validator = PatientFormValidator::new();
    let mut patient = new_patient();
    patient.first_name = "  ".to_string();
    patient.last_name = String::new();
    patient.phone = "080-312-3456".to_string();
    patient.email = "amara@localhost".to_string();
    patient.age = "ten".to_string();

    let errors = validator.validate_form(&form_with(patient), None);

    for field in ["firstName", "lastName", "phone", "email", "age"] {
        assert!(errors.contains(field), "missing error for {}", field);
    }
    assert_eq!(errors.len(), 5);
}

#[test]
fn test_referral_source_requires_referral_name() {
    let validator = PatientFormValidator::new();
    let mut form = patient_form();

    let errors = validator.validate_form(&form, Some(BookingSource::Referral));
    assert!(errors.contains("referralName"));

    form.referral_name = Some("Dr. Bello".to_string());
    assert!(validator.validate_form(&form, Some(BookingSource::Referral)).is_empty());
    assert!(validator.validate_form(&patient_form(), Some(BookingSource::Website)).is_empty());
}

#[test]
fn test_existing_patient_skips_new_patient_checks() {
    let validator = PatientFormValidator::new();
    let form = PatientForm {
        patient: PatientDetails::Existing { patient_id: Uuid::new_v4() },
        referral_name: None,
        notes: None,
    };

    assert!(validator.validate_form(&form, Some(BookingSource::Phone)).is_empty());
}

#[test]
fn test_draft_validation_reports_missing_choices() {
    let validator = PatientFormValidator::new();
    let draft = BookingDraft {
        source: Some(BookingSource::Referral),
        appointment_type: Some(AppointmentKind::New),
        patient: Some(PatientDetails::Existing { patient_id: Uuid::new_v4() }),
        ..BookingDraft::default()
    };

    let errors = validator.validate_draft(&draft);

    assert_eq!(errors.get("clinicalReason"), Some("Please select a clinical reason"));
    assert_eq!(errors.get("mode"), Some("Please select an appointment mode"));
    assert!(errors.contains("referralName"));
    assert!(errors.contains("timeSlot"));
    assert!(!errors.contains("patient"));
}

#[test]
fn test_invalid_form_is_not_stored() {
    let mut wizard = wizard(WizardCapabilities::open(), friday_clock());
    to_patient_form(&mut wizard, doctor());
    let mut patient = new_patient();
    patient.phone = "12345".to_string();

    let result = wizard.fill_patient_form(form_with(patient));

    assert_matches!(result, Err(WizardError::Validation(ref errors)) if errors.contains("phone"));
    assert!(wizard.draft().patient.is_none());
    assert_eq!(wizard.step(), WizardStep::PatientForm);

    let scheduling: SchedulingError = result.unwrap_err().into();
    assert_matches!(scheduling, SchedulingError::Validation(_));
}

#[test]
fn test_clinical_reason_survives_patient_form_errors() {
    let mut wizard = wizard(WizardCapabilities::open(), friday_clock());
    to_patient_form(&mut wizard, doctor());

    let _ = wizard.fill_patient_form(form_with(appointment_cell::NewPatient {
        email: "not-an-email".to_string(),
        ..new_patient()
    }));

    assert_eq!(wizard.draft().clinical_reason, Some(ClinicalReason::Consultation));
}

#[test]
fn test_phone_and_age_accept_only_ascii_digits() {
    let validator = PatientFormValidator::new();
    let mut patient = new_patient();
    patient.phone = "٠١٢٣٤٥٦٧٨٩".to_string();
    patient.age = "+45".to_string();

    let errors = validator.validate_form(&form_with(patient), None);

    assert_eq!(errors.get("phone"), Some("Phone number must be exactly 10 digits"));
    assert_eq!(errors.get("age"), Some("Age must be a whole number"));
}
