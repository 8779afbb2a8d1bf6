// =====================================================================================
// PATIENT FORM VALIDATION
// =====================================================================================

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use appointment_cell::{AgeUnit, BookingSource, NewPatient, PatientDetails};
use shared_models::ValidationErrors;

use crate::models::{BookingDraft, PatientForm};

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"));

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Default, Clone, Copy)]
pub struct PatientFormValidator;

impl PatientFormValidator {
    pub fn new() -> Self {
        Self
    }

    /// Checks the patient-details step on its own.
    #[instrument(skip(self, form))]
    pub fn validate_form(&self, form: &PatientForm, source: Option<BookingSource>) -> ValidationErrors {
        let mut errors = self.validate_patient(&form.patient);
        self.check_referral(form.referral_name.as_deref(), source, &mut errors);

        debug!("Patient form produced {} validation errors", errors.len());
        errors
    }

    /// Whole-draft check run again right before submission.
    #[instrument(skip(self, draft))]
    pub fn validate_draft(&self, draft: &BookingDraft) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if draft.clinical_reason.is_none() {
            errors.add("clinicalReason", "Please select a clinical reason");
        }
        if draft.mode.is_none() {
            errors.add("mode", "Please select an appointment mode");
        }
        if let Err(missing) = draft.to_booking() {
            errors.merge(missing);
        }
        if let Some(patient) = &draft.patient {
            errors.merge(self.validate_patient(patient));
        }
        self.check_referral(draft.referral_name.as_deref(), draft.source, &mut errors);

        debug!("Draft produced {} validation errors", errors.len());
        errors
    }

    pub fn validate_patient(&self, patient: &PatientDetails) -> ValidationErrors {
        match patient {
            PatientDetails::Existing { .. } => ValidationErrors::new(),
            PatientDetails::New(details) => self.validate_new_patient(details),
        }
    }

    fn validate_new_patient(&self, patient: &NewPatient) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if patient.first_name.trim().is_empty() {
            errors.add("firstName", "First name is required");
        }
        if patient.last_name.trim().is_empty() {
            errors.add("lastName", "Last name is required");
        }

        let phone = patient.phone.trim();
        if phone.is_empty() {
            errors.add("phone", "Phone number is required");
        } else if !self.validate_phone(phone) {
            errors.add("phone", "Phone number must be exactly 10 digits");
        }

        let email = patient.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !self.validate_email(email) {
            errors.add("email", "Please enter a valid email address");
        }

        if let Err(message) = self.validate_age(&patient.age, patient.age_unit) {
            errors.add("age", message);
        }

        errors
    }

    pub fn validate_phone(&self, phone: &str) -> bool {
        PHONE_PATTERN.is_match(phone)
    }

    pub fn validate_email(&self, email: &str) -> bool {
        EMAIL_PATTERN.is_match(email) && email.len() <= MAX_EMAIL_LENGTH
    }

    /// Parses a typed age and bounds it by its unit.
    pub fn validate_age(&self, age: &str, unit: AgeUnit) -> Result<u32, String> {
        let age = age.trim();
        if age.is_empty() {
            return Err("Age is required".to_string());
        }

        if !age.bytes().all(|b| b.is_ascii_digit()) {
            return Err("Age must be a whole number".to_string());
        }

        let value: u32 = age
            .parse()
            .map_err(|_| "Age must be a whole number".to_string())?;

        if value > unit.max() {
            return Err(format!("Age cannot exceed {} {}", unit.max(), unit));
        }
        Ok(value)
    }

    fn check_referral(
        &self,
        referral_name: Option<&str>,
        source: Option<BookingSource>,
        errors: &mut ValidationErrors,
    ) {
        let required = source.is_some_and(|source| source.requires_referral_name());
        let given = referral_name.is_some_and(|name| !name.trim().is_empty());
        if required && !given {
            errors.add("referralName", "Referral name is required for referred patients");
        }
    }
}
