// libs/booking-wizard-cell/src/models.rs
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::{
    AppointmentBooking, AppointmentError, AppointmentKind, BookingSource, ClinicalReason,
    PatientDetails, StoreError,
};
use doctor_cell::{Provider, TimeSlot};
use shared_models::{AppointmentMode, SchedulingError, ValidationErrors};

// ==============================================================================
// STEPS AND FIELD OWNERSHIP
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Source,
    ApptType,
    ClinicalReason,
    Doctor,
    Calendar,
    PatientForm,
    Submitted,
}

impl WizardStep {
    pub const ORDER: [WizardStep; 7] = [
        WizardStep::Source,
        WizardStep::ApptType,
        WizardStep::ClinicalReason,
        WizardStep::Doctor,
        WizardStep::Calendar,
        WizardStep::PatientForm,
        WizardStep::Submitted,
    ];

    /// Draft fields this step fills in, and therefore clears on the way back.
    pub fn owned_fields(&self) -> &'static [DraftField] {
        match self {
            WizardStep::Source => &[DraftField::Source],
            WizardStep::ApptType => &[DraftField::AppointmentType],
            WizardStep::ClinicalReason => &[DraftField::ClinicalReason],
            WizardStep::Doctor => &[DraftField::Doctor],
            WizardStep::Calendar => &[DraftField::Date, DraftField::Mode, DraftField::TimeSlot],
            WizardStep::PatientForm => &[DraftField::Patient, DraftField::Notes],
            WizardStep::Submitted => &[],
        }
    }

    pub fn next(&self) -> Option<WizardStep> {
        let index = Self::ORDER.iter().position(|step| step == self)?;
        Self::ORDER.get(index + 1).copied()
    }

    pub fn previous(&self) -> Option<WizardStep> {
        let index = Self::ORDER.iter().position(|step| step == self)?;
        index.checked_sub(1).map(|prev| Self::ORDER[prev])
    }

    /// This step and every step after it.
    pub fn and_later(&self) -> impl Iterator<Item = WizardStep> + '_ {
        Self::ORDER.into_iter().filter(move |step| step >= self)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStep::Source => write!(f, "source"),
            WizardStep::ApptType => write!(f, "appointment type"),
            WizardStep::ClinicalReason => write!(f, "clinical reason"),
            WizardStep::Doctor => write!(f, "doctor"),
            WizardStep::Calendar => write!(f, "calendar"),
            WizardStep::PatientForm => write!(f, "patient form"),
            WizardStep::Submitted => write!(f, "submitted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    Source,
    AppointmentType,
    ClinicalReason,
    Doctor,
    Date,
    Mode,
    TimeSlot,
    Patient,
    Notes,
}

impl DraftField {
    /// Key used in field-keyed validation errors.
    pub fn key(&self) -> &'static str {
        match self {
            DraftField::Source => "source",
            DraftField::AppointmentType => "appointmentType",
            DraftField::ClinicalReason => "clinicalReason",
            DraftField::Doctor => "doctor",
            DraftField::Date => "date",
            DraftField::Mode => "mode",
            DraftField::TimeSlot => "timeSlot",
            DraftField::Patient => "patient",
            DraftField::Notes => "notes",
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, DraftField::Notes)
    }
}

// ==============================================================================
// DRAFT
// ==============================================================================

/// In-progress booking. Owned by exactly one wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub source: Option<BookingSource>,
    pub appointment_type: Option<AppointmentKind>,
    pub clinical_reason: Option<ClinicalReason>,
    pub doctor: Option<Provider>,
    pub date: Option<NaiveDate>,
    pub mode: Option<AppointmentMode>,
    pub time_slot: Option<TimeSlot>,
    pub patient: Option<PatientDetails>,
    /// Travels with the patient details.
    pub referral_name: Option<String>,
    pub notes: Option<String>,
}

impl BookingDraft {
    pub fn is_set(&self, field: DraftField) -> bool {
        match field {
            DraftField::Source => self.source.is_some(),
            DraftField::AppointmentType => self.appointment_type.is_some(),
            DraftField::ClinicalReason => self.clinical_reason.is_some(),
            DraftField::Doctor => self.doctor.is_some(),
            DraftField::Date => self.date.is_some(),
            DraftField::Mode => self.mode.is_some(),
            DraftField::TimeSlot => self.time_slot.is_some(),
            DraftField::Patient => self.patient.is_some(),
            DraftField::Notes => self.notes.is_some(),
        }
    }

    pub fn clear(&mut self, field: DraftField) {
        match field {
            DraftField::Source => self.source = None,
            DraftField::AppointmentType => self.appointment_type = None,
            DraftField::ClinicalReason => self.clinical_reason = None,
            DraftField::Doctor => self.doctor = None,
            DraftField::Date => self.date = None,
            DraftField::Mode => self.mode = None,
            DraftField::TimeSlot => self.time_slot = None,
            DraftField::Patient => {
                self.patient = None;
                self.referral_name = None;
            }
            DraftField::Notes => self.notes = None,
        }
    }

    /// Fields currently holding a value, in step order.
    pub fn set_fields(&self) -> Vec<DraftField> {
        WizardStep::ORDER
            .iter()
            .flat_map(|step| step.owned_fields().iter().copied())
            .filter(|field| self.is_set(*field))
            .collect()
    }

    /// Assemble the persisted booking. Reports every missing field at once.
    pub fn to_booking(&self) -> Result<AppointmentBooking, ValidationErrors> {
        match (
            self.source,
            self.appointment_type,
            self.clinical_reason,
            &self.doctor,
            self.date,
            self.mode,
            &self.time_slot,
            &self.patient,
        ) {
            (
                Some(source),
                Some(appointment_type),
                Some(clinical_reason),
                Some(doctor),
                Some(date),
                Some(mode),
                Some(slot),
                Some(patient),
            ) => Ok(AppointmentBooking {
                doctor_id: doctor.doctor_id(),
                date,
                time: slot.time,
                mode,
                duration_minutes: slot.duration_minutes,
                slot_capacity: slot.capacity,
                source,
                referral_name: self.referral_name.clone(),
                appointment_type,
                clinical_reason,
                patient: patient.clone(),
                notes: self.notes.clone(),
            }),
            _ => {
                let mut errors = ValidationErrors::new();
                for field in WizardStep::ORDER.iter().flat_map(|step| step.owned_fields()) {
                    if !field.is_optional() && !self.is_set(*field) {
                        errors.add(field.key(), "This field is required");
                    }
                }
                Err(errors)
            }
        }
    }
}

/// Everything the patient-details step collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    pub patient: PatientDetails,
    #[serde(default)]
    pub referral_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// What the caller is allowed to change. A doctor's own session is pinned to
/// that doctor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardCapabilities {
    pinned_provider: Option<Provider>,
}

impl WizardCapabilities {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn pinned_to(provider: Provider) -> Self {
        Self {
            pinned_provider: Some(provider),
        }
    }

    pub fn pinned_provider(&self) -> Option<&Provider> {
        self.pinned_provider.as_ref()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned_provider.is_some()
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("{operation} is not available at the {step} step")]
    WrongStep {
        operation: &'static str,
        step: WizardStep,
    },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{date} is outside the booking window {min} ..= {max}")]
    OutsideBookingWindow {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("This booking is pinned to another doctor")]
    DoctorPinned,

    #[error("Already at the first step")]
    NoPreviousStep,

    #[error("Booking was already submitted")]
    AlreadySubmitted,

    #[error("Submission failed: {0}")]
    Submission(AppointmentError),
}

impl From<ValidationErrors> for WizardError {
    fn from(errors: ValidationErrors) -> Self {
        WizardError::Validation(errors)
    }
}

impl From<AppointmentError> for WizardError {
    fn from(err: AppointmentError) -> Self {
        WizardError::Submission(err)
    }
}

impl From<StoreError> for WizardError {
    fn from(err: StoreError) -> Self {
        WizardError::Submission(err.into())
    }
}

impl From<WizardError> for SchedulingError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Validation(errors) => SchedulingError::Validation(errors),
            WizardError::OutsideBookingWindow { .. } => {
                SchedulingError::Validation(ValidationErrors::single("date", err.to_string()))
            }
            WizardError::SlotUnavailable(_) => {
                SchedulingError::Validation(ValidationErrors::single("timeSlot", err.to_string()))
            }
            WizardError::DoctorPinned => {
                SchedulingError::Validation(ValidationErrors::single("doctor", err.to_string()))
            }
            WizardError::WrongStep { .. }
            | WizardError::NoPreviousStep
            | WizardError::AlreadySubmitted => {
                SchedulingError::Validation(ValidationErrors::single("step", err.to_string()))
            }
            WizardError::Submission(inner) => inner.into(),
        }
    }
}
