// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{AppointmentMode, AppointmentStatus, ExistingAppointment, SchedulingError};

// ==============================================================================
// BOOKING CHOICES
// ==============================================================================

/// How the patient came to the clinic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    WalkIn,
    Phone,
    Website,
    SocialMedia,
    #[serde(alias = "doctor_referral")]
    Referral,
    Other,
}

impl BookingSource {
    pub fn requires_referral_name(&self) -> bool {
        matches!(self, BookingSource::Referral)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentKind {
    #[serde(alias = "new_patient")]
    New,
    #[serde(alias = "followup", alias = "follow-up")]
    FollowUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalReason {
    Consultation,
    Treatment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeUnit {
    Days,
    Months,
    Years,
}

impl AgeUnit {
    /// Largest age accepted in this unit.
    pub fn max(&self) -> u32 {
        match self {
            AgeUnit::Days => 365,
            AgeUnit::Months => 240,
            AgeUnit::Years => 120,
        }
    }
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeUnit::Days => write!(f, "days"),
            AgeUnit::Months => write!(f, "months"),
            AgeUnit::Years => write!(f, "years"),
        }
    }
}

/// Patient fields as typed into the booking form. Kept as raw input so the
/// form can be re-shown unchanged after a failed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub age: String,
    pub age_unit: AgeUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatientDetails {
    Existing { patient_id: Uuid },
    New(NewPatient),
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A fully populated booking, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentBooking {
    /// `None` for an unassigned placeholder appointment.
    pub doctor_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub mode: AppointmentMode,
    pub duration_minutes: i64,
    /// Concurrent bookings the chosen slot admits; `None` means unlimited.
    pub slot_capacity: Option<u32>,
    pub source: BookingSource,
    pub referral_name: Option<String>,
    pub appointment_type: AppointmentKind,
    pub clinical_reason: ClinicalReason,
    pub patient: PatientDetails,
    pub notes: Option<String>,
}

impl AppointmentBooking {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// True when both bookings compete for the same slot.
    pub fn same_slot(&self, other: &AppointmentBooking) -> bool {
        self.doctor_id.is_some()
            && self.doctor_id == other.doctor_id
            && self.date == other.date
            && self.time == other.time
            && self.mode == other.mode
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    #[serde(flatten)]
    pub booking: AppointmentBooking,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    /// Occupancy view for slot generation. Placeholder appointments have no
    /// doctor and never occupy a doctor's slot.
    pub fn as_existing(&self) -> Option<ExistingAppointment> {
        self.booking.doctor_id.map(|doctor_id| ExistingAppointment {
            doctor_id,
            date: self.booking.date,
            time: self.booking.time,
            mode: self.booking.mode,
            status: self.status,
        })
    }
}

/// Calendar filter used by staff listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub mode: Option<AppointmentMode>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        let booking = &appointment.booking;
        self.doctor_id.map_or(true, |id| booking.doctor_id == Some(id))
            && self.status.map_or(true, |status| appointment.status == status)
            && self.mode.map_or(true, |mode| booking.mode == mode)
            && self.from_date.map_or(true, |from| booking.date >= from)
            && self.to_date.map_or(true, |to| booking.date <= to)
    }

    /// Matching appointments in calendar order.
    pub fn apply<'a, I>(&self, appointments: I) -> Vec<&'a Appointment>
    where
        I: IntoIterator<Item = &'a Appointment>,
    {
        let mut matched: Vec<&Appointment> = appointments
            .into_iter()
            .filter(|appointment| self.matches(appointment))
            .collect();
        matched.sort_by_key(|appointment| (appointment.booking.starts_at(), appointment.created_at));
        matched
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(Uuid),

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment was changed concurrently: {0}")]
    ConcurrencyConflict(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<AppointmentError> for SchedulingError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::IllegalTransition { from, to } => {
                SchedulingError::IllegalTransition { from, to }
            }
            AppointmentError::ConcurrencyConflict(msg) => SchedulingError::ConcurrencyConflict(msg),
            AppointmentError::NotFound(id) => {
                SchedulingError::Persistence(format!("appointment {} not found", id))
            }
            AppointmentError::Persistence(msg) => SchedulingError::Persistence(msg),
        }
    }
}
