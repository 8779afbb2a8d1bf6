#![allow(dead_code)]

use std::sync::Arc;

use chrono::Weekday;
use uuid::Uuid;

use appointment_cell::{AgeUnit, AppointmentKind, BookingSource, ClinicalReason, NewPatient, PatientDetails};
use booking_wizard_cell::{BookingWizard, PatientForm, WizardCapabilities};
use doctor_cell::{AvailabilityWindow, DoctorAvailability, Provider, SlotGenerator};
use shared_models::AppointmentMode;
use shared_utils::test_utils::{clock_at, date, monday, time, TestConfig};
use shared_utils::FixedClock;

/// Friday before [`monday`], 09:00.
pub fn friday_clock() -> Arc<FixedClock> {
    Arc::new(clock_at(date(2026, 10, 16), 9, 0))
}

/// Monday clinic 10:00-12:00 in 30 minute slots, video 14:00-15:00.
pub fn doctor() -> Provider {
    let clinic = AvailabilityWindow {
        day: Weekday::Mon,
        closed: false,
        start_time: time(10, 0),
        end_time: time(12, 0),
        slot_duration_minutes: 30,
        is_clinic_time: true,
        is_video_time: false,
        capacity: None,
    };
    let video = AvailabilityWindow {
        start_time: time(14, 0),
        end_time: time(15, 0),
        is_clinic_time: false,
        is_video_time: true,
        ..clinic.clone()
    };

    Provider::Doctor(
        DoctorAvailability::new(Uuid::new_v4())
            .with_window(clinic)
            .with_window(video),
    )
}

pub fn wizard(capabilities: WizardCapabilities, clock: Arc<FixedClock>) -> BookingWizard {
    let generator = Arc::new(SlotGenerator::new(&TestConfig::scheduling()));
    BookingWizard::new(capabilities, generator, clock)
}

pub fn new_patient() -> NewPatient {
    NewPatient {
        first_name: "Amara".to_string(),
        last_name: "Nwosu".to_string(),
        phone: "0803123456".to_string(),
        email: "amara.nwosu@example.com".to_string(),
        age: "34".to_string(),
        age_unit: AgeUnit::Years,
    }
}

pub fn patient_form() -> PatientForm {
    PatientForm {
        patient: PatientDetails::New(new_patient()),
        referral_name: None,
        notes: Some("Recurring headaches".to_string()),
    }
}

/// Walks a wizard up to the calendar step.
pub fn to_calendar(wizard: &mut BookingWizard, provider: Provider) {
    wizard.choose_source(BookingSource::WalkIn).unwrap();
    wizard.choose_appointment_type(AppointmentKind::New).unwrap();
    wizard
        .choose_clinical_reason(ClinicalReason::Consultation)
        .unwrap();
    wizard.choose_doctor(provider).unwrap();
}

/// Walks a wizard up to the patient form with Monday 10:00 clinic picked.
pub fn to_patient_form(wizard: &mut BookingWizard, provider: Provider) {
    to_calendar(wizard, provider);
    wizard
        .select_date(monday(), AppointmentMode::Clinic, &[])
        .unwrap();
    wizard.select_slot(time(10, 0)).unwrap();
}
