mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use mockall::mock;
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentBooking, AppointmentError, AppointmentFilter, AppointmentStore,
    InMemoryAppointmentStore, StoreError,
};
use booking_wizard_cell::*;
use shared_config::InitialBookingStatus;
use shared_models::{AppointmentStatus, ExistingAppointment, SchedulingError};
use shared_utils::test_utils::{monday, time};

use common::*;

mock! {
    pub Store {}

    #[async_trait]
    impl AppointmentStore for Store {
        async fn insert(
            &self,
            booking: AppointmentBooking,
            status: AppointmentStatus,
            now: NaiveDateTime,
        ) -> Result<Appointment, StoreError>;

        async fn get(&self, id: Uuid) -> Result<Appointment, StoreError>;

        async fn compare_and_set_status(
            &self,
            id: Uuid,
            expected: AppointmentStatus,
            new: AppointmentStatus,
            now: NaiveDateTime,
        ) -> Result<Appointment, StoreError>;

        async fn list_for_doctor(
            &self,
            doctor_id: Uuid,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<ExistingAppointment>, StoreError>;

        async fn search(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError>;
    }
}

#[tokio::test]
async fn test_submit_persists_staff_booking_as_approved() {
    let store = InMemoryAppointmentStore::new();
    let provider = doctor();
    let mut wizard = wizard(WizardCapabilities::open(), friday_clock());
    to_patient_form(&mut wizard, provider.clone());
    wizard.fill_patient_form(patient_form()).unwrap();

    let appointment = wizard.submit(&store, InitialBookingStatus::Approved).await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Approved);
    assert_eq!(appointment.booking.doctor_id, provider.doctor_id());
    assert_eq!(appointment.booking.time, time(10, 0));
    assert_eq!(appointment.booking.duration_minutes, 30);
    assert_eq!(appointment.booking.slot_capacity, Some(1));
    assert_eq!(appointment.booking.notes.as_deref(), Some("Recurring headaches"));
    assert_eq!(wizard.step(), WizardStep::Submitted);
    assert_eq!(wizard.submitted(), Some(&appointment));
    assert_eq!(store.get(appointment.id).await.unwrap(), appointment);
}

#[tokio::test]
async fn test_self_service_booking_starts_pending() {
    let store = InMemoryAppointmentStore::new();
    let mut wizard = wizard(WizardCapabilities::open(), friday_clock());
    to_patient_form(&mut wizard, doctor());
    wizard.fill_patient_form(patient_form()).unwrap();

    let appointment = wizard.submit(&store, InitialBookingStatus::Pending).await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn test_submitted_wizard_refuses_further_changes() {
    let store = InMemoryAppointmentStore::new();
    let mut wizard = wizard(WizardCapabilities::open(), friday_clock());
    to_patient_form(&mut wizard, doctor());
    wizard.fill_patient_form(patient_form()).unwrap();
    wizard.submit(&store, InitialBookingStatus::Approved).await.unwrap();

    assert_eq!(wizard.back(), Err(WizardError::AlreadySubmitted));
    assert_eq!(wizard.next(), Err(WizardError::AlreadySubmitted));
    assert_matches!(
        wizard.submit(&store, InitialBookingStatus::Approved).await,
        Err(WizardError::AlreadySubmitted)
    );
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_submit_without_patient_is_a_validation_error() {
    let store = InMemoryAppointmentStore::new();
    let mut wizard = wizard(WizardCapabilities::open(), friday_clock());
    to_patient_form(&mut wizard, doctor());

    let result = wizard.submit(&store, InitialBookingStatus::Approved).await;

    assert_matches!(result, Err(WizardError::Validation(errors)) if errors.contains("patient"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_failed_persistence_keeps_draft_intact() {
    let mut store = MockStore::new();
    store
        .expect_insert()
        .times(1)
        .returning(|_, _, _| Err(StoreError::Unavailable("database offline".to_string())));

    let mut wizard = wizard(WizardCapabilities::open(), friday_clock());
    to_patient_form(&mut wizard, doctor());
    wizard.fill_patient_form(patient_form()).unwrap();
    let before = wizard.draft().clone();

    let result = wizard.submit(&store, InitialBookingStatus::Approved).await;

    assert_matches!(
        result,
        Err(WizardError::Submission(AppointmentError::Persistence(_)))
    );
    assert_eq!(wizard.step(), WizardStep::PatientForm);
    assert_eq!(wizard.draft(), &before);
    assert!(wizard.submitted().is_none());
}

#[tokio::test]
async fn test_competing_wizards_conflict_on_last_seat() {
    let store = InMemoryAppointmentStore::new();
    let provider = doctor();

    let mut first = wizard(WizardCapabilities::open(), friday_clock());
    let mut second = wizard(WizardCapabilities::open(), friday_clock());
    for wizard in [&mut first, &mut second] {
        to_patient_form(wizard, provider.clone());
        wizard.fill_patient_form(patient_form()).unwrap();
    }

    first.submit(&store, InitialBookingStatus::Approved).await.unwrap();
    let result = second.submit(&store, InitialBookingStatus::Approved).await;

    let err = result.unwrap_err();
    assert_matches!(err, WizardError::Submission(AppointmentError::ConcurrencyConflict(_)));
    assert_matches!(SchedulingError::from(err), SchedulingError::ConcurrencyConflict(_));
    assert_eq!(second.step(), WizardStep::PatientForm);
}

#[tokio::test]
async fn test_slot_that_passes_before_submit_is_rejected() {
    let store = InMemoryAppointmentStore::new();
    let clock = Arc::new(shared_utils::test_utils::clock_at(monday(), 9, 50));
    let mut wizard = wizard(WizardCapabilities::open(), clock.clone());
    to_patient_form(&mut wizard, doctor());
    wizard.fill_patient_form(patient_form()).unwrap();

    clock.advance(Duration::minutes(15));
    let result = wizard.submit(&store, InitialBookingStatus::Approved).await;

    assert_matches!(result, Err(WizardError::Validation(errors)) if errors.contains("timeSlot"));
    assert!(store.is_empty().await);
}
