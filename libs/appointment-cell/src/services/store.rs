// libs/appointment-cell/src/services/store.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_models::{AppointmentStatus, ExistingAppointment};

use crate::models::{Appointment, AppointmentBooking, AppointmentError, AppointmentFilter};
use crate::services::lifecycle::is_legal_transition;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Appointment not found: {0}")]
    NotFound(Uuid),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppointmentError::NotFound(id),
            StoreError::Conflict(msg) => AppointmentError::ConcurrencyConflict(msg),
            StoreError::IllegalTransition { from, to } => {
                AppointmentError::IllegalTransition { from, to }
            }
            StoreError::Unavailable(msg) => AppointmentError::Persistence(msg),
        }
    }
}

/// Persistence collaborator. Implementations must make each call atomic,
/// reject bookings into slots that are already at capacity, and re-check the
/// status legality table on every status write.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(
        &self,
        booking: AppointmentBooking,
        status: AppointmentStatus,
        now: NaiveDateTime,
    ) -> Result<Appointment, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Appointment, StoreError>;

    /// Set `new` only if the stored status is still `expected`.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new: AppointmentStatus,
        now: NaiveDateTime,
    ) -> Result<Appointment, StoreError>;

    /// Occupancy snapshot for one doctor over an inclusive date range.
    async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExistingAppointment>, StoreError>;

    async fn search(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.appointments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.appointments.read().await.is_empty()
    }
}

fn occupied_count<'a, I>(appointments: I, booking: &AppointmentBooking, exclude: Option<Uuid>) -> u32
where
    I: IntoIterator<Item = &'a Appointment>,
{
    appointments
        .into_iter()
        .filter(|existing| Some(existing.id) != exclude)
        .filter(|existing| existing.status.consumes_capacity())
        .filter(|existing| existing.booking.same_slot(booking))
        .count() as u32
}

fn slot_taken(
    appointments: &HashMap<Uuid, Appointment>,
    booking: &AppointmentBooking,
    exclude: Option<Uuid>,
) -> bool {
    if booking.doctor_id.is_none() {
        return false;
    }
    let capacity = booking.slot_capacity.unwrap_or(u32::MAX);
    occupied_count(appointments.values(), booking, exclude) >= capacity
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    #[instrument(skip(self, booking), fields(doctor_id = ?booking.doctor_id, date = %booking.date, time = %booking.time))]
    async fn insert(
        &self,
        booking: AppointmentBooking,
        status: AppointmentStatus,
        now: NaiveDateTime,
    ) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().await;

        if status.consumes_capacity() && slot_taken(&appointments, &booking, None) {
            warn!("Slot {} {} ({}) is already taken", booking.date, booking.time, booking.mode);
            return Err(StoreError::Conflict(format!(
                "slot {} {} ({}) is no longer available",
                booking.date, booking.time, booking.mode
            )));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            booking,
            status,
            created_at: now,
            updated_at: now,
        };
        appointments.insert(appointment.id, appointment.clone());

        info!("Appointment {} stored with status {}", appointment.id, appointment.status);
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Appointment, StoreError> {
        self.appointments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    #[instrument(skip(self))]
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new: AppointmentStatus,
        now: NaiveDateTime,
    ) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().await;

        let current = appointments.get(&id).ok_or(StoreError::NotFound(id))?;

        if current.status != expected {
            warn!(
                "Status of {} is {} but caller expected {}",
                id, current.status, expected
            );
            return Err(StoreError::Conflict(format!(
                "appointment {} is now {}, expected {}",
                id, current.status, expected
            )));
        }

        if !is_legal_transition(expected, new) {
            return Err(StoreError::IllegalTransition { from: expected, to: new });
        }

        // A restored appointment re-occupies its slot, which may have been
        // rebooked while it was rejected.
        if !expected.consumes_capacity()
            && new.consumes_capacity()
            && slot_taken(&appointments, &current.booking, Some(id))
        {
            return Err(StoreError::Conflict(format!(
                "slot of appointment {} was rebooked while it was {}",
                id, expected
            )));
        }

        let appointment = appointments.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        appointment.status = new;
        appointment.updated_at = now;

        debug!("Appointment {} status set to {}", id, new);
        Ok(appointment.clone())
    }

    async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExistingAppointment>, StoreError> {
        let filter = AppointmentFilter {
            doctor_id: Some(doctor_id),
            from_date: Some(from),
            to_date: Some(to),
            ..AppointmentFilter::default()
        };

        let appointments = self.appointments.read().await;
        Ok(filter
            .apply(appointments.values())
            .into_iter()
            .filter_map(Appointment::as_existing)
            .collect())
    }

    async fn search(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        Ok(filter
            .apply(appointments.values())
            .into_iter()
            .cloned()
            .collect())
    }
}
