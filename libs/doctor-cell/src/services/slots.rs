// libs/doctor-cell/src/services/slots.rs

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use shared_config::SchedulingConfig;
use shared_models::{AppointmentMode, ExistingAppointment};

use crate::models::{AvailabilityWindow, DoctorAvailability, Provider, TimeSlot};
use crate::services::availability::AvailabilityService;
use crate::services::buffer::{is_within_booking_window, BufferWindowService};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Expands availability into bookable slots. Stateless apart from
/// configuration, so one instance can serve any number of sessions.
pub struct SlotGenerator {
    availability: AvailabilityService,
    buffer: BufferWindowService,
    no_doctor_slot_minutes: i64,
}

impl SlotGenerator {
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            availability: AvailabilityService::new(config),
            buffer: BufferWindowService::new(config),
            no_doctor_slot_minutes: config.no_doctor_slot_minutes,
        }
    }

    pub fn buffer(&self) -> &BufferWindowService {
        &self.buffer
    }

    pub fn availability(&self) -> &AvailabilityService {
        &self.availability
    }

    /// Slots offered by `provider` on `date` for `mode`, ascending and unique
    /// by time. Full slots are kept and flagged. Past filtering is left to
    /// the caller via [`TimeSlot::is_selectable`].
    #[instrument(skip(self, provider, existing_appointments), fields(doctor_id = ?provider.doctor_id()))]
    pub fn generate_slots(
        &self,
        provider: &Provider,
        date: NaiveDate,
        today: NaiveDate,
        existing_appointments: &[ExistingAppointment],
        mode: AppointmentMode,
    ) -> Vec<TimeSlot> {
        let range = self.buffer.booking_range(provider, today);
        if !is_within_booking_window(date, &range) {
            debug!("{} is outside booking range {} ..= {}", date, range.min, range.max);
            return Vec::new();
        }

        let slots = match provider {
            Provider::NoDoctor => self.no_doctor_slots(mode),
            Provider::Doctor(availability) => {
                self.doctor_slots(availability, date, existing_appointments, mode)
            }
        };

        debug!("Generated {} slots for {} ({})", slots.len(), date, mode);
        slots
    }

    fn doctor_slots(
        &self,
        availability: &DoctorAvailability,
        date: NaiveDate,
        existing_appointments: &[ExistingAppointment],
        mode: AppointmentMode,
    ) -> Vec<TimeSlot> {
        let windows = self.availability.resolve_windows(availability, date, mode);
        let mut by_time: BTreeMap<NaiveTime, TimeSlot> = BTreeMap::new();

        for window in windows {
            if let Some(issue) = self.availability.window_issue(window) {
                warn!(
                    "Skipping window for doctor {}: {}",
                    availability.doctor_id, issue
                );
                continue;
            }

            let capacity = self.availability.effective_capacity(window);

            for time in window_start_times(window) {
                if by_time.contains_key(&time) {
                    warn!(
                        "Doctor {} has overlapping {} windows on {}, keeping first slot at {}",
                        availability.doctor_id, mode, window.day, time
                    );
                    continue;
                }

                let booked = count_booked(
                    existing_appointments,
                    availability.doctor_id,
                    date,
                    time,
                    mode,
                );

                by_time.insert(
                    time,
                    TimeSlot {
                        time,
                        label: slot_label(time),
                        full: booked >= capacity,
                        mode,
                        duration_minutes: window.slot_duration_minutes,
                        capacity: Some(capacity),
                        booked,
                    },
                );
            }
        }

        by_time.into_values().collect()
    }

    fn no_doctor_slots(&self, mode: AppointmentMode) -> Vec<TimeSlot> {
        let step = self.no_doctor_slot_minutes.max(1) * 60;

        (0..SECONDS_PER_DAY)
            .step_by(step as usize)
            .filter(|start| start + step <= SECONDS_PER_DAY)
            .filter_map(|start| NaiveTime::from_num_seconds_from_midnight_opt(start as u32, 0))
            .map(|time| TimeSlot {
                time,
                label: slot_label(time),
                full: false,
                mode,
                duration_minutes: self.no_doctor_slot_minutes.max(1),
                capacity: None,
                booked: 0,
            })
            .collect()
    }
}

/// Start times of every full-length slot in a well-formed window.
/// A trailing remainder shorter than the slot duration is dropped.
fn window_start_times(window: &AvailabilityWindow) -> Vec<NaiveTime> {
    let start = i64::from(window.start_time.num_seconds_from_midnight());
    let end = i64::from(window.end_time.num_seconds_from_midnight());
    let mut times = Vec::new();
    let Some(step) = window.slot_duration_minutes.checked_mul(60).filter(|step| *step > 0) else {
        return times;
    };

    let mut cursor = start;
    while let Some(slot_end) = cursor.checked_add(step) {
        if slot_end > end {
            break;
        }
        if let Some(time) = u32::try_from(cursor)
            .ok()
            .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0))
        {
            times.push(time);
        }
        cursor = slot_end;
    }
    times
}

fn count_booked(
    existing_appointments: &[ExistingAppointment],
    doctor_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
    mode: AppointmentMode,
) -> u32 {
    existing_appointments
        .iter()
        .filter(|appointment| appointment.occupies(doctor_id, date, time, mode))
        .count() as u32
}

pub fn slot_label(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%-I:%M %p").to_string()
    } else {
        time.format("%-I:%M:%S %p").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_use_twelve_hour_clock() {
        assert_eq!(slot_label(NaiveTime::from_hms_opt(9, 0, 0).unwrap()), "9:00 AM");
        assert_eq!(slot_label(NaiveTime::from_hms_opt(13, 30, 0).unwrap()), "1:30 PM");
        assert_eq!(slot_label(NaiveTime::from_hms_opt(0, 15, 0).unwrap()), "12:15 AM");
    }
}
