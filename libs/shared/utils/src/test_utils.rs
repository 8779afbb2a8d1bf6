use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use shared_config::SchedulingConfig;
use shared_models::{AppointmentMode, AppointmentStatus, ExistingAppointment};

use crate::clock::FixedClock;

/// Monday 19 October 2026, the anchor date most fixtures are built around.
pub fn monday() -> NaiveDate {
    date(2026, 10, 19)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid fixture time")
}

pub fn clock_at(date: NaiveDate, hour: u32, minute: u32) -> FixedClock {
    FixedClock::at(date, time(hour, minute))
}

pub struct TestConfig;

impl TestConfig {
    pub fn scheduling() -> SchedulingConfig {
        SchedulingConfig::default()
    }
}

pub struct TestAppointments;

impl TestAppointments {
    pub fn booked(
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        mode: AppointmentMode,
        status: AppointmentStatus,
    ) -> ExistingAppointment {
        ExistingAppointment {
            doctor_id,
            date,
            time,
            mode,
            status,
        }
    }

    pub fn approved_clinic(doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> ExistingAppointment {
        Self::booked(doctor_id, date, time, AppointmentMode::Clinic, AppointmentStatus::Approved)
    }
}
