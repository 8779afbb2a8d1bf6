// libs/doctor-cell/src/services/buffer.rs

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use shared_config::SchedulingConfig;

use crate::models::{BookingRange, DoctorAvailability, Provider};

pub struct BufferWindowService {
    default_end_buffer_days: i64,
    no_doctor_window_days: i64,
}

impl BufferWindowService {
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            default_end_buffer_days: config.default_end_buffer_days,
            no_doctor_window_days: config.no_doctor_window_days,
        }
    }

    /// Inclusive `[today + start buffer, today + end buffer]` for the provider.
    pub fn booking_range(&self, provider: &Provider, today: NaiveDate) -> BookingRange {
        match provider {
            Provider::NoDoctor => BookingRange {
                min: today,
                max: add_days(today, self.no_doctor_window_days),
            },
            Provider::Doctor(availability) => self.doctor_range(availability, today),
        }
    }

    fn doctor_range(&self, availability: &DoctorAvailability, today: NaiveDate) -> BookingRange {
        let start_days = clamp_buffer(
            availability.start_buffer_days,
            "start_buffer_days",
            availability,
        );
        let end_days = clamp_buffer(
            availability
                .end_buffer_days
                .unwrap_or(self.default_end_buffer_days),
            "end_buffer_days",
            availability,
        );

        let range = BookingRange {
            min: add_days(today, start_days),
            max: add_days(today, end_days),
        };

        if range.is_empty() {
            warn!(
                "Doctor {} has start buffer {} after end buffer {}, no date is bookable",
                availability.doctor_id, start_days, end_days
            );
        }

        debug!(
            "Booking range for doctor {}: {} ..= {}",
            availability.doctor_id, range.min, range.max
        );

        range
    }
}

pub fn is_within_booking_window(date: NaiveDate, range: &BookingRange) -> bool {
    range.contains(date)
}

fn clamp_buffer(days: i64, field: &str, availability: &DoctorAvailability) -> i64 {
    if days < 0 {
        warn!(
            "Doctor {} has negative {} ({}), treating as 0",
            availability.doctor_id, field, days
        );
        return 0;
    }
    days
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    // Duration::days panics past ~2.5e13 days
    let days = days.min(i64::from(i32::MAX));
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MAX)
}
