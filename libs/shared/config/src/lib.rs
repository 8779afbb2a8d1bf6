use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Status a freshly submitted booking is persisted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialBookingStatus {
    /// Staff-confirmed booking.
    Approved,
    /// Self-service booking awaiting review.
    Pending,
}

impl FromStr for InitialBookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" => Ok(Self::Approved),
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown initial booking status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub default_end_buffer_days: i64,
    pub no_doctor_window_days: i64,
    pub no_doctor_slot_minutes: i64,
    pub default_slot_capacity: u32,
    pub initial_status: InitialBookingStatus,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_end_buffer_days: 365,
            no_doctor_window_days: 365,
            no_doctor_slot_minutes: 30,
            default_slot_capacity: 1,
            initial_status: InitialBookingStatus::Approved,
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            default_end_buffer_days: parse_env(
                "BOOKING_DEFAULT_END_BUFFER_DAYS",
                defaults.default_end_buffer_days,
            ),
            no_doctor_window_days: parse_env(
                "BOOKING_NO_DOCTOR_WINDOW_DAYS",
                defaults.no_doctor_window_days,
            ),
            no_doctor_slot_minutes: parse_env(
                "BOOKING_NO_DOCTOR_SLOT_MINUTES",
                defaults.no_doctor_slot_minutes,
            ),
            default_slot_capacity: parse_env(
                "BOOKING_DEFAULT_SLOT_CAPACITY",
                defaults.default_slot_capacity,
            ),
            initial_status: parse_env("BOOKING_INITIAL_STATUS", defaults.initial_status),
        };

        if !config.is_valid() {
            warn!("Scheduling configuration has out-of-range values, falling back to defaults");
            return defaults;
        }

        config
    }

    pub fn is_valid(&self) -> bool {
        self.default_end_buffer_days >= 0
            && self.no_doctor_window_days >= 0
            && self.no_doctor_slot_minutes > 0
            && self.no_doctor_slot_minutes <= 24 * 60
            && self.default_slot_capacity > 0
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
