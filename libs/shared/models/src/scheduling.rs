use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::InitialBookingStatus;

/// Delivery channel of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentMode {
    #[serde(alias = "Clinic", alias = "in_person")]
    Clinic,
    #[serde(alias = "Video", alias = "online")]
    Video,
}

impl fmt::Display for AppointmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentMode::Clinic => write!(f, "clinic"),
            AppointmentMode::Video => write!(f, "video"),
        }
    }
}

impl FromStr for AppointmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clinic" | "in_person" => Ok(AppointmentMode::Clinic),
            "video" | "online" => Ok(AppointmentMode::Video),
            other => Err(format!("unknown appointment mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Approved")]
    Approved,
    #[serde(alias = "Rejected")]
    Rejected,
    #[serde(alias = "Done")]
    Done,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Approved,
        AppointmentStatus::Rejected,
        AppointmentStatus::Done,
    ];

    /// Whether an appointment in this status occupies its slot.
    pub fn consumes_capacity(&self) -> bool {
        !matches!(self, AppointmentStatus::Rejected)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Approved => write!(f, "approved"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
            AppointmentStatus::Done => write!(f, "done"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "approved" => Ok(AppointmentStatus::Approved),
            "rejected" => Ok(AppointmentStatus::Rejected),
            "done" => Ok(AppointmentStatus::Done),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

impl From<InitialBookingStatus> for AppointmentStatus {
    fn from(status: InitialBookingStatus) -> Self {
        match status {
            InitialBookingStatus::Approved => AppointmentStatus::Approved,
            InitialBookingStatus::Pending => AppointmentStatus::Pending,
        }
    }
}

/// Already-booked appointment, as seen by slot occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingAppointment {
    #[serde(alias = "doctor_id")]
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub mode: AppointmentMode,
    pub status: AppointmentStatus,
}

impl ExistingAppointment {
    /// True when this booking occupies the given doctor/date/time/mode slot.
    pub fn occupies(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        mode: AppointmentMode,
    ) -> bool {
        self.status.consumes_capacity()
            && self.doctor_id == doctor_id
            && self.date == date
            && self.time == time
            && self.mode == mode
    }
}
