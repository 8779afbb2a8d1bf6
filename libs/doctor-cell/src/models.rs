use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::AppointmentMode;

/// One recurring weekly range during which a doctor takes bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub day: Weekday,
    #[serde(default)]
    pub closed: bool,
    #[serde(alias = "start_time")]
    pub start_time: NaiveTime,
    #[serde(alias = "end_time")]
    pub end_time: NaiveTime,
    #[serde(alias = "slot_duration_minutes", alias = "duration")]
    pub slot_duration_minutes: i64,
    #[serde(default, alias = "is_clinic_time")]
    pub is_clinic_time: bool,
    #[serde(default, alias = "is_video_time")]
    pub is_video_time: bool,
    /// Concurrent bookings per slot. Falls back to the configured default.
    #[serde(default, alias = "persons", skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl AvailabilityWindow {
    pub fn offers(&self, mode: AppointmentMode) -> bool {
        match mode {
            AppointmentMode::Clinic => self.is_clinic_time,
            AppointmentMode::Video => self.is_video_time,
        }
    }

    pub fn modes(&self) -> Vec<AppointmentMode> {
        let mut modes = Vec::with_capacity(2);
        if self.is_clinic_time {
            modes.push(AppointmentMode::Clinic);
        }
        if self.is_video_time {
            modes.push(AppointmentMode::Video);
        }
        modes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorAvailability {
    #[serde(alias = "doctor_id")]
    pub doctor_id: Uuid,
    #[serde(default)]
    pub windows: Vec<AvailabilityWindow>,
    #[serde(default, alias = "start_buffer_days")]
    pub start_buffer_days: i64,
    /// Absent means the configured default (365 days).
    #[serde(default, alias = "end_buffer_days", skip_serializing_if = "Option::is_none")]
    pub end_buffer_days: Option<i64>,
}

impl DoctorAvailability {
    pub fn new(doctor_id: Uuid) -> Self {
        Self {
            doctor_id,
            windows: Vec::new(),
            start_buffer_days: 0,
            end_buffer_days: None,
        }
    }

    pub fn with_window(mut self, window: AvailabilityWindow) -> Self {
        self.windows.push(window);
        self
    }

    pub fn with_buffers(mut self, start_days: i64, end_days: i64) -> Self {
        self.start_buffer_days = start_days;
        self.end_buffer_days = Some(end_days);
        self
    }
}

/// Who an appointment is booked with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provider {
    Doctor(DoctorAvailability),
    /// Unassigned placeholder: always bookable, any slot.
    NoDoctor,
}

impl Provider {
    pub fn doctor_id(&self) -> Option<Uuid> {
        match self {
            Provider::Doctor(availability) => Some(availability.doctor_id),
            Provider::NoDoctor => None,
        }
    }

    pub fn is_no_doctor(&self) -> bool {
        matches!(self, Provider::NoDoctor)
    }

    /// Two providers are the same booking target when they share a doctor id.
    pub fn same_provider(&self, other: &Provider) -> bool {
        self.doctor_id() == other.doctor_id()
    }
}

/// Inclusive, date-only booking range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl BookingRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date <= self.max
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: NaiveTime,
    pub label: String,
    pub full: bool,
    pub mode: AppointmentMode,
    pub duration_minutes: i64,
    /// `None` when the provider has no capacity limit.
    pub capacity: Option<u32>,
    pub booked: u32,
}

impl TimeSlot {
    pub fn end_time(&self) -> NaiveTime {
        self.time + Duration::minutes(self.duration_minutes)
    }

    pub fn starts_at(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.time)
    }

    /// A slot can be picked when it has room left and has not started yet.
    pub fn is_selectable(&self, date: NaiveDate, now: NaiveDateTime) -> bool {
        !self.full && self.starts_at(date) > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_deserializes_from_camel_case_with_persons() {
        let raw = serde_json::json!({
            "day": "Monday",
            "startTime": "10:00:00",
            "endTime": "12:00:00",
            "slotDurationMinutes": 30,
            "isClinicTime": true,
            "persons": 3
        });
        let window: AvailabilityWindow = serde_json::from_value(raw).unwrap();
        assert_eq!(window.day, Weekday::Mon);
        assert!(!window.closed);
        assert!(!window.is_video_time);
        assert_eq!(window.capacity, Some(3));
    }

    #[test]
    fn provider_round_trips_through_tagged_json() {
        let raw = serde_json::json!({ "kind": "no_doctor" });
        let provider: Provider = serde_json::from_value(raw).unwrap();
        assert!(provider.is_no_doctor());
        assert_eq!(provider.doctor_id(), None);
    }

    #[test]
    fn missing_end_buffer_stays_unset() {
        let raw = serde_json::json!({
            "doctorId": "550e8400-e29b-41d4-a716-446655440000",
            "windows": []
        });
        let availability: DoctorAvailability = serde_json::from_value(raw).unwrap();
        assert_eq!(availability.start_buffer_days, 0);
        assert_eq!(availability.end_buffer_days, None);
    }

    #[test]
    fn slot_in_the_past_is_not_selectable() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let slot = TimeSlot {
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            label: "10:00 AM".to_string(),
            full: false,
            mode: AppointmentMode::Clinic,
            duration_minutes: 30,
            capacity: Some(1),
            booked: 0,
        };
        assert!(slot.is_selectable(date, date.and_hms_opt(9, 59, 0).unwrap()));
        assert!(!slot.is_selectable(date, date.and_hms_opt(10, 0, 0).unwrap()));
        assert_eq!(slot.end_time(), NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    }
}
