use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};

use appointment_cell::{AppointmentLifecycleService, StatusAction};
use doctor_cell::{AvailabilityService, DoctorAvailability, Provider, SlotGenerator, TimeSlot};
use shared_config::SchedulingConfig;
use shared_models::{AppointmentMode, AppointmentStatus, ExistingAppointment};

/// Reads either a tagged provider (`{"kind": "no_doctor"}`) or a bare doctor
/// availability record.
pub fn load_provider(path: &Path) -> Result<Provider> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read availability file {}", path.display()))?;

    if let Ok(provider) = serde_json::from_str::<Provider>(&raw) {
        return Ok(provider);
    }

    let availability: DoctorAvailability = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid availability record", path.display()))?;
    Ok(Provider::Doctor(availability))
}

pub fn load_appointments(path: &Path) -> Result<Vec<ExistingAppointment>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read appointments file {}", path.display()))?;
    let appointments: Vec<ExistingAppointment> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid appointment list", path.display()))?;

    debug!("Loaded {} existing appointments", appointments.len());
    Ok(appointments)
}

pub fn slots(
    config: &SchedulingConfig,
    availability_path: &Path,
    appointments_path: Option<&Path>,
    date: NaiveDate,
    mode: AppointmentMode,
    today: NaiveDate,
) -> Result<String> {
    let provider = load_provider(availability_path)?;
    let existing = match appointments_path {
        Some(path) => load_appointments(path)?,
        None => Vec::new(),
    };

    let generator = SlotGenerator::new(config);
    let range = generator.buffer().booking_range(&provider, today);
    if !range.contains(date) {
        return Ok(format!(
            "{} is outside the booking window {} ..= {}",
            date, range.min, range.max
        ));
    }

    let slots = generator.generate_slots(&provider, date, today, &existing, mode);
    Ok(render_slots(date, mode, &slots))
}

pub fn render_slots(date: NaiveDate, mode: AppointmentMode, slots: &[TimeSlot]) -> String {
    if slots.is_empty() {
        return format!("No {} slots on {}", mode, date);
    }

    let mut out = format!("{} slots on {} ({}):", mode, date, date.format("%A"));
    for slot in slots {
        let state = if slot.full { "full" } else { "open" };
        let occupancy = match slot.capacity {
            Some(capacity) => format!("{}/{}", slot.booked, capacity),
            None => "unlimited".to_string(),
        };
        let _ = write!(
            out,
            "\n  {:>8}  {:<4}  {:>3} min  {}",
            slot.label, state, slot.duration_minutes, occupancy
        );
    }
    out
}

pub fn validate(config: &SchedulingConfig, availability_path: &Path) -> Result<String> {
    let availability = match load_provider(availability_path)? {
        Provider::Doctor(availability) => availability,
        Provider::NoDoctor => {
            return Ok("Unassigned provider has no availability to check".to_string())
        }
    };

    let issues = AvailabilityService::new(config).validate(&availability);
    if issues.is_empty() {
        return Ok(format!(
            "Availability for doctor {} has no issues",
            availability.doctor_id
        ));
    }

    warn!(
        "Doctor {} has {} availability issues",
        availability.doctor_id,
        issues.len()
    );
    let mut out = format!(
        "Availability for doctor {} has {} issue(s):",
        availability.doctor_id,
        issues.len()
    );
    for issue in issues {
        let _ = write!(out, "\n  - {}", issue);
    }
    Ok(out)
}

pub fn transitions(from: Option<AppointmentStatus>) -> String {
    let lifecycle = AppointmentLifecycleService::new();
    let statuses = match from {
        Some(status) => vec![status],
        None => AppointmentStatus::ALL.to_vec(),
    };

    let mut out = String::from("from       action     to");
    for status in statuses {
        let actions: Vec<StatusAction> = lifecycle.available_actions(status);
        for action in actions {
            let _ = write!(
                out,
                "\n{:<10} {:<10} {}",
                status.to_string(),
                action.to_string(),
                action.target()
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;
    use uuid::Uuid;

    fn json_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn doctor_json(doctor_id: Uuid) -> String {
        format!(
            r#"{{
                "doctorId": "{}",
                "startBufferDays": 0,
                "windows": [
                    {{ "day": "Mon", "startTime": "10:00:00", "endTime": "12:00:00",
                       "slotDurationMinutes": 30, "isClinicTime": true, "persons": 1 }}
                ]
            }}"#,
            doctor_id
        )
    }

    #[test]
    fn slots_mark_booked_time_as_full() {
        let doctor_id = Uuid::new_v4();
        let availability = json_file(&doctor_json(doctor_id));
        let appointments = json_file(&format!(
            r#"[{{ "doctorId": "{}", "date": "2026-10-19", "time": "10:30:00",
                   "mode": "clinic", "status": "approved" }}]"#,
            doctor_id
        ));

        let output = slots(
            &SchedulingConfig::default(),
            availability.path(),
            Some(appointments.path()),
            monday(),
            AppointmentMode::Clinic,
            monday(),
        )
        .unwrap();

        let lines: Vec<&str> = output.lines().skip(1).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("10:00 AM") && lines[0].contains("open"));
        assert!(lines[1].contains("10:30 AM") && lines[1].contains("full"));
        assert!(lines[1].contains("1/1"));
    }

    #[test]
    fn slots_report_dates_outside_window() {
        let availability = json_file(r#"{ "kind": "no_doctor" }"#);

        let output = slots(
            &SchedulingConfig::default(),
            availability.path(),
            None,
            monday() - chrono::Duration::days(1),
            AppointmentMode::Video,
            monday(),
        )
        .unwrap();

        assert!(output.contains("outside the booking window"));
    }

    #[test]
    fn validate_lists_overlapping_windows() {
        let availability = json_file(&format!(
            r#"{{
                "doctor_id": "{}",
                "windows": [
                    {{ "day": "Tue", "start_time": "09:00:00", "end_time": "11:00:00",
                       "slot_duration_minutes": 30, "is_video_time": true }},
                    {{ "day": "Tue", "start_time": "10:00:00", "end_time": "12:00:00",
                       "slot_duration_minutes": 30, "is_video_time": true }}
                ]
            }}"#,
            Uuid::new_v4()
        ));

        let output = validate(&SchedulingConfig::default(), availability.path()).unwrap();

        assert!(output.contains("1 issue(s)"), "{}", output);
        assert!(output.contains("overlap"));
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let file = json_file("not json");
        assert!(load_provider(file.path()).is_err());
        assert!(load_appointments(Path::new("/nonexistent/appointments.json")).is_err());
    }

    #[test]
    fn transition_table_lists_every_action() {
        let table = transitions(None);
        assert_eq!(table.lines().count(), 1 + StatusAction::ALL.len());

        let from_done = transitions(Some(AppointmentStatus::Done));
        assert!(from_done.contains("revert"));
        assert_eq!(from_done.lines().count(), 2);
    }
}
