// libs/doctor-cell/src/services/availability.rs

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use shared_config::SchedulingConfig;
use shared_models::{AppointmentMode, ConfigurationIssue};

use crate::models::{AvailabilityWindow, DoctorAvailability};

pub struct AvailabilityService {
    default_capacity: u32,
}

impl AvailabilityService {
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            default_capacity: config.default_slot_capacity.max(1),
        }
    }

    /// Windows open on `date`'s weekday for `mode`, in configured order.
    pub fn resolve_windows<'a>(
        &self,
        availability: &'a DoctorAvailability,
        date: NaiveDate,
        mode: AppointmentMode,
    ) -> Vec<&'a AvailabilityWindow> {
        let weekday = date.weekday();

        let windows: Vec<&AvailabilityWindow> = availability
            .windows
            .iter()
            .filter(|window| window.day == weekday && !window.closed && window.offers(mode))
            .collect();

        debug!(
            "Resolved {} {} windows for doctor {} on {} ({})",
            windows.len(),
            mode,
            availability.doctor_id,
            date,
            weekday
        );

        windows
    }

    /// Capacity of one slot in `window`, never below one.
    pub fn effective_capacity(&self, window: &AvailabilityWindow) -> u32 {
        match window.capacity {
            Some(0) | None => self.default_capacity,
            Some(capacity) => capacity,
        }
    }

    /// Problem that makes `window` contribute no slots, if any.
    pub fn window_issue(&self, window: &AvailabilityWindow) -> Option<ConfigurationIssue> {
        if window.slot_duration_minutes <= 0 {
            return Some(ConfigurationIssue::NonPositiveDuration {
                day: window.day,
                start: window.start_time,
                minutes: window.slot_duration_minutes,
            });
        }

        if window.end_time <= window.start_time {
            return Some(ConfigurationIssue::InvalidTimeRange {
                day: window.day,
                start: window.start_time,
                end: window.end_time,
            });
        }

        let window_minutes = (window.end_time - window.start_time).num_minutes();
        if window.slot_duration_minutes > window_minutes {
            return Some(ConfigurationIssue::DurationExceedsWindow {
                day: window.day,
                start: window.start_time,
                minutes: window.slot_duration_minutes,
                window_minutes,
            });
        }

        None
    }

    /// Every data-quality problem in the record. Closed windows are ignored.
    pub fn validate(&self, availability: &DoctorAvailability) -> Vec<ConfigurationIssue> {
        let mut issues = Vec::new();

        if availability.start_buffer_days < 0 {
            issues.push(ConfigurationIssue::NegativeBuffer {
                field: "start_buffer_days".to_string(),
                days: availability.start_buffer_days,
            });
        }

        if let Some(end_days) = availability.end_buffer_days {
            if end_days < 0 {
                issues.push(ConfigurationIssue::NegativeBuffer {
                    field: "end_buffer_days".to_string(),
                    days: end_days,
                });
            } else if availability.start_buffer_days > end_days {
                issues.push(ConfigurationIssue::InvertedBuffer {
                    start_days: availability.start_buffer_days,
                    end_days,
                });
            }
        }

        let open: Vec<&AvailabilityWindow> = availability
            .windows
            .iter()
            .filter(|window| !window.closed)
            .collect();

        for window in &open {
            if let Some(issue) = self.window_issue(window) {
                issues.push(issue);
            }
            if window.capacity == Some(0) {
                issues.push(ConfigurationIssue::ZeroCapacity {
                    day: window.day,
                    start: window.start_time,
                });
            }
        }

        let well_formed: Vec<&AvailabilityWindow> = open
            .into_iter()
            .filter(|window| self.window_issue(window).is_none())
            .collect();

        for (i, first) in well_formed.iter().enumerate() {
            for second in &well_formed[i + 1..] {
                if first.day != second.day {
                    continue;
                }
                let overlaps = first.start_time < second.end_time && second.start_time < first.end_time;
                if !overlaps {
                    continue;
                }
                for mode in first.modes() {
                    if second.offers(mode) {
                        issues.push(ConfigurationIssue::OverlappingWindows {
                            day: first.day,
                            mode,
                            first_start: first.start_time,
                            second_start: second.start_time,
                        });
                    }
                }
            }
        }

        issues
    }
}
