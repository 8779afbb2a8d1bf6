use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduling::{AppointmentMode, AppointmentStatus};

/// Malformed availability data. Recovered locally: the offending window
/// contributes no slots and generation continues with the rest.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationIssue {
    #[error("window on {day} ends at {end} which is not after its start {start}")]
    InvalidTimeRange {
        day: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("window on {day} starting {start} has non-positive slot duration {minutes}")]
    NonPositiveDuration {
        day: Weekday,
        start: NaiveTime,
        minutes: i64,
    },

    #[error("window on {day} starting {start} is {window_minutes} minutes long, shorter than its {minutes} minute slots")]
    DurationExceedsWindow {
        day: Weekday,
        start: NaiveTime,
        minutes: i64,
        window_minutes: i64,
    },

    #[error("window on {day} starting {start} has zero capacity")]
    ZeroCapacity { day: Weekday, start: NaiveTime },

    #[error("{field} is negative ({days} days)")]
    NegativeBuffer { field: String, days: i64 },

    #[error("start buffer ({start_days} days) is after end buffer ({end_days} days)")]
    InvertedBuffer { start_days: i64, end_days: i64 },

    #[error("{mode} windows on {day} starting {first_start} and {second_start} overlap")]
    OverlappingWindows {
        day: Weekday,
        mode: AppointmentMode,
        first_start: NaiveTime,
        second_start: NaiveTime,
    },
}

/// Field-keyed validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, message) in other.fields {
            self.fields.entry(field).or_insert(message);
        }
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Engine-wide error taxonomy. Every variant is recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Configuration error: {0}")]
    Configuration(ConfigurationIssue),

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Concurrency conflict: {0}. Re-fetch and retry")]
    ConcurrencyConflict(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<ConfigurationIssue> for SchedulingError {
    fn from(issue: ConfigurationIssue) -> Self {
        SchedulingError::Configuration(issue)
    }
}

impl From<ValidationErrors> for SchedulingError {
    fn from(errors: ValidationErrors) -> Self {
        SchedulingError::Validation(errors)
    }
}
