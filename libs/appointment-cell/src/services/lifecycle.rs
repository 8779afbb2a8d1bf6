// libs/appointment-cell/src/services/lifecycle.rs
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_models::AppointmentStatus;

use crate::models::{Appointment, AppointmentError};
use crate::services::store::AppointmentStore;

/// Staff action on a persisted appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Approve,
    Reject,
    Complete,
    /// Undo a completion.
    Revert,
    /// Bring a rejected appointment back.
    Restore,
}

impl StatusAction {
    pub const ALL: [StatusAction; 5] = [
        StatusAction::Approve,
        StatusAction::Reject,
        StatusAction::Complete,
        StatusAction::Revert,
        StatusAction::Restore,
    ];

    /// The only status this action may be applied from.
    pub fn from_status(&self) -> AppointmentStatus {
        match self {
            StatusAction::Approve | StatusAction::Reject => AppointmentStatus::Pending,
            StatusAction::Complete => AppointmentStatus::Approved,
            StatusAction::Revert => AppointmentStatus::Done,
            StatusAction::Restore => AppointmentStatus::Rejected,
        }
    }

    pub fn target(&self) -> AppointmentStatus {
        match self {
            StatusAction::Approve | StatusAction::Revert | StatusAction::Restore => {
                AppointmentStatus::Approved
            }
            StatusAction::Reject => AppointmentStatus::Rejected,
            StatusAction::Complete => AppointmentStatus::Done,
        }
    }
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusAction::Approve => write!(f, "approve"),
            StatusAction::Reject => write!(f, "reject"),
            StatusAction::Complete => write!(f, "complete"),
            StatusAction::Revert => write!(f, "revert"),
            StatusAction::Restore => write!(f, "restore"),
        }
    }
}

impl FromStr for StatusAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(StatusAction::Approve),
            "reject" => Ok(StatusAction::Reject),
            "complete" => Ok(StatusAction::Complete),
            "revert" | "undo" => Ok(StatusAction::Revert),
            "restore" => Ok(StatusAction::Restore),
            other => Err(format!("unknown status action '{}'", other)),
        }
    }
}

/// The legality table. Stores call this as the authoritative check.
pub fn is_legal_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    StatusAction::ALL
        .iter()
        .any(|action| action.from_status() == from && action.target() == to)
}

pub struct AppointmentLifecycleService;

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !is_legal_transition(current_status, new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::IllegalTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        self.available_actions(current_status)
            .into_iter()
            .map(|action| action.target())
            .collect()
    }

    pub fn available_actions(&self, current_status: AppointmentStatus) -> Vec<StatusAction> {
        StatusAction::ALL
            .into_iter()
            .filter(|action| action.from_status() == current_status)
            .collect()
    }

    /// Status `action` leads to from `current_status`, if it applies there.
    pub fn resolve_action(
        &self,
        current_status: AppointmentStatus,
        action: StatusAction,
    ) -> Result<AppointmentStatus, AppointmentError> {
        if action.from_status() != current_status {
            warn!("Action {} is not available from {}", action, current_status);
            return Err(AppointmentError::IllegalTransition {
                from: current_status,
                to: action.target(),
            });
        }
        Ok(action.target())
    }

    /// Apply `action` to a stored appointment as one compare-and-swap write.
    /// A concurrent change between read and write surfaces as
    /// [`AppointmentError::ConcurrencyConflict`]; nothing is retried here.
    #[instrument(skip(self, store))]
    pub async fn transition(
        &self,
        store: &dyn AppointmentStore,
        appointment_id: Uuid,
        action: StatusAction,
        now: NaiveDateTime,
    ) -> Result<Appointment, AppointmentError> {
        let current = store.get(appointment_id).await?;
        let target = self.resolve_action(current.status, action)?;

        let updated = store
            .compare_and_set_status(appointment_id, current.status, target, now)
            .await?;

        info!(
            "Appointment {} moved {} -> {} ({})",
            appointment_id, current.status, updated.status, action
        );
        Ok(updated)
    }

    /// Move to an explicit status, validated against the legality table.
    #[instrument(skip(self, store))]
    pub async fn transition_to(
        &self,
        store: &dyn AppointmentStore,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        now: NaiveDateTime,
    ) -> Result<Appointment, AppointmentError> {
        let current = store.get(appointment_id).await?;
        self.validate_status_transition(current.status, new_status)?;

        let updated = store
            .compare_and_set_status(appointment_id, current.status, new_status, now)
            .await?;

        info!("Appointment {} moved {} -> {}", appointment_id, current.status, new_status);
        Ok(updated)
    }
}
