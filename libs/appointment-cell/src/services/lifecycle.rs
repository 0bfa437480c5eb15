use tracing::{debug, warn};

use shared_models::{ClinicError, ClinicResult};

use crate::models::AppointmentStatus;

/// Status transition rules. With enforcement off every move is accepted.
#[derive(Debug, Clone, Copy)]
pub struct AppointmentLifecycleService {
    enforce_transitions: bool,
}

impl AppointmentLifecycleService {
    pub fn new(enforce_transitions: bool) -> Self {
        Self { enforce_transitions }
    }

    /// Same-status moves are always accepted; callers treat them as no-ops.
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> ClinicResult<()> {
        if current_status == new_status || !self.enforce_transitions {
            return Ok(());
        }

        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !Self::get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(ClinicError::Conflict(format!(
                "cannot move appointment from {} to {}",
                current_status, new_status
            )));
        }

        Ok(())
    }

    pub fn get_valid_transitions(current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![AppointmentStatus::Completed, AppointmentStatus::Cancelled],
            // Terminal states
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => vec![],
        }
    }
}
