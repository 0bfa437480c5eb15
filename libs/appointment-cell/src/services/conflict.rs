use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use shared_config::{AppConfig, MAX_CONFLICT_WINDOW_MINUTES};

use crate::models::Appointment;

/// Per-doctor exclusivity window around a booking time. Both edges are
/// inclusive: an appointment exactly one window-width away still conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictWindow {
    half_width: Duration,
}

impl ConflictWindow {
    /// Widths outside `0..=MAX_CONFLICT_WINDOW_MINUTES` are clamped.
    pub fn minutes(minutes: i64) -> Self {
        Self {
            half_width: Duration::minutes(minutes.clamp(0, MAX_CONFLICT_WINDOW_MINUTES)),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::minutes(config.conflict_window_minutes)
    }

    /// Saturates at the representable range instead of overflowing.
    pub fn bounds(&self, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            at.checked_sub_signed(self.half_width).unwrap_or(DateTime::<Utc>::MIN_UTC),
            at.checked_add_signed(self.half_width).unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    pub fn contains(&self, at: DateTime<Utc>, other: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds(at);
        other >= start && other <= end
    }

    /// Whether `existing` keeps `doctor_id` from being booked at `at`.
    pub fn blocks(&self, doctor_id: Uuid, at: DateTime<Utc>, existing: &Appointment) -> bool {
        existing.doctor_id == doctor_id
            && existing.status.holds_slot()
            && self.contains(at, existing.scheduled_at)
    }
}

impl Default for ConflictWindow {
    fn default() -> Self {
        Self::minutes(shared_config::DEFAULT_CONFLICT_WINDOW_MINUTES)
    }
}
