use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_CONFLICT_WINDOW_MINUTES: i64 = 60;
pub const MAX_CONFLICT_WINDOW_MINUTES: i64 = 24 * 60;
pub const DEFAULT_PASSWORD_HASH_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_PASSWORD_HASH_ITERATIONS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Half-width of the per-doctor exclusivity window around a booking.
    pub conflict_window_minutes: i64,
    /// Opt-in: reject status moves outside SCHEDULED -> {COMPLETED, CANCELLED}.
    /// Off by default, so any status may move to any other.
    pub enforce_status_transitions: bool,
    /// Re-run the booking conflict check when an update moves an appointment.
    pub recheck_conflicts_on_reschedule: bool,
    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            conflict_window_minutes: DEFAULT_CONFLICT_WINDOW_MINUTES,
            enforce_status_transitions: false,
            recheck_conflicts_on_reschedule: false,
            password_hash_memory_kib: DEFAULT_PASSWORD_HASH_MEMORY_KIB,
            password_hash_iterations: DEFAULT_PASSWORD_HASH_ITERATIONS,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if any) and then reads each setting from the environment,
    /// falling back to the default with a warning when a value is missing or
    /// unparsable.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            conflict_window_minutes: env_or(
                "CLINIC_CONFLICT_WINDOW_MINUTES",
                defaults.conflict_window_minutes,
            ),
            enforce_status_transitions: env_or(
                "CLINIC_ENFORCE_STATUS_TRANSITIONS",
                defaults.enforce_status_transitions,
            ),
            recheck_conflicts_on_reschedule: env_or(
                "CLINIC_RECHECK_CONFLICTS_ON_RESCHEDULE",
                defaults.recheck_conflicts_on_reschedule,
            ),
            password_hash_memory_kib: env_or(
                "CLINIC_PASSWORD_HASH_MEMORY_KIB",
                defaults.password_hash_memory_kib,
            ),
            password_hash_iterations: env_or(
                "CLINIC_PASSWORD_HASH_ITERATIONS",
                defaults.password_hash_iterations,
            ),
            log_filter: env::var("RUST_LOG").unwrap_or(defaults.log_filter),
        };

        if !config.is_valid() {
            warn!("Invalid clinic configuration {:?}, using defaults", config);
            return Self::default();
        }

        config
    }

    pub fn is_valid(&self) -> bool {
        (0..=MAX_CONFLICT_WINDOW_MINUTES).contains(&self.conflict_window_minutes)
            && self.password_hash_memory_kib >= 8
            && self.password_hash_iterations >= 1
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
