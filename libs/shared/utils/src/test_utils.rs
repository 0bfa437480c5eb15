use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Credentials, Role};

pub struct TestConfig {
    pub conflict_window_minutes: i64,
    pub enforce_status_transitions: bool,
    pub recheck_conflicts_on_reschedule: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            conflict_window_minutes: 60,
            enforce_status_transitions: false,
            recheck_conflicts_on_reschedule: false,
        }
    }
}

impl TestConfig {
    /// Same policy as production defaults, but with the cheapest Argon2 cost
    /// so that tests creating many identities stay fast.
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            conflict_window_minutes: self.conflict_window_minutes,
            enforce_status_transitions: self.enforce_status_transitions,
            recheck_conflicts_on_reschedule: self.recheck_conflicts_on_reschedule,
            password_hash_memory_kib: 8,
            password_hash_iterations: 1,
            log_filter: "debug".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    pub fn enforcing() -> Self {
        Self {
            enforce_status_transitions: true,
            ..Self::default()
        }
    }

    pub fn rechecking() -> Self {
        Self {
            recheck_conflicts_on_reschedule: true,
            ..Self::default()
        }
    }
}

pub struct TestUser {
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            role,
        }
    }

    /// A user with a random username, for tests that create many identities.
    pub fn unique(role: Role) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self::new(&format!("user_{}", &suffix[..12]), role)
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(username, Role::Doctor)
    }

    pub fn patient(username: &str) -> Self {
        Self::new(username, Role::Patient)
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, Role::Admin)
    }

    pub fn password(&self) -> String {
        format!("{}-S3cret!", self.username)
    }

    pub fn to_credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password(),
            first_name: "Test".to_string(),
            last_name: self.username.clone(),
            email: self.email.clone(),
            phone_number: Some("+353 1 555 0100".to_string()),
        }
    }
}

/// UTC timestamp shorthand for scheduling tests.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid test timestamp {year}-{month}-{day} {hour}:{minute}"))
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid test date {year}-{month}-{day}"))
}

/// Routes test logs through the libtest capture; safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.conflict_window_minutes, 60);
        assert!(!config.enforce_status_transitions);
        assert!(config.is_valid());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("drwho");
        assert_eq!(user.email, "drwho@example.com");
        assert_eq!(user.role, Role::Doctor);

        let credentials = user.to_credentials();
        assert_eq!(credentials.username, "drwho");
        assert!(credentials.password.len() >= 8);
    }

    #[test]
    fn unique_users_do_not_collide() {
        let a = TestUser::unique(Role::Patient);
        let b = TestUser::unique(Role::Patient);
        assert_ne!(a.username, b.username);
    }

    #[test]
    fn utc_helper_builds_exact_instant() {
        let at = utc(2025, 3, 14, 9, 30);
        assert_eq!(at.to_rfc3339(), "2025-03-14T09:30:00+00:00");
    }
}
