use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use shared_models::{ClinicError, ClinicResult, Credentials};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

static BLOOD_GROUP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(A|B|AB|O)[+-]$").expect("blood group pattern is valid"));

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn require_non_blank(field: &str, value: &str) -> ClinicResult<()> {
    if value.trim().is_empty() {
        return Err(ClinicError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> ClinicResult<()> {
    require_non_blank("email", email)?;
    if !EMAIL_PATTERN.is_match(email.trim()) {
        return Err(ClinicError::Validation(format!("invalid email address: {}", email)));
    }
    Ok(())
}

/// Blood group is optional; when present it must look like `AB+` or `O-`.
pub fn validate_blood_group(blood_group: Option<&str>) -> ClinicResult<()> {
    match blood_group.map(str::trim) {
        None | Some("") => Ok(()),
        Some(value) if BLOOD_GROUP_PATTERN.is_match(&value.to_uppercase()) => Ok(()),
        Some(value) => Err(ClinicError::Validation(format!("invalid blood group: {}", value))),
    }
}

pub fn require_non_negative(field: &str, value: f64) -> ClinicResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ClinicError::Validation(format!("{} must not be negative", field)));
    }
    Ok(())
}

pub fn validate_contact(first_name: &str, last_name: &str, email: &str) -> ClinicResult<()> {
    require_non_blank("first_name", first_name)?;
    require_non_blank("last_name", last_name)?;
    validate_email(email)
}

pub fn validate_credentials(credentials: &Credentials) -> ClinicResult<()> {
    require_non_blank("username", &credentials.username)?;
    if credentials.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ClinicError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    validate_contact(&credentials.first_name, &credentials.last_name, &credentials.email)
}

/// Expands a calendar-day range into UTC instants covering every day in full,
/// from midnight on `start` up to the last nanosecond of `end`.
pub fn utc_day_bounds(start: NaiveDate, end: NaiveDate) -> ClinicResult<(DateTime<Utc>, DateTime<Utc>)> {
    if start > end {
        return Err(ClinicError::Validation(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }

    let last_instant = end
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .ok_or_else(|| ClinicError::Validation(format!("invalid end date {}", end)))?;

    Ok((
        Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)),
        Utc.from_utc_datetime(&last_instant),
    ))
}

/// Same as [`utc_day_bounds`] for ranges that are already instants.
pub fn validate_instant_range(start: DateTime<Utc>, end: DateTime<Utc>) -> ClinicResult<()> {
    if start > end {
        return Err(ClinicError::Validation(format!("range start {} is after end {}", start, end)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn credentials() -> Credentials {
        Credentials {
            username: "mkelly".to_string(),
            password: "correct-horse".to_string(),
            first_name: "Maeve".to_string(),
            last_name: "Kelly".to_string(),
            email: "maeve@example.com".to_string(),
            phone_number: None,
        }
    }

    #[test]
    fn accepts_complete_credentials() {
        assert!(validate_credentials(&credentials()).is_ok());
    }

    #[test]
    fn rejects_short_password_and_bad_email() {
        let mut short = credentials();
        short.password = "abc".to_string();
        assert_matches!(validate_credentials(&short), Err(ClinicError::Validation(_)));

        let mut bad_email = credentials();
        bad_email.email = "maeve.example.com".to_string();
        assert_matches!(validate_credentials(&bad_email), Err(ClinicError::Validation(_)));
    }

    #[test]
    fn blank_username_is_rejected() {
        let mut blank = credentials();
        blank.username = "   ".to_string();
        assert_matches!(
            validate_credentials(&blank),
            Err(ClinicError::Validation(msg)) if msg.contains("username")
        );
    }

    #[test]
    fn blood_group_is_optional_but_checked() {
        assert!(validate_blood_group(None).is_ok());
        assert!(validate_blood_group(Some("ab+")).is_ok());
        assert!(validate_blood_group(Some("O-")).is_ok());
        assert!(validate_blood_group(Some("C+")).is_err());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(require_non_negative("consultation_fee", 0.0).is_ok());
        assert!(require_non_negative("consultation_fee", -1.0).is_err());
        assert!(require_non_negative("consultation_fee", f64::NAN).is_err());
    }

    #[test]
    fn day_bounds_cover_whole_days() {
        let start = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2030, 5, 2).unwrap();
        let (from, to) = utc_day_bounds(start, end).unwrap();

        assert_eq!(from, Utc.with_ymd_and_hms(2030, 5, 1, 0, 0, 0).unwrap());
        assert!(to > Utc.with_ymd_and_hms(2030, 5, 2, 23, 59, 59).unwrap());
        assert!(to < Utc.with_ymd_and_hms(2030, 5, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn inverted_day_range_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2030, 5, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap();
        assert_matches!(utc_day_bounds(start, end), Err(ClinicError::Validation(_)));
    }
}
