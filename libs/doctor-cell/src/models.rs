use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::User;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    /// Public identifier, `D` followed by six digits.
    pub doctor_id: String,
    pub user_id: Uuid,
    pub specialization: String,
    pub qualification: String,
    pub experience_years: u32,
    pub department: String,
    pub consultation_fee: f64,
    pub working_hours: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn profile(&self) -> DoctorProfile {
        DoctorProfile {
            specialization: self.specialization.clone(),
            qualification: self.qualification.clone(),
            experience_years: self.experience_years,
            department: self.department.clone(),
            consultation_fee: self.consultation_fee,
            working_hours: self.working_hours.clone(),
            available: self.available,
        }
    }

    pub fn apply_profile(&mut self, profile: DoctorProfile) {
        self.specialization = profile.specialization;
        self.qualification = profile.qualification;
        self.experience_years = profile.experience_years;
        self.department = profile.department;
        self.consultation_fee = profile.consultation_fee;
        self.working_hours = profile.working_hours;
        self.available = profile.available;
    }
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub specialization: String,
    pub qualification: String,
    pub experience_years: u32,
    pub department: String,
    pub consultation_fee: f64,
    pub working_hours: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDetails {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub user: User,
}

impl DoctorDetails {
    pub fn full_name(&self) -> String {
        self.user.full_name()
    }
}
