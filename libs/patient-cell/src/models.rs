use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::User;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    /// Public identifier, `P` followed by six digits.
    pub patient_id: String,
    /// Owned identity; deleted together with the patient.
    pub user_id: Uuid,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn profile(&self) -> PatientProfile {
        PatientProfile {
            date_of_birth: self.date_of_birth,
            gender: self.gender.clone(),
            address: self.address.clone(),
            emergency_contact: self.emergency_contact.clone(),
            blood_group: self.blood_group.clone(),
            allergies: self.allergies.clone(),
            medical_history: self.medical_history.clone(),
        }
    }

    pub fn apply_profile(&mut self, profile: PatientProfile) {
        self.date_of_birth = profile.date_of_birth;
        self.gender = profile.gender;
        self.address = profile.address;
        self.emergency_contact = profile.emergency_contact;
        self.blood_group = profile.blood_group;
        self.allergies = profile.allergies;
        self.medical_history = profile.medical_history;
    }
}

/// Demographic fields a caller supplies on create and overwrites on update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
}

/// A patient together with its identity, as returned by every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetails {
    #[serde(flatten)]
    pub patient: Patient,
    pub user: User,
}

impl PatientDetails {
    pub fn full_name(&self) -> String {
        self.user.full_name()
    }
}
