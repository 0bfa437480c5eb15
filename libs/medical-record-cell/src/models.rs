use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    /// At most one record exists per appointment.
    pub appointment_id: Option<Uuid>,
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub test_results: Option<String>,
    pub notes: Option<String>,
    pub visit_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MedicalRecord {
    /// Overwrites the clinical fields. References and `created_at` are kept.
    pub fn apply_notes(&mut self, notes: ClinicalNotes) {
        self.diagnosis = notes.diagnosis.trim().to_string();
        self.symptoms = notes.symptoms;
        self.treatment = notes.treatment;
        self.prescription = notes.prescription;
        self.test_results = notes.test_results;
        self.notes = notes.notes;
        if let Some(visit_date) = notes.visit_date {
            self.visit_date = visit_date;
        }
    }
}

/// Clinical content of a record as supplied on create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicalNotes {
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub test_results: Option<String>,
    pub notes: Option<String>,
    /// Defaults to the time of creation; left untouched on update when absent.
    pub visit_date: Option<DateTime<Utc>>,
}
