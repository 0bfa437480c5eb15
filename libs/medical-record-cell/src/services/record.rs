use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::AppointmentRepository;
use doctor_cell::DoctorRepository;
use patient_cell::PatientRepository;
use shared_database::GuardedWrite;
use shared_models::{ClinicError, ClinicResult};
use shared_utils::validation::{require_non_blank, utc_day_bounds};

use crate::models::{ClinicalNotes, MedicalRecord};
use crate::repository::MedicalRecordRepository;

#[derive(Clone)]
pub struct MedicalRecordService {
    records: Arc<dyn MedicalRecordRepository>,
    patients: Arc<dyn PatientRepository>,
    doctors: Arc<dyn DoctorRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl MedicalRecordService {
    pub fn new(
        records: Arc<dyn MedicalRecordRepository>,
        patients: Arc<dyn PatientRepository>,
        doctors: Arc<dyn DoctorRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self {
            records,
            patients,
            doctors,
            appointments,
        }
    }

    /// Create a record, optionally linked to the appointment it documents.
    ///
    /// An appointment id that does not resolve leaves the record unlinked.
    /// A resolved appointment that already has a record is a conflict.
    pub async fn create_record(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        appointment_id: Option<Uuid>,
        notes: ClinicalNotes,
    ) -> ClinicResult<MedicalRecord> {
        debug!("Creating medical record for patient {} by doctor {}", patient_id, doctor_id);

        self.ensure_patient(patient_id).await?;
        self.ensure_doctor(doctor_id).await?;
        require_non_blank("diagnosis", &notes.diagnosis)?;

        let appointment_id = match appointment_id {
            Some(id) => self.resolve_appointment(id).await?,
            None => None,
        };

        let now = Utc::now();
        let mut record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            appointment_id,
            diagnosis: String::new(),
            symptoms: None,
            treatment: None,
            prescription: None,
            test_results: None,
            notes: None,
            visit_date: now,
            created_at: now,
            updated_at: now,
        };
        record.apply_notes(notes);

        match self
            .records
            .create_unless_linked(record)
            .await
            .map_err(ClinicError::database)?
        {
            GuardedWrite::Written(record) => {
                info!("Medical record {} created for patient {}", record.id, patient_id);
                Ok(record)
            }
            GuardedWrite::Blocked(existing) => {
                let linked = appointment_id.map(|id| id.to_string()).unwrap_or_default();
                warn!(
                    "Appointment {} already documented by record {}",
                    linked,
                    existing.first().map(|r| r.id.to_string()).unwrap_or_default()
                );
                Err(ClinicError::Conflict(format!(
                    "appointment {} already has a medical record",
                    linked
                )))
            }
            GuardedWrite::Missing => Err(ClinicError::Database(
                "record store reported a missing row on insert".to_string(),
            )),
        }
    }

    /// Overwrites the clinical fields and refreshes `updated_at`; patient,
    /// doctor, appointment and `created_at` never change.
    pub async fn update_record(&self, id: Uuid, notes: ClinicalNotes) -> ClinicResult<MedicalRecord> {
        debug!("Updating medical record {}", id);

        let mut record = self.require_record(id).await?;
        require_non_blank("diagnosis", &notes.diagnosis)?;

        record.apply_notes(notes);
        record.updated_at = Utc::now();

        let record = self
            .records
            .update(record)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Medical record", id))?;

        info!("Medical record {} updated", id);
        Ok(record)
    }

    pub async fn delete_record(&self, id: Uuid) -> ClinicResult<()> {
        if self.records.delete(id).await.map_err(ClinicError::database)? {
            info!("Medical record {} deleted", id);
        } else {
            debug!("Medical record {} already absent", id);
        }
        Ok(())
    }

    pub async fn get_record(&self, id: Uuid) -> ClinicResult<MedicalRecord> {
        self.require_record(id).await
    }

    pub async fn list_records(&self) -> ClinicResult<Vec<MedicalRecord>> {
        let all = self.records.find_all().await.map_err(ClinicError::database)?;
        Ok(most_recent_first(all))
    }

    /// A patient's history, most recent visit first.
    pub async fn list_by_patient(&self, patient_id: Uuid) -> ClinicResult<Vec<MedicalRecord>> {
        let found = self
            .records
            .find_by_patient(patient_id)
            .await
            .map_err(ClinicError::database)?;
        Ok(most_recent_first(found))
    }

    pub async fn list_by_doctor(&self, doctor_id: Uuid) -> ClinicResult<Vec<MedicalRecord>> {
        let found = self
            .records
            .find_by_doctor(doctor_id)
            .await
            .map_err(ClinicError::database)?;
        Ok(most_recent_first(found))
    }

    pub async fn get_by_appointment(&self, appointment_id: Uuid) -> ClinicResult<Option<MedicalRecord>> {
        self.records
            .find_by_appointment(appointment_id)
            .await
            .map_err(ClinicError::database)
    }

    pub async fn list_by_visit_date_range(&self, start: NaiveDate, end: NaiveDate) -> ClinicResult<Vec<MedicalRecord>> {
        let (from, to) = utc_day_bounds(start, end)?;
        let found = self
            .records
            .find_visits_between(from, to)
            .await
            .map_err(ClinicError::database)?;
        Ok(most_recent_first(found))
    }

    pub async fn search_by_diagnosis(&self, term: &str) -> ClinicResult<Vec<MedicalRecord>> {
        let found = self
            .records
            .find_by_diagnosis(term.trim())
            .await
            .map_err(ClinicError::database)?;
        Ok(most_recent_first(found))
    }

    pub async fn count_records(&self) -> ClinicResult<usize> {
        self.records.count().await.map_err(ClinicError::database)
    }

    async fn require_record(&self, id: Uuid) -> ClinicResult<MedicalRecord> {
        self.records
            .find_by_id(id)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Medical record", id))
    }

    async fn resolve_appointment(&self, appointment_id: Uuid) -> ClinicResult<Option<Uuid>> {
        let found = self
            .appointments
            .find_by_id(appointment_id)
            .await
            .map_err(ClinicError::database)?;

        if found.is_none() {
            warn!("Appointment {} not found, creating medical record unlinked", appointment_id);
        }
        Ok(found.map(|a| a.id))
    }

    async fn ensure_patient(&self, patient_id: Uuid) -> ClinicResult<()> {
        self.patients
            .find_by_id(patient_id)
            .await
            .map_err(ClinicError::database)?
            .map(|_| ())
            .ok_or_else(|| ClinicError::not_found("Patient", patient_id))
    }

    async fn ensure_doctor(&self, doctor_id: Uuid) -> ClinicResult<()> {
        self.doctors
            .find_by_id(doctor_id)
            .await
            .map_err(ClinicError::database)?
            .map(|_| ())
            .ok_or_else(|| ClinicError::not_found("Doctor", doctor_id))
    }
}

fn most_recent_first(mut records: Vec<MedicalRecord>) -> Vec<MedicalRecord> {
    records.sort_by(|a, b| b.visit_date.cmp(&a.visit_date).then_with(|| b.created_at.cmp(&a.created_at)));
    records
}
