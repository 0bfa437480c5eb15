use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_database::{GuardedWrite, MemoryTable, Record};

use crate::models::MedicalRecord;

/// Persistence port for medical records.
#[async_trait]
pub trait MedicalRecordRepository: Send + Sync {
    /// Inserts the record unless another record already references the same
    /// appointment. Unlinked records are always written.
    async fn create_unless_linked(&self, record: MedicalRecord) -> Result<GuardedWrite<MedicalRecord>>;
    async fn update(&self, record: MedicalRecord) -> Result<Option<MedicalRecord>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<MedicalRecord>>;
    async fn find_all(&self) -> Result<Vec<MedicalRecord>>;
    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<MedicalRecord>>;
    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<MedicalRecord>>;
    async fn find_by_appointment(&self, appointment_id: Uuid) -> Result<Option<MedicalRecord>>;
    /// Both bounds inclusive.
    async fn find_visits_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<MedicalRecord>>;
    /// Case-insensitive substring match on diagnosis.
    async fn find_by_diagnosis(&self, term: &str) -> Result<Vec<MedicalRecord>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn count(&self) -> Result<usize>;
}

impl Record for MedicalRecord {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub struct InMemoryMedicalRecordRepository {
    records: MemoryTable<MedicalRecord>,
}

impl InMemoryMedicalRecordRepository {
    pub fn new() -> Self {
        Self {
            records: MemoryTable::new("medical_records"),
        }
    }
}

impl Default for InMemoryMedicalRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MedicalRecordRepository for InMemoryMedicalRecordRepository {
    async fn create_unless_linked(&self, record: MedicalRecord) -> Result<GuardedWrite<MedicalRecord>> {
        match record.appointment_id {
            Some(appointment_id) => {
                self.records
                    .insert_unless(record, |existing| existing.appointment_id == Some(appointment_id))
                    .await
            }
            None => self.records.insert(record).await.map(GuardedWrite::Written),
        }
    }

    async fn update(&self, record: MedicalRecord) -> Result<Option<MedicalRecord>> {
        Ok(self.records.replace(record).await)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MedicalRecord>> {
        Ok(self.records.get(id).await)
    }

    async fn find_all(&self) -> Result<Vec<MedicalRecord>> {
        Ok(self.records.all().await)
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<MedicalRecord>> {
        Ok(self.records.filter(|r| r.patient_id == patient_id).await)
    }

    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<MedicalRecord>> {
        Ok(self.records.filter(|r| r.doctor_id == doctor_id).await)
    }

    async fn find_by_appointment(&self, appointment_id: Uuid) -> Result<Option<MedicalRecord>> {
        Ok(self
            .records
            .find_first(|r| r.appointment_id == Some(appointment_id))
            .await)
    }

    async fn find_visits_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<MedicalRecord>> {
        Ok(self
            .records
            .filter(|r| r.visit_date >= start && r.visit_date <= end)
            .await)
    }

    async fn find_by_diagnosis(&self, term: &str) -> Result<Vec<MedicalRecord>> {
        let term = term.to_lowercase();
        Ok(self
            .records
            .filter(|r| r.diagnosis.to_lowercase().contains(&term))
            .await)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.records.remove(id).await.is_some())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.count().await)
    }
}
