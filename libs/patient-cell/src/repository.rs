use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use shared_database::{MemoryTable, Record};

use crate::models::Patient;

/// Persistence port for patients.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Next value of the atomic sequence behind public identifiers.
    async fn next_public_sequence(&self) -> Result<u64>;
    async fn create(&self, patient: Patient) -> Result<Patient>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>>;
    async fn find_by_public_id(&self, patient_id: &str) -> Result<Option<Patient>>;
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Patient>>;
    async fn find_all(&self) -> Result<Vec<Patient>>;
    /// `None` when the patient does not exist.
    async fn update(&self, patient: Patient) -> Result<Option<Patient>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn count(&self) -> Result<usize>;
}

impl Record for Patient {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub struct InMemoryPatientRepository {
    patients: MemoryTable<Patient>,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self {
            patients: MemoryTable::new("patients"),
        }
    }
}

impl Default for InMemoryPatientRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    async fn next_public_sequence(&self) -> Result<u64> {
        Ok(self.patients.next_sequence())
    }

    async fn create(&self, patient: Patient) -> Result<Patient> {
        self.patients.insert(patient).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>> {
        Ok(self.patients.get(id).await)
    }

    async fn find_by_public_id(&self, patient_id: &str) -> Result<Option<Patient>> {
        Ok(self.patients.find_first(|p| p.patient_id == patient_id).await)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Patient>> {
        Ok(self.patients.find_first(|p| p.user_id == user_id).await)
    }

    async fn find_all(&self) -> Result<Vec<Patient>> {
        Ok(self.patients.all().await)
    }

    async fn update(&self, patient: Patient) -> Result<Option<Patient>> {
        Ok(self.patients.replace(patient).await)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.patients.remove(id).await.is_some())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.patients.count().await)
    }
}
