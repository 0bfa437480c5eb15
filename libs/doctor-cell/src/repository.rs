use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use shared_database::{MemoryTable, Record};

use crate::models::Doctor;

/// Persistence port for doctors.
#[async_trait]
pub trait DoctorRepository: Send + Sync {
    async fn next_public_sequence(&self) -> Result<u64>;
    async fn create(&self, doctor: Doctor) -> Result<Doctor>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Doctor>>;
    async fn find_by_public_id(&self, doctor_id: &str) -> Result<Option<Doctor>>;
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Doctor>>;
    async fn find_by_specialization(&self, specialization: &str) -> Result<Vec<Doctor>>;
    async fn find_by_department(&self, department: &str) -> Result<Vec<Doctor>>;
    async fn find_available(&self) -> Result<Vec<Doctor>>;
    async fn find_all(&self) -> Result<Vec<Doctor>>;
    async fn update(&self, doctor: Doctor) -> Result<Option<Doctor>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn count(&self) -> Result<usize>;
}

impl Record for Doctor {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub struct InMemoryDoctorRepository {
    doctors: MemoryTable<Doctor>,
}

impl InMemoryDoctorRepository {
    pub fn new() -> Self {
        Self {
            doctors: MemoryTable::new("doctors"),
        }
    }
}

impl Default for InMemoryDoctorRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DoctorRepository for InMemoryDoctorRepository {
    async fn next_public_sequence(&self) -> Result<u64> {
        Ok(self.doctors.next_sequence())
    }

    async fn create(&self, doctor: Doctor) -> Result<Doctor> {
        self.doctors.insert(doctor).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Doctor>> {
        Ok(self.doctors.get(id).await)
    }

    async fn find_by_public_id(&self, doctor_id: &str) -> Result<Option<Doctor>> {
        Ok(self.doctors.find_first(|d| d.doctor_id == doctor_id).await)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Doctor>> {
        Ok(self.doctors.find_first(|d| d.user_id == user_id).await)
    }

    async fn find_by_specialization(&self, specialization: &str) -> Result<Vec<Doctor>> {
        Ok(self
            .doctors
            .filter(|d| d.specialization.eq_ignore_ascii_case(specialization))
            .await)
    }

    async fn find_by_department(&self, department: &str) -> Result<Vec<Doctor>> {
        Ok(self
            .doctors
            .filter(|d| d.department.eq_ignore_ascii_case(department))
            .await)
    }

    async fn find_available(&self) -> Result<Vec<Doctor>> {
        Ok(self.doctors.filter(|d| d.available).await)
    }

    async fn find_all(&self) -> Result<Vec<Doctor>> {
        Ok(self.doctors.all().await)
    }

    async fn update(&self, doctor: Doctor) -> Result<Option<Doctor>> {
        Ok(self.doctors.replace(doctor).await)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.doctors.remove(id).await.is_some())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.doctors.count().await)
    }
}
