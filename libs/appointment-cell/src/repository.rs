use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_database::{GuardedWrite, MemoryTable, Record};

use crate::models::{Appointment, AppointmentStatus};
use crate::services::conflict::ConflictWindow;

/// Persistence port for appointments.
///
/// The guarded writes run the doctor's conflict search and the write as one
/// atomic step; two callers racing for the same slot can never both succeed.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Inserts unless a slot-holding appointment of the same doctor falls
    /// inside `window` around the new one. Blocking rows are returned.
    async fn create_if_vacant(
        &self,
        appointment: Appointment,
        window: ConflictWindow,
    ) -> Result<GuardedWrite<Appointment>>;
    /// Like `create_if_vacant`, for an existing row; the row itself never
    /// counts as a conflict.
    async fn update_if_vacant(
        &self,
        appointment: Appointment,
        window: ConflictWindow,
    ) -> Result<GuardedWrite<Appointment>>;
    async fn update(&self, appointment: Appointment) -> Result<Option<Appointment>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>>;
    async fn find_all(&self) -> Result<Vec<Appointment>>;
    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>>;
    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>>;
    async fn find_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>>;
    /// Both bounds inclusive.
    async fn find_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Appointment>>;
    async fn find_by_patient_between(
        &self,
        patient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>>;
    /// Read-only version of the guarded search.
    async fn find_conflicts(
        &self,
        doctor_id: Uuid,
        at: DateTime<Utc>,
        window: ConflictWindow,
    ) -> Result<Vec<Appointment>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn count(&self) -> Result<usize>;
}

impl Record for Appointment {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub struct InMemoryAppointmentRepository {
    appointments: MemoryTable<Appointment>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self {
            appointments: MemoryTable::new("appointments"),
        }
    }
}

impl Default for InMemoryAppointmentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn create_if_vacant(
        &self,
        appointment: Appointment,
        window: ConflictWindow,
    ) -> Result<GuardedWrite<Appointment>> {
        let (doctor_id, at) = (appointment.doctor_id, appointment.scheduled_at);
        self.appointments
            .insert_unless(appointment, |existing| window.blocks(doctor_id, at, existing))
            .await
    }

    async fn update_if_vacant(
        &self,
        appointment: Appointment,
        window: ConflictWindow,
    ) -> Result<GuardedWrite<Appointment>> {
        let (doctor_id, at) = (appointment.doctor_id, appointment.scheduled_at);
        Ok(self
            .appointments
            .replace_unless(appointment, |existing| window.blocks(doctor_id, at, existing))
            .await)
    }

    async fn update(&self, appointment: Appointment) -> Result<Option<Appointment>> {
        Ok(self.appointments.replace(appointment).await)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.appointments.get(id).await)
    }

    async fn find_all(&self) -> Result<Vec<Appointment>> {
        Ok(self.appointments.all().await)
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>> {
        Ok(self.appointments.filter(|a| a.patient_id == patient_id).await)
    }

    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>> {
        Ok(self.appointments.filter(|a| a.doctor_id == doctor_id).await)
    }

    async fn find_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>> {
        Ok(self.appointments.filter(|a| a.status == status).await)
    }

    async fn find_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Appointment>> {
        Ok(self
            .appointments
            .filter(|a| a.scheduled_at >= start && a.scheduled_at <= end)
            .await)
    }

    async fn find_by_patient_between(
        &self,
        patient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        Ok(self
            .appointments
            .filter(|a| a.patient_id == patient_id && a.scheduled_at >= start && a.scheduled_at <= end)
            .await)
    }

    async fn find_conflicts(
        &self,
        doctor_id: Uuid,
        at: DateTime<Utc>,
        window: ConflictWindow,
    ) -> Result<Vec<Appointment>> {
        Ok(self
            .appointments
            .filter(|a| window.blocks(doctor_id, at, a))
            .await)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.appointments.remove(id).await.is_some())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.appointments.count().await)
    }
}
