use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::DoctorRepository;
use patient_cell::PatientRepository;
use shared_config::AppConfig;
use shared_database::GuardedWrite;
use shared_models::{ClinicError, ClinicResult};
use shared_utils::validation::{require_non_blank, utc_day_bounds, validate_instant_range};

use crate::models::{Appointment, AppointmentStatus, AppointmentUpdate};
use crate::repository::AppointmentRepository;
use crate::services::conflict::ConflictWindow;
use crate::services::lifecycle::AppointmentLifecycleService;

const DOCTOR_UNAVAILABLE: &str = "doctor unavailable at this time";

#[derive(Clone)]
pub struct AppointmentBookingService {
    appointments: Arc<dyn AppointmentRepository>,
    patients: Arc<dyn PatientRepository>,
    doctors: Arc<dyn DoctorRepository>,
    window: ConflictWindow,
    lifecycle: AppointmentLifecycleService,
    recheck_on_reschedule: bool,
}

impl AppointmentBookingService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        patients: Arc<dyn PatientRepository>,
        doctors: Arc<dyn DoctorRepository>,
        config: &AppConfig,
    ) -> Self {
        Self {
            appointments,
            patients,
            doctors,
            window: ConflictWindow::from_config(config),
            lifecycle: AppointmentLifecycleService::new(config.enforce_status_transitions),
            recheck_on_reschedule: config.recheck_conflicts_on_reschedule,
        }
    }

    /// Book a SCHEDULED appointment. The doctor's conflict search and the
    /// insert are one atomic repository call.
    pub async fn create_appointment(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        scheduled_at: DateTime<Utc>,
        reason: &str,
    ) -> ClinicResult<Appointment> {
        debug!("Booking doctor {} for patient {} at {}", doctor_id, patient_id, scheduled_at);

        self.ensure_patient(patient_id).await?;
        self.ensure_doctor(doctor_id).await?;
        require_non_blank("reason", reason)?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            scheduled_at,
            reason: reason.trim().to_string(),
            status: AppointmentStatus::Scheduled,
            notes: None,
            prescription: None,
            created_at: now,
            updated_at: now,
        };

        match self
            .appointments
            .create_if_vacant(appointment, self.window)
            .await
            .map_err(ClinicError::database)?
        {
            GuardedWrite::Written(appointment) => {
                info!("Appointment {} booked for doctor {} at {}", appointment.id, doctor_id, scheduled_at);
                Ok(appointment)
            }
            GuardedWrite::Blocked(conflicts) => {
                warn!(
                    "Doctor {} unavailable at {}: {} conflicting appointments",
                    doctor_id,
                    scheduled_at,
                    conflicts.len()
                );
                Err(ClinicError::Conflict(DOCTOR_UNAVAILABLE.to_string()))
            }
            GuardedWrite::Missing => Err(ClinicError::Database(
                "appointment store reported a missing row on insert".to_string(),
            )),
        }
    }

    /// Full replacement of date-time, reason, status, notes and prescription.
    /// Status changes follow the lifecycle rules; the conflict check is only
    /// repeated when rechecking is configured.
    pub async fn update_appointment(&self, id: Uuid, update: AppointmentUpdate) -> ClinicResult<Appointment> {
        debug!("Updating appointment {}", id);

        let existing = self.require_appointment(id).await?;
        require_non_blank("reason", &update.reason)?;
        self.lifecycle.validate_status_transition(existing.status, update.status)?;

        let mut appointment = existing;
        appointment.scheduled_at = update.scheduled_at;
        appointment.reason = update.reason.trim().to_string();
        appointment.status = update.status;
        appointment.notes = update.notes;
        appointment.prescription = update.prescription;
        appointment.updated_at = Utc::now();

        let appointment = if self.recheck_on_reschedule && appointment.status.holds_slot() {
            let (doctor_id, at) = (appointment.doctor_id, appointment.scheduled_at);
            match self
                .appointments
                .update_if_vacant(appointment, self.window)
                .await
                .map_err(ClinicError::database)?
            {
                GuardedWrite::Written(appointment) => appointment,
                GuardedWrite::Blocked(conflicts) => {
                    warn!(
                        "Reschedule of {} rejected, doctor {} has {} conflicting appointments at {}",
                        id,
                        doctor_id,
                        conflicts.len(),
                        at
                    );
                    return Err(ClinicError::Conflict(DOCTOR_UNAVAILABLE.to_string()));
                }
                GuardedWrite::Missing => return Err(ClinicError::not_found("Appointment", id)),
            }
        } else {
            self.appointments
                .update(appointment)
                .await
                .map_err(ClinicError::database)?
                .ok_or_else(|| ClinicError::not_found("Appointment", id))?
        };

        info!("Appointment {} updated", id);
        Ok(appointment)
    }

    pub async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> ClinicResult<Appointment> {
        let mut appointment = self.require_appointment(id).await?;
        if appointment.status == status {
            debug!("Appointment {} already {}", id, status);
            return Ok(appointment);
        }

        self.lifecycle.validate_status_transition(appointment.status, status)?;

        let previous = appointment.status;
        appointment.status = status;
        appointment.updated_at = Utc::now();

        let appointment = self
            .appointments
            .update(appointment)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Appointment", id))?;

        info!("Appointment {} moved from {} to {}", id, previous, status);
        Ok(appointment)
    }

    /// Hard delete; unknown ids are a no-op.
    pub async fn delete_appointment(&self, id: Uuid) -> ClinicResult<()> {
        let removed = self.appointments.delete(id).await.map_err(ClinicError::database)?;
        if removed {
            info!("Appointment {} deleted", id);
        } else {
            debug!("Appointment {} already absent", id);
        }
        Ok(())
    }

    pub async fn get_appointment(&self, id: Uuid) -> ClinicResult<Appointment> {
        self.require_appointment(id).await
    }

    pub async fn list_appointments(&self) -> ClinicResult<Vec<Appointment>> {
        let all = self.appointments.find_all().await.map_err(ClinicError::database)?;
        Ok(chronological(all))
    }

    pub async fn list_by_patient(&self, patient_id: Uuid) -> ClinicResult<Vec<Appointment>> {
        let found = self
            .appointments
            .find_by_patient(patient_id)
            .await
            .map_err(ClinicError::database)?;
        Ok(chronological(found))
    }

    pub async fn list_by_doctor(&self, doctor_id: Uuid) -> ClinicResult<Vec<Appointment>> {
        let found = self
            .appointments
            .find_by_doctor(doctor_id)
            .await
            .map_err(ClinicError::database)?;
        Ok(chronological(found))
    }

    pub async fn list_by_status(&self, status: AppointmentStatus) -> ClinicResult<Vec<Appointment>> {
        let found = self
            .appointments
            .find_by_status(status)
            .await
            .map_err(ClinicError::database)?;
        Ok(chronological(found))
    }

    /// Every appointment on the UTC calendar days `start..=end`.
    pub async fn list_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> ClinicResult<Vec<Appointment>> {
        let (from, to) = utc_day_bounds(start, end)?;
        let found = self
            .appointments
            .find_between(from, to)
            .await
            .map_err(ClinicError::database)?;
        Ok(chronological(found))
    }

    /// Appointments whose scheduled time falls on today's date in the
    /// server's local time zone, whatever their status.
    pub async fn todays_appointments(&self) -> ClinicResult<Vec<Appointment>> {
        let today = Local::now().date_naive();
        let all = self.appointments.find_all().await.map_err(ClinicError::database)?;
        Ok(chronological(
            all.into_iter()
                .filter(|a| a.scheduled_at.with_timezone(&Local).date_naive() == today)
                .collect(),
        ))
    }

    pub async fn find_by_patient_in_range(
        &self,
        patient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ClinicResult<Vec<Appointment>> {
        validate_instant_range(start, end)?;
        let found = self
            .appointments
            .find_by_patient_between(patient_id, start, end)
            .await
            .map_err(ClinicError::database)?;
        Ok(chronological(found))
    }

    /// Appointments that would block booking `doctor_id` at `at`; empty
    /// means the slot is free. Nothing is written.
    pub async fn check_availability(&self, doctor_id: Uuid, at: DateTime<Utc>) -> ClinicResult<Vec<Appointment>> {
        self.ensure_doctor(doctor_id).await?;
        let conflicts = self
            .appointments
            .find_conflicts(doctor_id, at, self.window)
            .await
            .map_err(ClinicError::database)?;
        Ok(chronological(conflicts))
    }

    pub async fn count_appointments(&self) -> ClinicResult<usize> {
        self.appointments.count().await.map_err(ClinicError::database)
    }

    async fn require_appointment(&self, id: Uuid) -> ClinicResult<Appointment> {
        self.appointments
            .find_by_id(id)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Appointment", id))
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

fn chronological(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then_with(|| a.created_at.cmp(&b.created_at)));
    appointments
}
