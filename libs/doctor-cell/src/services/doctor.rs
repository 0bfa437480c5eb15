use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use auth_cell::IdentityService;
use shared_models::{ClinicError, ClinicResult, ContactDetails, Credentials, PublicIdKind, Role, User};
use shared_utils::validation::{require_non_blank, require_non_negative, validate_contact};

use crate::models::{Doctor, DoctorDetails, DoctorProfile};
use crate::repository::DoctorRepository;

#[derive(Clone)]
pub struct DoctorService {
    doctors: Arc<dyn DoctorRepository>,
    identities: IdentityService,
}

impl DoctorService {
    pub fn new(doctors: Arc<dyn DoctorRepository>, identities: IdentityService) -> Self {
        Self { doctors, identities }
    }

    /// Create a doctor together with its DOCTOR identity
    pub async fn create_doctor(
        &self,
        profile: DoctorProfile,
        credentials: Credentials,
    ) -> ClinicResult<DoctorDetails> {
        debug!("Creating doctor for username {}", credentials.username);

        validate_profile(&profile)?;
        let user = self.identities.provision(&credentials, Role::Doctor).await?;

        match self.insert_doctor(&user, profile).await {
            Ok(doctor) => {
                info!("Doctor {} created with identity {}", doctor.doctor_id, user.id);
                Ok(DoctorDetails { doctor, user })
            }
            Err(e) => {
                warn!("Doctor insert failed, removing identity {}: {}", user.id, e);
                if let Err(cleanup) = self.identities.remove(user.id).await {
                    error!("Failed to remove identity {} after aborted doctor create: {}", user.id, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn insert_doctor(&self, user: &User, profile: DoctorProfile) -> ClinicResult<Doctor> {
        let sequence = self
            .doctors
            .next_public_sequence()
            .await
            .map_err(ClinicError::database)?;

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            doctor_id: PublicIdKind::Doctor.format(sequence),
            user_id: user.id,
            specialization: profile.specialization,
            qualification: profile.qualification,
            experience_years: profile.experience_years,
            department: profile.department,
            consultation_fee: profile.consultation_fee,
            working_hours: profile.working_hours,
            available: profile.available,
            created_at: now,
            updated_at: now,
        };

        self.doctors.create(doctor).await.map_err(ClinicError::database)
    }

    pub async fn get_doctor(&self, id: Uuid) -> ClinicResult<DoctorDetails> {
        let doctor = self.require_doctor(id).await?;
        self.with_identity(doctor).await
    }

    pub async fn get_doctor_by_public_id(&self, doctor_id: &str) -> ClinicResult<DoctorDetails> {
        let doctor = self
            .doctors
            .find_by_public_id(doctor_id)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Doctor", doctor_id))?;
        self.with_identity(doctor).await
    }

    pub async fn get_doctor_by_user_id(&self, user_id: Uuid) -> ClinicResult<DoctorDetails> {
        let doctor = self
            .doctors
            .find_by_user_id(user_id)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Doctor for user", user_id))?;
        self.with_identity(doctor).await
    }

    pub async fn require_doctor(&self, id: Uuid) -> ClinicResult<Doctor> {
        self.doctors
            .find_by_id(id)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Doctor", id))
    }

    pub async fn list_doctors(&self) -> ClinicResult<Vec<DoctorDetails>> {
        let doctors = self.doctors.find_all().await.map_err(ClinicError::database)?;
        self.with_identities(doctors).await
    }

    pub async fn list_active_doctors(&self) -> ClinicResult<Vec<DoctorDetails>> {
        let all = self.list_doctors().await?;
        Ok(all.into_iter().filter(|d| d.user.active).collect())
    }

    /// Exact, case-insensitive match on specialization.
    pub async fn list_by_specialization(&self, specialization: &str) -> ClinicResult<Vec<DoctorDetails>> {
        let doctors = self
            .doctors
            .find_by_specialization(specialization.trim())
            .await
            .map_err(ClinicError::database)?;
        self.with_identities(doctors).await
    }

    pub async fn list_by_department(&self, department: &str) -> ClinicResult<Vec<DoctorDetails>> {
        let doctors = self
            .doctors
            .find_by_department(department.trim())
            .await
            .map_err(ClinicError::database)?;
        self.with_identities(doctors).await
    }

    pub async fn list_available(&self) -> ClinicResult<Vec<DoctorDetails>> {
        let doctors = self.doctors.find_available().await.map_err(ClinicError::database)?;
        self.with_identities(doctors).await
    }

    pub async fn search_doctors_by_name(&self, name: &str) -> ClinicResult<Vec<DoctorDetails>> {
        let needle = name.trim().to_lowercase();
        let all = self.list_doctors().await?;
        Ok(all
            .into_iter()
            .filter(|d| {
                d.user.first_name.to_lowercase().contains(&needle)
                    || d.user.last_name.to_lowercase().contains(&needle)
            })
            .collect())
    }

    pub async fn count_doctors(&self) -> ClinicResult<usize> {
        self.doctors.count().await.map_err(ClinicError::database)
    }

    /// Overwrites the profile and the identity's contact fields; restores the
    /// previous profile if the identity update fails.
    pub async fn update_doctor(
        &self,
        id: Uuid,
        profile: DoctorProfile,
        contact: ContactDetails,
    ) -> ClinicResult<DoctorDetails> {
        debug!("Updating doctor {}", id);

        let existing = self.require_doctor(id).await?;
        validate_profile(&profile)?;
        validate_contact(&contact.first_name, &contact.last_name, &contact.email)?;

        let mut doctor = existing.clone();
        doctor.apply_profile(profile);
        doctor.updated_at = Utc::now();

        let doctor = self
            .doctors
            .update(doctor)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Doctor", id))?;

        match self.identities.update_contact(doctor.user_id, &contact).await {
            Ok(user) => {
                info!("Doctor {} updated", doctor.doctor_id);
                Ok(DoctorDetails { doctor, user })
            }
            Err(e) => {
                warn!("Identity update failed for doctor {}, restoring profile: {}", id, e);
                if let Err(restore) = self.doctors.update(existing).await {
                    error!("Failed to restore doctor {} after aborted update: {}", id, restore);
                }
                Err(e)
            }
        }
    }

    pub async fn set_doctor_availability(&self, id: Uuid, available: bool) -> ClinicResult<Doctor> {
        let mut doctor = self.require_doctor(id).await?;
        if doctor.available == available {
            return Ok(doctor);
        }

        doctor.available = available;
        doctor.updated_at = Utc::now();

        let doctor = self
            .doctors
            .update(doctor)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Doctor", id))?;

        info!("Doctor {} availability set to {}", doctor.doctor_id, available);
        Ok(doctor)
    }

    /// Deletes the doctor, then its identity. Unknown ids are a no-op.
    pub async fn delete_doctor(&self, id: Uuid) -> ClinicResult<()> {
        let Some(doctor) = self
            .doctors
            .find_by_id(id)
            .await
            .map_err(ClinicError::database)?
        else {
            debug!("Doctor {} already absent, nothing to delete", id);
            return Ok(());
        };

        self.doctors.delete(id).await.map_err(ClinicError::database)?;

        if let Err(e) = self.identities.remove(doctor.user_id).await {
            error!(
                "Doctor {} deleted but identity {} could not be removed: {}",
                doctor.doctor_id, doctor.user_id, e
            );
            return Err(ClinicError::PartialDelete {
                entity: "doctor".to_string(),
                entity_id: id,
                orphaned_user_id: doctor.user_id,
                reason: e.to_string(),
            });
        }

        info!("Doctor {} and identity {} deleted", doctor.doctor_id, doctor.user_id);
        Ok(())
    }

    async fn with_identity(&self, doctor: Doctor) -> ClinicResult<DoctorDetails> {
        let user = self.identities.find_optional(doctor.user_id).await?.ok_or_else(|| {
            ClinicError::Database(format!(
                "doctor {} references missing identity {}",
                doctor.doctor_id, doctor.user_id
            ))
        })?;
        Ok(DoctorDetails { doctor, user })
    }

    async fn with_identities(&self, mut doctors: Vec<Doctor>) -> ClinicResult<Vec<DoctorDetails>> {
        doctors.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.doctor_id.cmp(&b.doctor_id)));

        let mut details = Vec::with_capacity(doctors.len());
        for doctor in doctors {
            details.push(self.with_identity(doctor).await?);
        }
        Ok(details)
    }
}

fn validate_profile(profile: &DoctorProfile) -> ClinicResult<()> {
    require_non_blank("specialization", &profile.specialization)?;
    require_non_blank("qualification", &profile.qualification)?;
    require_non_blank("department", &profile.department)?;
    require_non_negative("consultation_fee", profile.consultation_fee)
}
