use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use auth_cell::IdentityService;
use shared_models::{ClinicError, ClinicResult, ContactDetails, Credentials, PublicIdKind, Role, User};
use shared_utils::validation::{require_non_blank, validate_blood_group, validate_contact};

use crate::models::{Patient, PatientDetails, PatientProfile};
use crate::repository::PatientRepository;

#[derive(Clone)]
pub struct PatientService {
    patients: Arc<dyn PatientRepository>,
    identities: IdentityService,
}

impl PatientService {
    pub fn new(patients: Arc<dyn PatientRepository>, identities: IdentityService) -> Self {
        Self { patients, identities }
    }

    /// Creates the owned identity, then the patient referencing it. If the
    /// patient row cannot be stored the identity is removed again.
    pub async fn create_patient(
        &self,
        profile: PatientProfile,
        credentials: Credentials,
    ) -> ClinicResult<PatientDetails> {
        debug!("Creating patient for username {}", credentials.username);

        validate_profile(&profile)?;
        let user = self.identities.provision(&credentials, Role::Patient).await?;

        match self.insert_patient(&user, profile).await {
            Ok(patient) => {
                info!("Patient {} created with identity {}", patient.patient_id, user.id);
                Ok(PatientDetails { patient, user })
            }
            Err(e) => {
                warn!("Patient insert failed, removing identity {}: {}", user.id, e);
                if let Err(cleanup) = self.identities.remove(user.id).await {
                    error!("Failed to remove identity {} after aborted patient create: {}", user.id, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn insert_patient(&self, user: &User, profile: PatientProfile) -> ClinicResult<Patient> {
        let sequence = self
            .patients
            .next_public_sequence()
            .await
            .map_err(ClinicError::database)?;

        let now = Utc::now();
        let mut patient = Patient {
            id: Uuid::new_v4(),
            patient_id: PublicIdKind::Patient.format(sequence),
            user_id: user.id,
            date_of_birth: profile.date_of_birth,
            gender: String::new(),
            address: None,
            emergency_contact: None,
            blood_group: None,
            allergies: None,
            medical_history: None,
            created_at: now,
            updated_at: now,
        };
        patient.apply_profile(profile);

        self.patients.create(patient).await.map_err(ClinicError::database)
    }

    pub async fn get_patient(&self, id: Uuid) -> ClinicResult<PatientDetails> {
        let patient = self.require_patient(id).await?;
        self.with_identity(patient).await
    }

    pub async fn get_patient_by_public_id(&self, patient_id: &str) -> ClinicResult<PatientDetails> {
        let patient = self
            .patients
            .find_by_public_id(patient_id)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Patient", patient_id))?;
        self.with_identity(patient).await
    }

    pub async fn get_patient_by_user_id(&self, user_id: Uuid) -> ClinicResult<PatientDetails> {
        let patient = self
            .patients
            .find_by_user_id(user_id)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Patient for user", user_id))?;
        self.with_identity(patient).await
    }

    /// Bare patient row, for cells that only need to know it exists.
    pub async fn require_patient(&self, id: Uuid) -> ClinicResult<Patient> {
        self.patients
            .find_by_id(id)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Patient", id))
    }

    pub async fn list_patients(&self) -> ClinicResult<Vec<PatientDetails>> {
        let patients = self.patients.find_all().await.map_err(ClinicError::database)?;
        self.with_identities(patients).await
    }

    pub async fn list_active_patients(&self) -> ClinicResult<Vec<PatientDetails>> {
        let all = self.list_patients().await?;
        Ok(all.into_iter().filter(|p| p.user.active).collect())
    }

    /// Case-insensitive substring match over first and last name.
    pub async fn search_patients_by_name(&self, name: &str) -> ClinicResult<Vec<PatientDetails>> {
        let needle = name.trim().to_lowercase();
        let all = self.list_patients().await?;
        Ok(all
            .into_iter()
            .filter(|p| {
                p.user.first_name.to_lowercase().contains(&needle)
                    || p.user.last_name.to_lowercase().contains(&needle)
            })
            .collect())
    }

    pub async fn count_patients(&self) -> ClinicResult<usize> {
        self.patients.count().await.map_err(ClinicError::database)
    }

    /// Overwrites the profile and the identity's contact fields. Both inputs
    /// are validated before anything is written; if the identity update
    /// fails the previous profile is restored.
    pub async fn update_patient(
        &self,
        id: Uuid,
        profile: PatientProfile,
        contact: ContactDetails,
    ) -> ClinicResult<PatientDetails> {
        debug!("Updating patient {}", id);

        let existing = self.require_patient(id).await?;
        validate_profile(&profile)?;
        validate_contact(&contact.first_name, &contact.last_name, &contact.email)?;

        let mut patient = existing.clone();
        patient.apply_profile(profile);
        patient.updated_at = Utc::now();

        let patient = self
            .patients
            .update(patient)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("Patient", id))?;

        match self.identities.update_contact(patient.user_id, &contact).await {
            Ok(user) => {
                info!("Patient {} updated", patient.patient_id);
                Ok(PatientDetails { patient, user })
            }
            Err(e) => {
                warn!("Identity update failed for patient {}, restoring profile: {}", id, e);
                if let Err(restore) = self.patients.update(existing).await {
                    error!("Failed to restore patient {} after aborted update: {}", id, restore);
                }
                Err(e)
            }
        }
    }

    /// Deletes the patient, then its identity. Unknown ids are a no-op.
    pub async fn delete_patient(&self, id: Uuid) -> ClinicResult<()> {
        let Some(patient) = self
            .patients
            .find_by_id(id)
            .await
            .map_err(ClinicError::database)?
        else {
            debug!("Patient {} already absent, nothing to delete", id);
            return Ok(());
        };

        self.patients.delete(id).await.map_err(ClinicError::database)?;

        match self.identities.remove(patient.user_id).await {
            Ok(_) => {
                info!("Patient {} and identity {} deleted", patient.patient_id, patient.user_id);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Patient {} deleted but identity {} could not be removed: {}",
                    patient.patient_id, patient.user_id, e
                );
                Err(ClinicError::PartialDelete {
                    entity: "patient".to_string(),
                    entity_id: id,
                    orphaned_user_id: patient.user_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn with_identity(&self, patient: Patient) -> ClinicResult<PatientDetails> {
        let user = self.identities.find_optional(patient.user_id).await?.ok_or_else(|| {
            ClinicError::Database(format!(
                "patient {} references missing identity {}",
                patient.patient_id, patient.user_id
            ))
        })?;
        Ok(PatientDetails { patient, user })
    }

    async fn with_identities(&self, mut patients: Vec<Patient>) -> ClinicResult<Vec<PatientDetails>> {
        patients.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.patient_id.cmp(&b.patient_id)));

        let mut details = Vec::with_capacity(patients.len());
        for patient in patients {
            details.push(self.with_identity(patient).await?);
        }
        Ok(details)
    }
}

fn validate_profile(profile: &PatientProfile) -> ClinicResult<()> {
    require_non_blank("gender", &profile.gender)?;
    if profile.date_of_birth > Utc::now().date_naive() {
        return Err(ClinicError::Validation("date_of_birth is in the future".to_string()));
    }
    validate_blood_group(profile.blood_group.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile() -> PatientProfile {
        PatientProfile {
            date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 2).unwrap(),
            gender: "Female".to_string(),
            address: None,
            emergency_contact: None,
            blood_group: Some("A+".to_string()),
            allergies: None,
            medical_history: None,
        }
    }

    #[test]
    fn profile_requires_gender() {
        let mut p = profile();
        p.gender = " ".to_string();
        assert!(matches!(validate_profile(&p), Err(ClinicError::Validation(_))));
    }

    #[test]
    fn profile_rejects_future_birth_date() {
        let mut p = profile();
        p.date_of_birth = Utc::now().date_naive() + chrono::Duration::days(2);
        assert!(matches!(validate_profile(&p), Err(ClinicError::Validation(_))));
    }

    #[test]
    fn profile_accepts_complete_input() {
        assert!(validate_profile(&profile()).is_ok());
    }
}
