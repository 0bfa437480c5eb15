use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use appointment_cell::{AppointmentBookingService, InMemoryAppointmentRepository};
use auth_cell::{Argon2CredentialHasher, IdentityService, InMemoryIdentityStore};
use doctor_cell::{DoctorProfile, DoctorService, InMemoryDoctorRepository};
use patient_cell::{InMemoryPatientRepository, PatientProfile, PatientService};
use shared_models::Role;
use shared_utils::test_utils::{init_test_tracing, TestConfig, TestUser};

pub struct TestClinic {
    pub booking: AppointmentBookingService,
    pub patients: PatientService,
    pub doctors: DoctorService,
}

impl TestClinic {
    pub fn new(config: TestConfig) -> Self {
        init_test_tracing();
        let config = config.to_app_config();

        let hasher = Arc::new(
            Argon2CredentialHasher::new(config.password_hash_memory_kib, config.password_hash_iterations)
                .expect("test hasher"),
        );
        let identities = IdentityService::new(Arc::new(InMemoryIdentityStore::new()), hasher);

        let patient_repo = Arc::new(InMemoryPatientRepository::new());
        let doctor_repo = Arc::new(InMemoryDoctorRepository::new());
        let appointment_repo = Arc::new(InMemoryAppointmentRepository::new());

        Self {
            booking: AppointmentBookingService::new(
                appointment_repo,
                patient_repo.clone(),
                doctor_repo.clone(),
                &config,
            ),
            patients: PatientService::new(patient_repo, identities.clone()),
            doctors: DoctorService::new(doctor_repo, identities),
        }
    }

    pub async fn add_patient(&self) -> Uuid {
        let profile = PatientProfile {
            date_of_birth: NaiveDate::from_ymd_opt(1979, 11, 3).expect("valid date"),
            gender: "Male".to_string(),
            address: None,
            emergency_contact: None,
            blood_group: Some("B-".to_string()),
            allergies: None,
            medical_history: None,
        };
        self.patients
            .create_patient(profile, TestUser::unique(Role::Patient).to_credentials())
            .await
            .expect("seed patient")
            .patient
            .id
    }

    pub async fn add_doctor(&self) -> Uuid {
        let profile = DoctorProfile {
            specialization: "General Practice".to_string(),
            qualification: "MICGP".to_string(),
            experience_years: 4,
            department: "Primary Care".to_string(),
            consultation_fee: 60.0,
            working_hours: None,
            available: true,
        };
        self.doctors
            .create_doctor(profile, TestUser::unique(Role::Doctor).to_credentials())
            .await
            .expect("seed doctor")
            .doctor
            .id
    }
}
