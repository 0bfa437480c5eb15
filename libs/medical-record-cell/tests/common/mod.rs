use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use appointment_cell::{AppointmentBookingService, InMemoryAppointmentRepository};
use auth_cell::{Argon2CredentialHasher, IdentityService, InMemoryIdentityStore};
use doctor_cell::{DoctorProfile, DoctorService, InMemoryDoctorRepository};
use medical_record_cell::{ClinicalNotes, InMemoryMedicalRecordRepository, MedicalRecordService};
use patient_cell::{InMemoryPatientRepository, PatientProfile, PatientService};
use shared_models::Role;
use shared_utils::test_utils::{init_test_tracing, TestConfig, TestUser};

pub struct TestClinic {
    pub records: MedicalRecordService,
    pub booking: AppointmentBookingService,
    pub patients: PatientService,
    pub doctors: DoctorService,
}

impl TestClinic {
    pub fn new() -> Self {
        init_test_tracing();
        let config = TestConfig::default().to_app_config();

        let hasher = Arc::new(
            Argon2CredentialHasher::new(config.password_hash_memory_kib, config.password_hash_iterations)
                .expect("test hasher"),
        );
        let identities = IdentityService::new(Arc::new(InMemoryIdentityStore::new()), hasher);

        let patient_repo = Arc::new(InMemoryPatientRepository::new());
        let doctor_repo = Arc::new(InMemoryDoctorRepository::new());
        let appointment_repo = Arc::new(InMemoryAppointmentRepository::new());

        Self {
            records: MedicalRecordService::new(
                Arc::new(InMemoryMedicalRecordRepository::new()),
                patient_repo.clone(),
                doctor_repo.clone(),
                appointment_repo.clone(),
            ),
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
            date_of_birth: NaiveDate::from_ymd_opt(1965, 2, 20).expect("valid date"),
            gender: "Female".to_string(),
            address: None,
            emergency_contact: None,
            blood_group: None,
            allergies: Some("Latex".to_string()),
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
            specialization: "Endocrinology".to_string(),
            qualification: "MD, FRCPI".to_string(),
            experience_years: 15,
            department: "Diabetes Centre".to_string(),
            consultation_fee: 110.0,
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

pub fn notes(diagnosis: &str) -> ClinicalNotes {
    ClinicalNotes {
        diagnosis: diagnosis.to_string(),
        symptoms: Some("Fatigue, thirst".to_string()),
        treatment: Some("Diet review".to_string()),
        prescription: Some("Metformin 500mg".to_string()),
        test_results: Some("HbA1c 52 mmol/mol".to_string()),
        notes: None,
        visit_date: None,
    }
}
