use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use appointment_cell::{AppointmentBookingService, InMemoryAppointmentRepository};
use auth_cell::{Argon2CredentialHasher, IdentityService, InMemoryIdentityStore};
use doctor_cell::{DoctorService, InMemoryDoctorRepository};
use medical_record_cell::{InMemoryMedicalRecordRepository, MedicalRecordService};
use patient_cell::{InMemoryPatientRepository, PatientService};
use shared_config::AppConfig;
use shared_utils::telemetry::init_tracing;

/// Every cell's service, wired against one set of repositories.
#[derive(Clone)]
pub struct Clinic {
    pub config: Arc<AppConfig>,
    pub identities: IdentityService,
    pub patients: PatientService,
    pub doctors: DoctorService,
    pub appointments: AppointmentBookingService,
    pub records: MedicalRecordService,
}

impl Clinic {
    /// Wires all cells to the in-memory adapters.
    pub fn in_memory(config: Arc<AppConfig>) -> Result<Self> {
        let hasher = Arc::new(Argon2CredentialHasher::from_config(&config)?);
        let identities = IdentityService::new(Arc::new(InMemoryIdentityStore::new()), hasher);

        let patient_repo = Arc::new(InMemoryPatientRepository::new());
        let doctor_repo = Arc::new(InMemoryDoctorRepository::new());
        let appointment_repo = Arc::new(InMemoryAppointmentRepository::new());
        let record_repo = Arc::new(InMemoryMedicalRecordRepository::new());

        let appointments = AppointmentBookingService::new(
            appointment_repo.clone(),
            patient_repo.clone(),
            doctor_repo.clone(),
            &config,
        );
        let records = MedicalRecordService::new(
            record_repo,
            patient_repo.clone(),
            doctor_repo.clone(),
            appointment_repo,
        );

        debug!("Clinic cells wired to in-memory storage");

        Ok(Self {
            patients: PatientService::new(patient_repo, identities.clone()),
            doctors: DoctorService::new(doctor_repo, identities.clone()),
            identities,
            appointments,
            records,
            config,
        })
    }
}

/// Loads configuration from the environment, installs the tracing
/// subscriber and wires the cells. Embedding layers call this once.
pub fn bootstrap() -> Result<Clinic> {
    let config = AppConfig::from_env();

    if !init_tracing(&config) {
        debug!("Tracing subscriber already installed, keeping it");
    }

    info!(
        "Starting clinic core (conflict window {} min, transitions enforced: {}, reschedule recheck: {})",
        config.conflict_window_minutes,
        config.enforce_status_transitions,
        config.recheck_conflicts_on_reschedule
    );

    Clinic::in_memory(Arc::new(config))
}
