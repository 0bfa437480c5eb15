use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use auth_cell::{Argon2CredentialHasher, IdentityService, IdentityStore, InMemoryIdentityStore};
use patient_cell::{InMemoryPatientRepository, Patient, PatientProfile, PatientRepository, PatientService};
use shared_database::GuardedWrite;
use shared_models::{NewIdentity, User};
use shared_utils::test_utils::init_test_tracing;

/// Identity store whose deletes can be switched to fail.
#[derive(Default)]
pub struct FlakyIdentityStore {
    inner: InMemoryIdentityStore,
    pub fail_deletes: AtomicBool,
}

#[async_trait]
impl IdentityStore for FlakyIdentityStore {
    async fn create_identity(&self, identity: NewIdentity) -> Result<GuardedWrite<User>> {
        self.inner.create_identity(identity).await
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<User>> {
        self.inner.find_identity(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.find_by_username(username).await
    }

    async fn update_identity(&self, user: User) -> Result<Option<User>> {
        self.inner.update_identity(user).await
    }

    async fn delete_identity(&self, id: Uuid) -> Result<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(anyhow!("identity store unavailable"));
        }
        self.inner.delete_identity(id).await
    }
}

/// Patient repository whose inserts can be switched to fail.
#[derive(Default)]
pub struct FlakyPatientRepository {
    inner: InMemoryPatientRepository,
    pub fail_creates: AtomicBool,
}

#[async_trait]
impl PatientRepository for FlakyPatientRepository {
    async fn next_public_sequence(&self) -> Result<u64> {
        self.inner.next_public_sequence().await
    }

    async fn create(&self, patient: Patient) -> Result<Patient> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(anyhow!("patients table is read-only"));
        }
        self.inner.create(patient).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_public_id(&self, patient_id: &str) -> Result<Option<Patient>> {
        self.inner.find_by_public_id(patient_id).await
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Patient>> {
        self.inner.find_by_user_id(user_id).await
    }

    async fn find_all(&self) -> Result<Vec<Patient>> {
        self.inner.find_all().await
    }

    async fn update(&self, patient: Patient) -> Result<Option<Patient>> {
        self.inner.update(patient).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.inner.delete(id).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

pub struct TestDirectory {
    pub service: PatientService,
    pub identities: IdentityService,
    pub identity_store: Arc<FlakyIdentityStore>,
    pub patients: Arc<FlakyPatientRepository>,
}

pub fn test_directory() -> TestDirectory {
    init_test_tracing();

    let identity_store = Arc::new(FlakyIdentityStore::default());
    let patients = Arc::new(FlakyPatientRepository::default());
    let hasher = Arc::new(Argon2CredentialHasher::new(8, 1).expect("test hasher"));
    let identities = IdentityService::new(identity_store.clone(), hasher);

    TestDirectory {
        service: PatientService::new(patients.clone(), identities.clone()),
        identities,
        identity_store,
        patients,
    }
}

pub fn sample_profile() -> PatientProfile {
    PatientProfile {
        date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15).expect("valid date"),
        gender: "Female".to_string(),
        address: Some("12 Harbour Road, Howth".to_string()),
        emergency_contact: Some("Sean Murphy +353 87 000 0000".to_string()),
        blood_group: Some("O+".to_string()),
        allergies: Some("Penicillin".to_string()),
        medical_history: Some("Asthma".to_string()),
    }
}
