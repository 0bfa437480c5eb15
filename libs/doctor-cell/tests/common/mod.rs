use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use auth_cell::{Argon2CredentialHasher, IdentityService, IdentityStore, InMemoryIdentityStore};
use doctor_cell::{Doctor, DoctorProfile, DoctorRepository, DoctorService, InMemoryDoctorRepository};
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

/// Doctor repository whose inserts can be switched to fail.
#[derive(Default)]
pub struct FlakyDoctorRepository {
    inner: InMemoryDoctorRepository,
    pub fail_creates: AtomicBool,
}

#[async_trait]
impl DoctorRepository for FlakyDoctorRepository {
    async fn next_public_sequence(&self) -> Result<u64> {
        self.inner.next_public_sequence().await
    }

    async fn create(&self, doctor: Doctor) -> Result<Doctor> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(anyhow!("doctors table is read-only"));
        }
        self.inner.create(doctor).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Doctor>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_public_id(&self, doctor_id: &str) -> Result<Option<Doctor>> {
        self.inner.find_by_public_id(doctor_id).await
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Doctor>> {
        self.inner.find_by_user_id(user_id).await
    }

    async fn find_by_specialization(&self, specialization: &str) -> Result<Vec<Doctor>> {
        self.inner.find_by_specialization(specialization).await
    }

    async fn find_by_department(&self, department: &str) -> Result<Vec<Doctor>> {
        self.inner.find_by_department(department).await
    }

    async fn find_available(&self) -> Result<Vec<Doctor>> {
        self.inner.find_available().await
    }

    async fn find_all(&self) -> Result<Vec<Doctor>> {
        self.inner.find_all().await
    }

    async fn update(&self, doctor: Doctor) -> Result<Option<Doctor>> {
        self.inner.update(doctor).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.inner.delete(id).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

pub struct TestDirectory {
    pub service: DoctorService,
    pub identities: IdentityService,
    pub identity_store: Arc<FlakyIdentityStore>,
    pub doctors: Arc<FlakyDoctorRepository>,
}

pub fn test_directory() -> TestDirectory {
    init_test_tracing();

    let identity_store = Arc::new(FlakyIdentityStore::default());
    let doctors = Arc::new(FlakyDoctorRepository::default());
    let hasher = Arc::new(Argon2CredentialHasher::new(8, 1).expect("test hasher"));
    let identities = IdentityService::new(identity_store.clone(), hasher);

    TestDirectory {
        service: DoctorService::new(doctors.clone(), identities.clone()),
        identities,
        identity_store,
        doctors,
    }
}

pub fn profile(specialization: &str, department: &str) -> DoctorProfile {
    DoctorProfile {
        specialization: specialization.to_string(),
        qualification: "MB BCh BAO, MRCPI".to_string(),
        experience_years: 9,
        department: department.to_string(),
        consultation_fee: 90.0,
        working_hours: Some("Mon-Thu 08:30-16:30".to_string()),
        available: true,
    }
}
