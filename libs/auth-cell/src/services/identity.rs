use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_database::GuardedWrite;
use shared_models::{ClinicError, ClinicResult, ContactDetails, Credentials, NewIdentity, Role, User};
use shared_utils::validation::{validate_contact, validate_credentials};

use crate::repository::IdentityStore;
use crate::services::password::CredentialHasher;

/// Creates, updates and removes the user identities that patients and
/// doctors own.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn IdentityStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn IdentityStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn provision(&self, credentials: &Credentials, role: Role) -> ClinicResult<User> {
        validate_credentials(credentials)?;

        let password_hash = self
            .hasher
            .hash(&credentials.password)
            .map_err(ClinicError::database)?;

        let identity = NewIdentity {
            username: credentials.username.trim().to_string(),
            password_hash,
            contact: credentials.contact(),
            role,
        };

        match self.store.create_identity(identity).await.map_err(ClinicError::database)? {
            GuardedWrite::Written(user) => {
                info!("Provisioned {} identity {}", role, user.id);
                Ok(user)
            }
            GuardedWrite::Blocked(_) => {
                warn!("Username {} is already taken", credentials.username);
                Err(ClinicError::Conflict(format!(
                    "username {} is already taken",
                    credentials.username
                )))
            }
            GuardedWrite::Missing => Err(ClinicError::Database(
                "identity store reported a missing row on insert".to_string(),
            )),
        }
    }

    pub async fn find(&self, user_id: Uuid) -> ClinicResult<User> {
        self.store
            .find_identity(user_id)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("User", user_id))
    }

    pub async fn find_optional(&self, user_id: Uuid) -> ClinicResult<Option<User>> {
        self.store.find_identity(user_id).await.map_err(ClinicError::database)
    }

    /// Overwrites name, email and phone. Credential and role never change here.
    pub async fn update_contact(&self, user_id: Uuid, contact: &ContactDetails) -> ClinicResult<User> {
        validate_contact(&contact.first_name, &contact.last_name, &contact.email)?;

        let mut user = self.find(user_id).await?;
        user.first_name = contact.first_name.clone();
        user.last_name = contact.last_name.clone();
        user.email = contact.email.clone();
        user.phone_number = contact.phone_number.clone();
        user.updated_at = Utc::now();

        self.store
            .update_identity(user)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("User", user_id))
    }

    pub async fn set_active(&self, user_id: Uuid, active: bool) -> ClinicResult<User> {
        let mut user = self.find(user_id).await?;
        user.active = active;
        user.updated_at = Utc::now();

        let user = self
            .store
            .update_identity(user)
            .await
            .map_err(ClinicError::database)?
            .ok_or_else(|| ClinicError::not_found("User", user_id))?;

        info!("Identity {} active={}", user_id, active);
        Ok(user)
    }

    /// Returns whether an identity was actually removed.
    pub async fn remove(&self, user_id: Uuid) -> ClinicResult<bool> {
        debug!("Removing identity {}", user_id);
        self.store.delete_identity(user_id).await.map_err(ClinicError::database)
    }

    /// Resolves a username/password pair to an active identity. Unknown user,
    /// inactive account and wrong password all yield `None`.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, username: &str, password: &str) -> ClinicResult<Option<User>> {
        let Some(user) = self
            .store
            .find_by_username(username)
            .await
            .map_err(ClinicError::database)?
        else {
            debug!("No identity for username {}", username);
            return Ok(None);
        };

        if !user.active {
            debug!("Identity {} is deactivated", user.id);
            return Ok(None);
        }

        let verified = self
            .hasher
            .verify(password, &user.password_hash)
            .map_err(ClinicError::database)?;

        Ok(verified.then_some(user))
    }
}
