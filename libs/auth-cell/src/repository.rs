use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use shared_database::{GuardedWrite, MemoryTable};
use shared_models::{NewIdentity, User};

/// Persistence port for user identities.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Creates the identity unless the username is already taken; the
    /// uniqueness check and the insert are one atomic step.
    async fn create_identity(&self, identity: NewIdentity) -> Result<GuardedWrite<User>>;
    async fn find_identity(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Overwrites an existing identity. `None` when the id is unknown.
    async fn update_identity(&self, user: User) -> Result<Option<User>>;
    /// Returns true if a row was deleted.
    async fn delete_identity(&self, id: Uuid) -> Result<bool>;
}

pub struct InMemoryIdentityStore {
    users: MemoryTable<User>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            users: MemoryTable::new("users"),
        }
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn create_identity(&self, identity: NewIdentity) -> Result<GuardedWrite<User>> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: identity.username,
            password_hash: identity.password_hash,
            first_name: identity.contact.first_name,
            last_name: identity.contact.last_name,
            email: identity.contact.email,
            phone_number: identity.contact.phone_number,
            role: identity.role,
            active: true,
            created_at: now,
            updated_at: now,
        };

        let username = user.username.to_lowercase();
        self.users
            .insert_unless(user, |existing| existing.username.to_lowercase() == username)
            .await
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(id).await)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_lowercase();
        Ok(self
            .users
            .find_first(|u| u.username.to_lowercase() == username)
            .await)
    }

    async fn update_identity(&self, user: User) -> Result<Option<User>> {
        Ok(self.users.replace(user).await)
    }

    async fn delete_identity(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.remove(id).await.is_some())
    }
}
