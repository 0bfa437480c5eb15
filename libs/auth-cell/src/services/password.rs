use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use tracing::instrument;

use shared_config::AppConfig;

/// One-way credential hashing consumed by the identity service.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

pub struct Argon2CredentialHasher {
    params: Params,
}

impl Argon2CredentialHasher {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| anyhow!("invalid argon2 parameters: {}", e))?;
        Ok(Self { params })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.password_hash_memory_kib, config.password_hash_iterations)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    #[instrument(skip(self, password))]
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("failed to hash credential: {}", e))?;
        Ok(password_hash.to_string())
    }

    /// Cost parameters are read back from the PHC string, so hashes created
    /// under an older configuration still verify.
    #[instrument(skip(self, password, hash))]
    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| anyhow!("malformed credential hash: {}", e))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow!("failed to verify credential: {}", e)),
        }
    }
}
