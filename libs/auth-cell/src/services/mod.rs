pub mod identity;
pub mod password;

pub use identity::IdentityService;
pub use password::{Argon2CredentialHasher, CredentialHasher};
