pub mod repository;
pub mod services;

pub use repository::{IdentityStore, InMemoryIdentityStore};
pub use services::*;
