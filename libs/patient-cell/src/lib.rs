pub mod models;
pub mod repository;
pub mod services;

pub use models::*;
pub use repository::{InMemoryPatientRepository, PatientRepository};
pub use services::PatientService;
