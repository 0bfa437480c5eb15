pub mod auth;
pub mod error;
pub mod ids;

pub use auth::*;
pub use error::{ClinicError, ClinicResult};
pub use ids::PublicIdKind;
