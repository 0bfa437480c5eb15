use thiserror::Error;
use uuid::Uuid;

/// Error kinds surfaced by every cell. Mapping these to transport responses is
/// left to whatever boundary layer embeds the cells.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClinicError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Partial delete of {entity} {entity_id}: identity {orphaned_user_id} left orphaned ({reason})")]
    PartialDelete {
        entity: String,
        entity_id: Uuid,
        orphaned_user_id: Uuid,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(String),
}

pub type ClinicResult<T> = Result<T, ClinicError>;

impl ClinicError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ClinicError::NotFound(format!("{} {} not found", entity, id))
    }

    pub fn database(err: impl std::fmt::Display) -> Self {
        ClinicError::Database(err.to_string())
    }

    /// True for the four business kinds; false for infrastructure faults.
    pub fn is_business(&self) -> bool {
        !matches!(self, ClinicError::Database(_))
    }
}
