//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories:
//! - validating bound forms and adding checks that need the store
//! - turning "row missing" into [`ServiceError::NotFound`]
//! - guarding deletes that would break referential integrity

pub mod newspaper;
pub mod password;
pub mod redactor;
pub mod session;
pub mod stats;
pub mod topic;

pub use newspaper::{NewspaperChoices, NewspaperService};
pub use password::{hash_password, verify_password};
pub use redactor::RedactorService;
pub use session::{SessionData, NUM_VISITS_KEY};
pub use stats::{IndexStats, StatsService};
pub use topic::TopicService;

use crate::forms::FormErrors;

/// Error types shared by every service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Submitted form failed validation
    #[error("Validation error: {0}")]
    Invalid(FormErrors),

    /// Operation refused because other records depend on this one
    #[error("{0}")]
    Protected(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<FormErrors> for ServiceError {
    fn from(errors: FormErrors) -> Self {
        Self::Invalid(errors)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
