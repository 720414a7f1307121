//! Error taxonomy returned by every reminder operation.

use super::models::TemplateValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    /// Malformed input or a request that is missing its scope
    #[error("{0}")]
    Validation(String),
    /// Unknown template, or an occurrence the template does not produce
    #[error("{0}")]
    NotFound(String),
    /// The caller's expected revision is stale; re-fetch and retry
    #[error("Revision conflict: expected revision {expected}, current revision is {actual}")]
    Conflict { expected: u64, actual: u64 },
    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ReminderError {
    pub fn validation(message: impl Into<String>) -> Self {
        ReminderError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ReminderError::NotFound(message.into())
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ReminderError::Validation(_) => "validation_error",
            ReminderError::NotFound(_) => "not_found",
            ReminderError::Conflict { .. } => "conflict",
            ReminderError::Storage(_) => "storage_error",
        }
    }
}

impl From<TemplateValidationError> for ReminderError {
    fn from(error: TemplateValidationError) -> Self {
        ReminderError::Validation(error.to_string())
    }
}

pub type ReminderResult<T> = std::result::Result<T, ReminderError>;
