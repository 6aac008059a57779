use super::assessment::cache::CacheError;
use super::assessment::provider::ProviderError;
use super::assessment::report::RenderError;
use super::store::RepositoryError;

/// Failure taxonomy shared by the assessment and hiring workflows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("unauthorized access with user ID {actor}")]
    Unauthorized { actor: i64 },
    #[error("{0} not found")]
    NotFound(String),
    /// External resource is not reachable yet because the end user has not granted access.
    #[error("action required: {0}")]
    IncompleteAction(String),
    #[error("{0}")]
    UniqueViolation(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Stable machine-readable label used in HTTP error payloads and logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Unauthorized { .. } => "unauthorized",
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::IncompleteAction(_) => "incomplete_action",
            WorkflowError::UniqueViolation(_) => "unique_violation",
            WorkflowError::InvalidInput(_) => "invalid_input",
            WorkflowError::InvalidTransition { .. } => "invalid_transition",
            WorkflowError::Internal(_) => "internal",
        }
    }
}

impl From<RepositoryError> for WorkflowError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(what) => Self::UniqueViolation(what),
            RepositoryError::NotFound(what) => Self::NotFound(what),
            RepositoryError::Unavailable(reason) => {
                Self::Internal(format!("repository unavailable: {reason}"))
            }
        }
    }
}

impl From<CacheError> for WorkflowError {
    fn from(value: CacheError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<ProviderError> for WorkflowError {
    fn from(value: ProviderError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<RenderError> for WorkflowError {
    fn from(value: RenderError) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
