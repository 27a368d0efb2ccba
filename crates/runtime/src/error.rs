use crate::store::StoreError;
use engine::EngineError;
use planner::PlanError;
use sql_syntax::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Query rejected before a request record was created.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown request id, expired result set, or unknown endpoint/model.
    #[error("Not found")]
    NotFound,

    /// Raised by the external authorizer; surfaced unchanged.
    #[error("Access denied")]
    AccessDenied,

    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    #[error("Shutdown requested")]
    ShutdownRequested,

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<ParseError> for RuntimeError {
    fn from(err: ParseError) -> Self {
        RuntimeError::Validation(format!("{err}; remaining input: '{}'", err.remaining))
    }
}
