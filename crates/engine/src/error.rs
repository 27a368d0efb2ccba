use connectors::{ConnectorError, FetchError};
use thiserror::Error;

/// Execution failures. The pipeline attaches the failing stage's name at
/// its boundary, so a surfaced error always reads `stage: cause`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<EngineError>,
    },

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Comparison failed: {0}")]
    Coercion(String),

    #[error("Invalid join clause")]
    InvalidJoinClause,

    #[error("Invalid values for sum/avg")]
    InvalidAggregateValues,

    #[error("Function error: {0}")]
    Function(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn at_stage(self, stage: &'static str) -> EngineError {
        EngineError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    pub fn root(&self) -> &EngineError {
        match self {
            EngineError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}
