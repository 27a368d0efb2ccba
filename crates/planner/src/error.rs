use thiserror::Error;

/// Validation failures raised while turning an AST into a query plan.
/// Every planner stage short-circuits on its first error, wrapped with the
/// stage name.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<PlanError>,
    },

    #[error("First segment must be SELECT")]
    MissingSelect,

    #[error("Only one JOIN segment is supported")]
    MultipleJoins,

    #[error("Duplicate resource alias: {0}")]
    DuplicateAlias(String),

    #[error("Data source(s) do not exist: {0}")]
    UnknownDataSources(String),

    #[error("Unknown alias: {0}")]
    UnknownAlias(String),

    #[error("aggregate without GROUP BY requires all fields in a function")]
    AggregateWithoutGroupBy,

    #[error("Field {0} must be the GROUP BY key or inside an aggregate")]
    FieldOutsideAggregate(String),

    #[error("GROUP BY key {0} does not name a projected field")]
    UnknownGroupKey(String),

    #[error("Connector resolution failed: {0}")]
    Connector(String),
}

impl PlanError {
    pub fn at_stage(self, stage: &'static str) -> PlanError {
        PlanError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The underlying error with stage wrappers peeled off.
    pub fn root(&self) -> &PlanError {
        match self {
            PlanError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}
