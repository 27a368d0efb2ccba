use crate::{error::EngineError, table::TableData};
use connectors::ConnectorRegistry;
use planner::{JoinSpec, QueryPlan};
use tracing::debug;

/// One fetched source, paired with how it merges into the pipeline.
pub struct FetchedSegment {
    pub alias: String,
    pub table: TableData,
    pub merge: Option<JoinSpec>,
}

/// Resolve each prepared segment's connector, prepare the fetch, and
/// materialise the lazy stream. The first inline stream error aborts the
/// whole fetch.
pub async fn fetch_segments(
    plan: &QueryPlan,
    registry: &ConnectorRegistry,
) -> Result<Vec<FetchedSegment>, EngineError> {
    let mut fetched = Vec::with_capacity(plan.segments.len());
    for segment in &plan.segments {
        let connector = registry.connect(&segment.spec)?;
        let handle = connector.prepare(&segment.to_request()).await?;

        let mut rows = Vec::new();
        for row in handle.rows {
            rows.push(row?);
        }
        debug!(
            alias = %segment.alias,
            rows = rows.len(),
            columns = handle.columns.len(),
            "segment fetched"
        );
        fetched.push(FetchedSegment {
            alias: segment.alias.clone(),
            table: TableData::new(handle.columns, rows),
            merge: segment.merge.clone(),
        });
    }
    Ok(fetched)
}
