use crate::{
    error::EngineError,
    fetch::{fetch_segments, FetchedSegment},
    ops::{
        filter::filter, group::apply_aggregates, join::join, limit::limit,
        project::project, scalar::apply_scalar_functions,
    },
    table::TableData,
};
use chrono::Utc;
use connectors::ConnectorRegistry;
use model::request::PlanStep;
use planner::QueryPlan;
use std::time::Instant;
use tracing::info;

/// Records one `PlanStep` per executed stage; surfaced through
/// `get_query_plan`.
#[derive(Default)]
pub struct PlanRecorder {
    steps: Vec<PlanStep>,
}

impl PlanRecorder {
    pub fn new() -> Self {
        PlanRecorder::default()
    }

    pub fn into_steps(self) -> Vec<PlanStep> {
        self.steps
    }

    fn time<T>(
        &mut self,
        stage: &'static str,
        f: impl FnOnce() -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let result = f();
        self.push(stage, started_at, start);
        result.map_err(|e| e.at_stage(stage))
    }

    fn push(&mut self, stage: &'static str, started_at: chrono::DateTime<Utc>, start: Instant) {
        self.steps.push(PlanStep {
            stage: stage.to_string(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        });
    }
}

/// Drive one planned query through the operator chain:
/// fetch → join → filter → scalar functions → group/aggregate → order →
/// limit → projection. Stages run sequentially on the calling worker; the
/// stage name rides on any error.
pub async fn execute(
    plan: &QueryPlan,
    registry: &ConnectorRegistry,
    recorder: &mut PlanRecorder,
) -> Result<TableData, EngineError> {
    let started_at = Utc::now();
    let start = Instant::now();
    let fetched = fetch_segments(plan, registry).await;
    recorder.push("fetch-segments", started_at, start);
    let fetched = fetched.map_err(|e| e.at_stage("fetch-segments"))?;

    let mut table = recorder.time("process-join", || merge_segments(fetched))?;

    if let Some(clause) = &plan.where_clause {
        table = recorder.time("filter", || filter(table, clause))?;
    }

    let scalars = plan.platform_scalars();
    if !scalars.is_empty() {
        table = recorder.time("scalar-platform-functions", || {
            apply_scalar_functions(table, &scalars)
        })?;
    }

    if plan.has_aggregates() || plan.group_by.is_some() {
        let aggregates = plan.aggregates();
        table = recorder.time("group-and-aggregate", || {
            apply_aggregates(table, &aggregates, plan.group_by.as_ref())
        })?;
    }

    if let Some((key, dir)) = &plan.order_by {
        table = recorder.time("order", || crate::ops::order::order_by(table, key, *dir))?;
    }

    if let Some(n) = plan.limit {
        table = recorder.time("limit", || Ok(limit(table, n)))?;
    }

    let table = recorder.time("finalize-projection", || project(table, plan))?;

    info!(
        rows = table.rows.len(),
        columns = table.columns.len(),
        "pipeline complete"
    );
    Ok(table)
}

/// No join: the base stream passes through as-is. One join: the base
/// segment is the probe side, the join segment brings its merge spec.
fn merge_segments(fetched: Vec<FetchedSegment>) -> Result<TableData, EngineError> {
    let mut segments = fetched.into_iter();
    let base = segments
        .next()
        .ok_or(EngineError::InvalidJoinClause)?
        .table;

    let mut table = base;
    for segment in segments {
        let spec = segment.merge.ok_or(EngineError::InvalidJoinClause)?;
        table = join(table, segment.table, &spec)?;
    }
    Ok(table)
}
