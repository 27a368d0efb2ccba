use crate::{compare::eval_op, error::EngineError, table::TableData};
use model::{
    row::{ColumnDescriptor, Row, RowMarker},
    value::Value,
};
use planner::JoinSpec;
use sql_syntax::ast::{clause::CompareOp, JoinType};
use std::collections::HashSet;

/// Join two materialised sources. Each side is annotated with a marker
/// column carrying its row ordinal; the markers drive INNER
/// deduplication and are stripped by the final projection.
pub fn join(source: TableData, joined: TableData, spec: &JoinSpec) -> Result<TableData, EngineError> {
    let source = attach_marker(source, RowMarker::LhsIndex);
    let joined = attach_marker(joined, RowMarker::RhsIndex);

    let (p1, p2) = match (spec.clause.p1.field_ref(), spec.clause.p2.field_ref()) {
        (Some(p1), Some(p2)) => (p1, p2),
        _ => return Err(EngineError::InvalidJoinClause),
    };

    // The clause must reference one attribute from each side, in either
    // order; a flipped clause inverts the operator.
    let lookup = |table: &TableData, (src, field): (&str, &str)| {
        table.columns.position_ignore_alias(src, field)
    };
    let (source_key, joined_key, op) =
        match (lookup(&source, p1), lookup(&joined, p2)) {
            (Some(sk), Some(jk)) => (sk, jk, spec.clause.op),
            _ => match (lookup(&source, p2), lookup(&joined, p1)) {
                (Some(sk), Some(jk)) => (sk, jk, spec.clause.op.invert()),
                _ => return Err(EngineError::InvalidJoinClause),
            },
        };

    match spec.join_type {
        JoinType::Left => outer_join(&source, &joined, source_key, joined_key, op),
        JoinType::Right => outer_join(&joined, &source, joined_key, source_key, op.invert()),
        JoinType::Inner => inner_join(&source, &joined, source_key, joined_key, op),
    }
}

fn attach_marker(mut table: TableData, marker: RowMarker) -> TableData {
    table.columns.push(ColumnDescriptor::marker(marker));
    for (ordinal, row) in table.rows.iter_mut().enumerate() {
        row.push(Value::Int(ordinal as i64));
    }
    table
}

/// Left-outer driver: every LHS row appears at least once, padded with
/// nils when nothing on the RHS matches. RIGHT joins run through here
/// with the sides swapped and the operator inverted.
fn outer_join(
    lhs: &TableData,
    rhs: &TableData,
    lhs_key: usize,
    rhs_key: usize,
    op: CompareOp,
) -> Result<TableData, EngineError> {
    let columns = lhs.columns.concat(&rhs.columns);
    let empty_rhs: Row = vec![Value::Null; rhs.columns.len()];

    let mut rows = Vec::new();
    for lhs_row in &lhs.rows {
        let mut matched = false;
        for rhs_row in &rhs.rows {
            if eval_op(op, &lhs_row[lhs_key], &rhs_row[rhs_key])? {
                let mut row = lhs_row.clone();
                row.extend(rhs_row.iter().cloned());
                rows.push(row);
                matched = true;
            }
        }
        if !matched {
            let mut row = lhs_row.clone();
            row.extend(empty_rhs.iter().cloned());
            rows.push(row);
        }
    }
    Ok(TableData::new(columns, rows))
}

/// Inner driver: the union of the LEFT-matched and RIGHT-matched subsets,
/// deduplicated by `(lhs ordinal, rhs ordinal)`, with no padded rows.
fn inner_join(
    source: &TableData,
    joined: &TableData,
    source_key: usize,
    joined_key: usize,
    op: CompareOp,
) -> Result<TableData, EngineError> {
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    for (li, lhs_row) in source.rows.iter().enumerate() {
        for (ri, rhs_row) in joined.rows.iter().enumerate() {
            if eval_op(op, &lhs_row[source_key], &rhs_row[joined_key])? && seen.insert((li, ri)) {
                pairs.push((li, ri));
            }
        }
    }
    for (ri, rhs_row) in joined.rows.iter().enumerate() {
        for (li, lhs_row) in source.rows.iter().enumerate() {
            if eval_op(op.invert(), &rhs_row[joined_key], &lhs_row[source_key])?
                && seen.insert((li, ri))
            {
                pairs.push((li, ri));
            }
        }
    }

    let columns = source.columns.concat(&joined.columns);
    let rows = pairs
        .into_iter()
        .map(|(li, ri)| {
            let mut row = source.rows[li].clone();
            row.extend(joined.rows[ri].iter().cloned());
            row
        })
        .collect();
    Ok(TableData::new(columns, rows))
}
