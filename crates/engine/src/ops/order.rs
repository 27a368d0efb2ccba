use crate::{compare::compare, error::EngineError, ops::group::resolve_key, table::TableData};
use sql_syntax::ast::{KeyRef, SortDir};
use std::cmp::Ordering;

/// Stable single-key sort. Descending reverses the coercing total order,
/// which puts nil first (nil is the greatest value); ascending puts it
/// last.
pub fn order_by(
    mut table: TableData,
    key: &KeyRef,
    dir: SortDir,
) -> Result<TableData, EngineError> {
    let key_idx = resolve_key(&table.columns, key)?;

    let mut failure: Option<EngineError> = None;
    table.rows.sort_by(|a, b| {
        match compare(&a[key_idx], &b[key_idx]) {
            Ok(ordering) => match dir {
                SortDir::Asc => ordering,
                SortDir::Desc => ordering.reverse(),
            },
            Err(e) => {
                if failure.is_none() {
                    failure = Some(e);
                }
                Ordering::Equal
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(table),
    }
}
