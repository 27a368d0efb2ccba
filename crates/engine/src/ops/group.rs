use crate::{compare::compare, error::EngineError, table::TableData};
use model::{
    row::{ColumnDescriptor, ColumnIndex, Row},
    value::Value,
};
use planner::PlannedFunction;
use sql_syntax::ast::{
    field::{FuncCall, FuncName, FuncParam},
    KeyRef,
};
use std::{cmp::Ordering, collections::HashMap};

/// Partition the rows by the group key (one partition for the whole set
/// when there is no `GROUP BY`) and evaluate every aggregate per
/// partition. The output schema is `[group key, agg1, …, aggN]`, or just
/// the aggregates without a key.
pub fn apply_aggregates(
    table: TableData,
    aggregates: &[&PlannedFunction],
    group_by: Option<&KeyRef>,
) -> Result<TableData, EngineError> {
    match group_by {
        None => {
            let refs: Vec<&Row> = table.rows.iter().collect();
            let mut columns = ColumnIndex::default();
            let mut row: Row = Vec::with_capacity(aggregates.len());
            for agg in aggregates {
                columns.push(descriptor(&agg.call));
                row.push(eval_aggregate(&agg.call, &table.columns, &refs)?);
            }
            Ok(TableData::new(columns, vec![row]))
        }
        Some(key) => {
            let key_idx = resolve_key(&table.columns, key)?;

            // Partition preserving first-occurrence order of key values.
            let mut order: Vec<Value> = Vec::new();
            let mut partitions: HashMap<Value, Vec<&Row>> = HashMap::new();
            for row in &table.rows {
                let key_value = row[key_idx].clone();
                if !partitions.contains_key(&key_value) {
                    order.push(key_value.clone());
                }
                partitions.entry(key_value).or_default().push(row);
            }

            let mut columns = ColumnIndex::default();
            columns.push(
                table
                    .columns
                    .get(key_idx)
                    .cloned()
                    .ok_or_else(|| EngineError::ColumnNotFound(format!("{key:?}")))?,
            );
            for agg in aggregates {
                columns.push(descriptor(&agg.call));
            }

            let mut rows = Vec::with_capacity(order.len());
            for key_value in order {
                let members = &partitions[&key_value];
                let mut row: Row = Vec::with_capacity(1 + aggregates.len());
                row.push(key_value);
                for agg in aggregates {
                    row.push(eval_aggregate(&agg.call, &table.columns, members)?);
                }
                rows.push(row);
            }
            Ok(TableData::new(columns, rows))
        }
    }
}

/// An alias key is looked up against user aliases and function idents
/// first; a field key matches `(source, field)` ignoring aliases.
pub fn resolve_key(columns: &ColumnIndex, key: &KeyRef) -> Result<usize, EngineError> {
    match key {
        KeyRef::Alias(alias) => columns
            .position_by_alias(alias)
            .ok_or_else(|| EngineError::ColumnNotFound(alias.clone())),
        KeyRef::Field { src, field } => columns
            .position_ignore_alias(src, field)
            .ok_or_else(|| EngineError::ColumnNotFound(format!("{src}.{field}"))),
    }
}

fn descriptor(call: &FuncCall) -> ColumnDescriptor {
    ColumnDescriptor::function(call.name.as_str(), call.ident.clone())
        .with_alias(call.alias.clone())
}

/// What an aggregate ranges over.
enum AggregateInput {
    Column(usize),
    /// All columns of one source, or every non-marker column for `*`.
    RowSlice(Vec<usize>),
}

fn resolve_input(
    call: &FuncCall,
    columns: &ColumnIndex,
) -> Result<AggregateInput, EngineError> {
    let value_params = call.value_params();
    match value_params.as_slice() {
        [FuncParam::Field { src, field }] => columns
            .position_ignore_alias(src, field)
            .map(AggregateInput::Column)
            .ok_or_else(|| EngineError::ColumnNotFound(format!("{src}.{field}"))),
        [FuncParam::AliasRef { alias }] => columns
            .position_by_alias(alias)
            .map(AggregateInput::Column)
            .ok_or_else(|| EngineError::ColumnNotFound(alias.clone())),
        [FuncParam::Star { src: None }] => Ok(AggregateInput::RowSlice(columns.positions_non_marker())),
        [FuncParam::Star { src: Some(src) }] => {
            let positions = columns.positions_of_source(src);
            if positions.is_empty() {
                return Err(EngineError::ColumnNotFound(format!("{src}.*")));
            }
            Ok(AggregateInput::RowSlice(positions))
        }
        _ => Err(EngineError::Function(format!(
            "{} expects a single column or star parameter",
            call.name
        ))),
    }
}

fn eval_aggregate(
    call: &FuncCall,
    columns: &ColumnIndex,
    rows: &[&Row],
) -> Result<Value, EngineError> {
    let input = resolve_input(call, columns)?;
    let distinct = call.is_distinct();

    match call.name {
        FuncName::Count => eval_count(&input, distinct, rows),
        FuncName::Min => eval_extreme(call, &input, rows, Ordering::Less),
        FuncName::Max => eval_extreme(call, &input, rows, Ordering::Greater),
        FuncName::Sum => eval_sum_avg(call, &input, rows, false),
        FuncName::Avg => eval_sum_avg(call, &input, rows, true),
        other => Err(EngineError::Function(format!(
            "{other} is not an aggregate function"
        ))),
    }
}

fn eval_count(
    input: &AggregateInput,
    distinct: bool,
    rows: &[&Row],
) -> Result<Value, EngineError> {
    match input {
        AggregateInput::Column(idx) => {
            let values = rows.iter().map(|r| &r[*idx]).filter(|v| !v.is_null());
            let count = if distinct {
                let unique: std::collections::HashSet<&Value> = values.collect();
                unique.len()
            } else {
                values.count()
            };
            Ok(Value::Int(count as i64))
        }
        AggregateInput::RowSlice(positions) => {
            // Reject "unjoined" padding rows: every counted cell nil.
            let live = rows
                .iter()
                .filter(|r| positions.iter().any(|&p| !r[p].is_null()));
            let count = if distinct {
                let unique: std::collections::HashSet<Vec<&Value>> = live
                    .map(|r| positions.iter().map(|&p| &r[p]).collect())
                    .collect();
                unique.len()
            } else {
                live.count()
            };
            Ok(Value::Int(count as i64))
        }
    }
}

fn eval_extreme(
    call: &FuncCall,
    input: &AggregateInput,
    rows: &[&Row],
    keep: Ordering,
) -> Result<Value, EngineError> {
    let idx = match input {
        AggregateInput::Column(idx) => *idx,
        AggregateInput::RowSlice(_) => {
            return Err(EngineError::Function(format!(
                "{} requires a column parameter",
                call.name
            )));
        }
    };
    let mut best: Option<&Value> = None;
    for row in rows {
        let value = &row[idx];
        if value.is_null() {
            continue;
        }
        best = match best {
            None => Some(value),
            Some(current) => {
                if compare(value, current)? == keep {
                    Some(value)
                } else {
                    Some(current)
                }
            }
        };
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

fn eval_sum_avg(
    call: &FuncCall,
    input: &AggregateInput,
    rows: &[&Row],
    average: bool,
) -> Result<Value, EngineError> {
    let idx = match input {
        AggregateInput::Column(idx) => *idx,
        AggregateInput::RowSlice(_) => {
            return Err(EngineError::Function(format!(
                "{} requires a column parameter",
                call.name
            )));
        }
    };

    let mut ints: i64 = 0;
    let mut floats: f64 = 0.0;
    let mut all_ints = true;
    let mut count: usize = 0;
    for row in rows {
        match &row[idx] {
            Value::Null => continue,
            Value::Int(v) => {
                ints += v;
                floats += *v as f64;
                count += 1;
            }
            Value::Float(v) => {
                all_ints = false;
                floats += v;
                count += 1;
            }
            _ => return Err(EngineError::InvalidAggregateValues),
        }
    }

    if count == 0 {
        return Ok(Value::Null);
    }
    if average {
        return Ok(Value::Float(floats / count as f64));
    }
    if all_ints {
        Ok(Value::Int(ints))
    } else {
        Ok(Value::Float(floats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner::FunctionTarget;
    use sql_syntax::ast::field::AtomLiteral;

    fn agg(name: FuncName, params: Vec<FuncParam>, ident: &str) -> PlannedFunction {
        PlannedFunction {
            call: FuncCall {
                name,
                kind: name.kind(),
                params,
                alias: Some(ident.to_string()),
                ident: ident.into(),
            },
            index: 1,
            target: FunctionTarget::Platform,
        }
    }

    fn field(field: &str) -> FuncParam {
        FuncParam::Field {
            src: "s".into(),
            field: field.into(),
        }
    }

    fn table(rows: Vec<Row>) -> TableData {
        TableData::new(
            ColumnIndex::new(vec![
                ColumnDescriptor::field("s", "u"),
                ColumnDescriptor::field("s", "v"),
            ]),
            rows,
        )
    }

    #[test]
    fn grouped_count_partitions_by_key_in_first_seen_order() {
        let t = table(vec![
            vec![Value::String("a".into()), Value::Int(1)],
            vec![Value::String("a".into()), Value::Int(2)],
            vec![Value::String("b".into()), Value::Int(3)],
        ]);
        let count = agg(FuncName::Count, vec![field("v")], "c");
        let key = KeyRef::Field {
            src: "s".into(),
            field: "u".into(),
        };
        let out = apply_aggregates(t, &[&count], Some(&key)).unwrap();
        assert_eq!(
            out.rows,
            vec![
                vec![Value::String("a".into()), Value::Int(2)],
                vec![Value::String("b".into()), Value::Int(1)],
            ]
        );
        assert_eq!(out.columns.position_by_alias("c"), Some(1));
    }

    #[test]
    fn count_distinct_excludes_nulls_and_duplicates() {
        let t = table(vec![
            vec![Value::String("a".into()), Value::Int(1)],
            vec![Value::String("a".into()), Value::Int(1)],
            vec![Value::String("a".into()), Value::Int(2)],
            vec![Value::String("a".into()), Value::Null],
            vec![Value::String("a".into()), Value::Int(3)],
            vec![Value::String("a".into()), Value::Null],
        ]);
        let count = agg(
            FuncName::Count,
            vec![FuncParam::Atom(AtomLiteral::Distinct), field("v")],
            "c",
        );
        let out = apply_aggregates(t, &[&count], None).unwrap();
        assert_eq!(out.rows, vec![vec![Value::Int(3)]]);
    }

    #[test]
    fn count_star_rejects_all_nil_rows() {
        let t = table(vec![
            vec![Value::Int(1), Value::Int(1)],
            vec![Value::Null, Value::Null],
            vec![Value::Int(2), Value::Null],
        ]);
        let count = agg(
            FuncName::Count,
            vec![FuncParam::Star { src: None }],
            "c",
        );
        let out = apply_aggregates(t, &[&count], None).unwrap();
        assert_eq!(out.rows, vec![vec![Value::Int(2)]]);
    }

    #[test]
    fn min_max_filter_nil_and_use_natural_order() {
        let t = table(vec![
            vec![Value::String("a".into()), Value::Int(5)],
            vec![Value::String("a".into()), Value::Null],
            vec![Value::String("a".into()), Value::Int(2)],
        ]);
        let min = agg(FuncName::Min, vec![field("v")], "mn");
        let max = agg(FuncName::Max, vec![field("v")], "mx");
        let out = apply_aggregates(t, &[&min, &max], None).unwrap();
        assert_eq!(out.rows, vec![vec![Value::Int(2), Value::Int(5)]]);
    }

    #[test]
    fn min_on_empty_set_is_nil() {
        let t = table(vec![]);
        let min = agg(FuncName::Min, vec![field("v")], "mn");
        let out = apply_aggregates(t, &[&min], None).unwrap();
        assert_eq!(out.rows, vec![vec![Value::Null]]);
    }

    #[test]
    fn sum_stays_integer_until_a_float_appears() {
        let t = table(vec![
            vec![Value::String("a".into()), Value::Int(1)],
            vec![Value::String("a".into()), Value::Int(2)],
        ]);
        let sum = agg(FuncName::Sum, vec![field("v")], "s");
        let out = apply_aggregates(t, &[&sum], None).unwrap();
        assert_eq!(out.rows, vec![vec![Value::Int(3)]]);

        let t = table(vec![
            vec![Value::String("a".into()), Value::Int(1)],
            vec![Value::String("a".into()), Value::Float(0.5)],
        ]);
        let sum = agg(FuncName::Sum, vec![field("v")], "s");
        let out = apply_aggregates(t, &[&sum], None).unwrap();
        assert_eq!(out.rows, vec![vec![Value::Float(1.5)]]);
    }

    #[test]
    fn sum_over_non_numeric_values_is_typed_error() {
        let t = table(vec![vec![
            Value::String("a".into()),
            Value::String("x".into()),
        ]]);
        let sum = agg(FuncName::Sum, vec![field("v")], "s");
        let err = apply_aggregates(t, &[&sum], None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAggregateValues));
        assert_eq!(err.to_string(), "Invalid values for sum/avg");
    }

    #[test]
    fn avg_divides_by_non_nil_count_and_empty_is_nil() {
        let t = table(vec![
            vec![Value::String("a".into()), Value::Int(1)],
            vec![Value::String("a".into()), Value::Null],
            vec![Value::String("a".into()), Value::Int(2)],
        ]);
        let avg = agg(FuncName::Avg, vec![field("v")], "a");
        let out = apply_aggregates(t, &[&avg], None).unwrap();
        assert_eq!(out.rows, vec![vec![Value::Float(1.5)]]);

        let empty = table(vec![vec![Value::String("a".into()), Value::Null]]);
        let avg = agg(FuncName::Avg, vec![field("v")], "a");
        let out = apply_aggregates(empty, &[&avg], None).unwrap();
        assert_eq!(out.rows, vec![vec![Value::Null]]);
    }

    #[test]
    fn group_by_without_aggregates_deduplicates_keys() {
        let t = table(vec![
            vec![Value::String("a".into()), Value::Int(1)],
            vec![Value::String("b".into()), Value::Int(2)],
            vec![Value::String("a".into()), Value::Int(3)],
        ]);
        let key = KeyRef::Field {
            src: "s".into(),
            field: "u".into(),
        };
        let out = apply_aggregates(t, &[], Some(&key)).unwrap();
        assert_eq!(
            out.rows,
            vec![
                vec![Value::String("a".into())],
                vec![Value::String("b".into())],
            ]
        );
    }
}
