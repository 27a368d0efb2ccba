use crate::{error::EngineError, table::TableData};
use model::{
    row::{ColumnDescriptor, Row},
    value::Value,
};
use planner::PlannedFunction;
use sql_syntax::ast::field::{FuncName, FuncParam};

enum ScalarParam {
    Column(usize),
    Literal(Value),
}

impl ScalarParam {
    fn value(&self, row: &Row) -> Value {
        match self {
            ScalarParam::Column(idx) => row[*idx].clone(),
            ScalarParam::Literal(value) => value.clone(),
        }
    }
}

/// Apply platform scalar and varargs functions in declaration order. Each
/// function's output cell is prepended to the row and the column index is
/// rebuilt, so later functions and the projection see the shifted layout.
pub fn apply_scalar_functions(
    mut table: TableData,
    functions: &[&PlannedFunction],
) -> Result<TableData, EngineError> {
    for function in functions {
        let params = resolve_params(&table, function)?;

        let mut outputs = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let args: Vec<Value> = params.iter().map(|p| p.value(row)).collect();
            outputs.push(eval_scalar(function.call.name, &args)?);
        }

        for (row, output) in table.rows.iter_mut().zip(outputs) {
            row.insert(0, output);
        }
        table.columns.prepend(
            ColumnDescriptor::function(
                function.call.name.as_str(),
                function.call.ident.clone(),
            )
            .with_alias(function.call.alias.clone()),
        );
    }
    Ok(table)
}

fn resolve_params(
    table: &TableData,
    function: &PlannedFunction,
) -> Result<Vec<ScalarParam>, EngineError> {
    function
        .call
        .params
        .iter()
        .map(|param| match param {
            FuncParam::Field { src, field } => table
                .columns
                .position_ignore_alias(src, field)
                .map(ScalarParam::Column)
                .ok_or_else(|| EngineError::ColumnNotFound(format!("{src}.{field}"))),
            FuncParam::AliasRef { alias } => table
                .columns
                .position_by_alias(alias)
                .map(ScalarParam::Column)
                .ok_or_else(|| EngineError::ColumnNotFound(alias.clone())),
            FuncParam::QuotedString { unquoted, .. } => {
                Ok(ScalarParam::Literal(Value::String(unquoted.clone())))
            }
            FuncParam::Star { .. } => Err(EngineError::Function(format!(
                "{} does not accept a star parameter",
                function.call.name
            ))),
            FuncParam::Atom(_) => Err(EngineError::Function(format!(
                "{} does not accept DISTINCT",
                function.call.name
            ))),
        })
        .collect()
}

fn eval_scalar(name: FuncName, args: &[Value]) -> Result<Value, EngineError> {
    match name {
        FuncName::Lower => map_string(name, args, |s| s.to_lowercase()),
        FuncName::Upper => map_string(name, args, |s| s.to_uppercase()),
        FuncName::Concat => Ok(Value::String(
            args.iter().map(Value::render).collect::<Vec<_>>().join(""),
        )),
        FuncName::ConcatWs => {
            let Some((separator, values)) = args.split_first() else {
                return Err(EngineError::Function(
                    "concat_ws requires a separator".into(),
                ));
            };
            let joined = values
                .iter()
                .filter(|v| !v.is_null())
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(&separator.render());
            Ok(Value::String(joined))
        }
        other => Err(EngineError::Function(format!(
            "{other} is not a scalar function"
        ))),
    }
}

fn map_string(
    name: FuncName,
    args: &[Value],
    f: impl Fn(&str) -> String,
) -> Result<Value, EngineError> {
    match args {
        [Value::Null] => Ok(Value::Null),
        [Value::String(s)] => Ok(Value::String(f(s))),
        [other] => Err(EngineError::Function(format!(
            "{name} expects a string, got {other:?}"
        ))),
        _ => Err(EngineError::Function(format!(
            "{name} expects exactly one argument"
        ))),
    }
}
