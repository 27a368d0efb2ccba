use crate::{error::EngineError, table::TableData};
use model::row::ColumnIndex;
use planner::{ProjectedField, QueryPlan};

/// Final projection: order the kept columns by their SELECT ordinal,
/// expand `Star` through the source's fetched columns, and drop internal
/// attributes and join markers.
pub fn project(table: TableData, plan: &QueryPlan) -> Result<TableData, EngineError> {
    enum Item<'a> {
        Field { src: &'a str, field: &'a str },
        Star { src: &'a str },
        Function { ident: &'a str },
    }

    let mut items: Vec<(usize, Item<'_>)> = Vec::new();
    for entry in plan.fields.iter().filter(|f| !f.drop) {
        let item = match &entry.field {
            ProjectedField::Star { src } => Item::Star { src },
            ProjectedField::Field { src, field, .. } => Item::Field { src, field },
        };
        items.push((entry.index, item));
    }
    for function in &plan.functions {
        items.push((
            function.index,
            Item::Function {
                ident: &function.call.ident,
            },
        ));
    }
    items.sort_by_key(|(index, _)| *index);

    let mut ordinals: Vec<usize> = Vec::new();
    for (_, item) in items {
        match item {
            Item::Field { src, field } => {
                let idx = table
                    .columns
                    .position_ignore_alias(src, field)
                    .ok_or_else(|| EngineError::ColumnNotFound(format!("{src}.{field}")))?;
                ordinals.push(idx);
            }
            Item::Star { src } => ordinals.extend(table.columns.positions_of_source(src)),
            Item::Function { ident } => {
                let idx = table
                    .columns
                    .position_of_function(ident)
                    .ok_or_else(|| EngineError::ColumnNotFound(ident.to_string()))?;
                ordinals.push(idx);
            }
        }
    }

    let columns = ColumnIndex::new(
        ordinals
            .iter()
            .map(|&i| table.columns.columns()[i].clone())
            .collect(),
    );
    let rows = table
        .rows
        .into_iter()
        .map(|row| ordinals.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Ok(TableData::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        row::{ColumnDescriptor, RowMarker},
        value::Value,
    };
    use planner::{FieldEntry, FunctionTarget, PlannedFunction};
    use sql_syntax::ast::field::{FuncCall, FuncName};

    fn plan(fields: Vec<FieldEntry>, functions: Vec<PlannedFunction>) -> QueryPlan {
        QueryPlan {
            fields,
            functions,
            segments: vec![],
            where_clause: None,
            group_by: None,
            order_by: None,
            limit: None,
        }
    }

    #[test]
    fn projection_restores_declaration_order_and_strips_markers() {
        // Fetched layout: [func output, a.id(dropped), a.name, marker]
        let table = TableData::new(
            ColumnIndex::new(vec![
                ColumnDescriptor::function("lower", "lower_0"),
                ColumnDescriptor::field("a", "id"),
                ColumnDescriptor::field("a", "name").with_alias(Some("label".into())),
                ColumnDescriptor::marker(RowMarker::LhsIndex),
            ]),
            vec![vec![
                Value::String("x".into()),
                Value::Int(7),
                Value::String("X".into()),
                Value::Int(0),
            ]],
        );

        let p = plan(
            vec![
                FieldEntry {
                    field: ProjectedField::Field {
                        src: "a".into(),
                        field: "name".into(),
                        alias: Some("label".into()),
                    },
                    index: 1,
                    drop: false,
                },
                FieldEntry {
                    field: ProjectedField::Field {
                        src: "a".into(),
                        field: "id".into(),
                        alias: None,
                    },
                    index: 2,
                    drop: true,
                },
            ],
            vec![PlannedFunction {
                call: FuncCall {
                    name: FuncName::Lower,
                    kind: FuncName::Lower.kind(),
                    params: vec![],
                    alias: None,
                    ident: "lower_0".into(),
                },
                index: 0,
                target: FunctionTarget::Platform,
            }],
        );

        let out = project(table, &p).unwrap();
        let names: Vec<&str> = out
            .columns
            .columns()
            .iter()
            .map(|c| c.output_name())
            .collect();
        assert_eq!(names, vec!["lower_0", "label"]);
        assert_eq!(
            out.rows,
            vec![vec![Value::String("x".into()), Value::String("X".into())]]
        );
    }

    #[test]
    fn star_expands_in_source_order() {
        let table = TableData::new(
            ColumnIndex::new(vec![
                ColumnDescriptor::field("a", "id"),
                ColumnDescriptor::field("b", "x"),
                ColumnDescriptor::field("a", "name"),
                ColumnDescriptor::marker(RowMarker::RhsIndex),
            ]),
            vec![vec![
                Value::Int(1),
                Value::String("bx".into()),
                Value::String("n".into()),
                Value::Int(0),
            ]],
        );
        let p = plan(
            vec![FieldEntry {
                field: ProjectedField::Star { src: "a".into() },
                index: 0,
                drop: false,
            }],
            vec![],
        );
        let out = project(table, &p).unwrap();
        let names: Vec<&str> = out
            .columns
            .columns()
            .iter()
            .map(|c| c.output_name())
            .collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn missing_projected_column_is_reported() {
        let table = TableData::new(
            ColumnIndex::new(vec![ColumnDescriptor::field("a", "id")]),
            vec![],
        );
        let p = plan(
            vec![FieldEntry {
                field: ProjectedField::Field {
                    src: "a".into(),
                    field: "ghost".into(),
                    alias: None,
                },
                index: 0,
                drop: false,
            }],
            vec![],
        );
        assert!(matches!(
            project(table, &p).unwrap_err(),
            EngineError::ColumnNotFound(_)
        ));
    }
}
