use crate::{compare::eval_op, error::EngineError, table::TableData};
use model::{row::Row, value::Value};
use sql_syntax::ast::clause::{BinaryClause, NumberLit, Operand};

enum ResolvedOperand {
    Column(usize),
    Literal(Value),
}

impl ResolvedOperand {
    fn value<'a>(&'a self, row: &'a Row) -> &'a Value {
        match self {
            ResolvedOperand::Column(idx) => &row[*idx],
            ResolvedOperand::Literal(value) => value,
        }
    }
}

fn resolve(table: &TableData, operand: &Operand) -> Result<ResolvedOperand, EngineError> {
    match operand {
        Operand::Field { src, field } => table
            .columns
            .position_ignore_alias(src, field)
            .map(ResolvedOperand::Column)
            .ok_or_else(|| EngineError::ColumnNotFound(format!("{src}.{field}"))),
        Operand::QuotedString(s) => Ok(ResolvedOperand::Literal(Value::String(s.clone()))),
        Operand::Number(NumberLit::Int(n)) => Ok(ResolvedOperand::Literal(Value::Int(*n))),
        Operand::Number(NumberLit::Float(f)) => Ok(ResolvedOperand::Literal(Value::Float(*f))),
    }
}

/// Keep the rows for which the single WHERE comparison holds.
pub fn filter(table: TableData, clause: &BinaryClause) -> Result<TableData, EngineError> {
    let lhs = resolve(&table, &clause.p1)?;
    let rhs = resolve(&table, &clause.p2)?;

    let mut rows = Vec::with_capacity(table.rows.len());
    for row in table.rows {
        if eval_op(clause.op, lhs.value(&row), rhs.value(&row))? {
            rows.push(row);
        }
    }
    Ok(TableData::new(table.columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::row::{ColumnDescriptor, ColumnIndex};
    use sql_syntax::ast::clause::CompareOp;

    fn table() -> TableData {
        TableData::new(
            ColumnIndex::new(vec![
                ColumnDescriptor::field("s", "n"),
                ColumnDescriptor::field("s", "name"),
            ]),
            vec![
                vec![Value::String("3".into()), Value::String("a".into())],
                vec![Value::Int(4), Value::String("b".into())],
                vec![Value::Int(3), Value::String("c".into())],
            ],
        )
    }

    #[test]
    fn literal_comparison_coerces_string_cells() {
        let clause = BinaryClause {
            p1: Operand::Field {
                src: "s".into(),
                field: "n".into(),
            },
            op: CompareOp::Equals,
            p2: Operand::Number(NumberLit::Int(3)),
        };
        let out = filter(table(), &clause).unwrap();
        // the CSV-style "3" row coerces and matches alongside the Int(3) row
        assert_eq!(out.rows.len(), 2);
    }

    #[test]
    fn field_to_field_comparison_works() {
        let clause = BinaryClause {
            p1: Operand::Field {
                src: "s".into(),
                field: "name".into(),
            },
            op: CompareOp::Greater,
            p2: Operand::QuotedString("a".into()),
        };
        let out = filter(table(), &clause).unwrap();
        assert_eq!(out.rows.len(), 2);
    }

    #[test]
    fn unknown_column_is_reported() {
        let clause = BinaryClause {
            p1: Operand::Field {
                src: "s".into(),
                field: "missing".into(),
            },
            op: CompareOp::Equals,
            p2: Operand::Number(NumberLit::Int(1)),
        };
        let err = filter(table(), &clause).unwrap_err();
        assert!(matches!(err, EngineError::ColumnNotFound(_)));
    }

    #[test]
    fn coercion_failure_aborts_the_filter() {
        let clause = BinaryClause {
            p1: Operand::Field {
                src: "s".into(),
                field: "name".into(),
            },
            op: CompareOp::Equals,
            p2: Operand::Number(NumberLit::Int(1)),
        };
        let err = filter(table(), &clause).unwrap_err();
        assert!(matches!(err, EngineError::Coercion(_)));
    }
}
