use crate::table::TableData;

/// Keep the first `n` rows.
pub fn limit(mut table: TableData, n: usize) -> TableData {
    table.rows.truncate(n);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        row::{ColumnDescriptor, ColumnIndex},
        value::Value,
    };

    #[test]
    fn truncates_to_first_n_rows() {
        let table = TableData::new(
            ColumnIndex::new(vec![ColumnDescriptor::field("s", "v")]),
            vec![
                vec![Value::Int(1)],
                vec![Value::Int(2)],
                vec![Value::Int(3)],
            ],
        );
        let out = limit(table, 2);
        assert_eq!(out.rows, vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
    }

    #[test]
    fn limit_beyond_length_is_a_no_op() {
        let table = TableData::new(
            ColumnIndex::new(vec![ColumnDescriptor::field("s", "v")]),
            vec![vec![Value::Int(1)]],
        );
        assert_eq!(limit(table, 10).rows.len(), 1);
    }
}
