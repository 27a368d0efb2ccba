use model::row::{ColumnIndex, Row};

/// A materialised intermediate result: the rows plus the column index that
/// names them. Operators consume and produce this shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub columns: ColumnIndex,
    pub rows: Vec<Row>,
}

impl TableData {
    pub fn new(columns: ColumnIndex, rows: Vec<Row>) -> Self {
        TableData { columns, rows }
    }

    pub fn empty() -> Self {
        TableData {
            columns: ColumnIndex::default(),
            rows: Vec::new(),
        }
    }
}
