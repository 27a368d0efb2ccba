use crate::{
    row::{ColumnIndex, Row},
    value::Value,
};
use serde::{Deserialize, Serialize};

/// The spill-file document: `{"data":{"columns":[...],"rows":[[...]]}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultDocument {
    pub data: ResultData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultDocument {
    pub fn new(columns: &ColumnIndex, rows: &[Row]) -> Self {
        let column_names = columns
            .columns()
            .iter()
            .map(|c| c.output_name().to_string())
            .collect();
        let json_rows = rows
            .iter()
            .map(|row| row.iter().map(Value::to_json).collect())
            .collect();
        ResultDocument {
            data: ResultData {
                columns: column_names,
                rows: json_rows,
            },
        }
    }
}
