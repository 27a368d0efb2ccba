use crate::{
    error::{ConnectorError, FetchError},
    request::{FetchAttribute, FetchRequest, ResultHandle},
    result_path::ResultPath,
};
use model::{
    row::{ColumnDescriptor, ColumnIndex, Row},
    value::Value,
};
use std::{collections::HashSet, path::Path};

/// Prepare a JSON-file fetch: the document is parsed, rows are taken from
/// the configured result path, and `Star` infers the schema from the first
/// object's keys.
pub async fn prepare(
    path: &Path,
    result_path: &ResultPath,
    request: &FetchRequest,
) -> Result<ResultHandle, ConnectorError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ConnectorError::Connect(format!("{}: {e}", path.display())))?;
    let doc: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ConnectorError::Prepare(format!("invalid JSON in {}: {e}", path.display())))?;
    rows_from_document(&doc, result_path, request)
}

/// Shared row extraction for JSON documents (files and web-API bodies).
pub fn rows_from_document(
    doc: &serde_json::Value,
    result_path: &ResultPath,
    request: &FetchRequest,
) -> Result<ResultHandle, ConnectorError> {
    let rows_node = result_path.eval(doc).ok_or_else(|| {
        ConnectorError::Prepare(format!("result path {result_path} not present in document"))
    })?;
    let elements = rows_node.as_array().ok_or_else(|| {
        ConnectorError::Prepare(format!("result path {result_path} does not point at an array"))
    })?;

    let first_keys: Vec<String> = elements
        .first()
        .and_then(|e| e.as_object())
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();

    let mut columns = ColumnIndex::default();
    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for attr in &request.attributes {
        match attr {
            FetchAttribute::Field { name, alias, .. } => {
                if !seen.insert(name.clone()) {
                    continue;
                }
                columns
                    .push(ColumnDescriptor::field(&request.alias, name).with_alias(alias.clone()));
                names.push(name.clone());
            }
            FetchAttribute::Star => {
                for key in &first_keys {
                    if !seen.insert(key.clone()) {
                        continue;
                    }
                    columns.push(ColumnDescriptor::field(&request.alias, key));
                    names.push(key.clone());
                }
            }
            FetchAttribute::Rendered { .. } => {
                return Err(ConnectorError::Prepare(
                    "function pushdown is not supported for JSON sources".into(),
                ));
            }
        }
    }

    let rows: Vec<Result<Row, FetchError>> = elements
        .iter()
        .map(|element| match element.as_object() {
            Some(obj) => Ok(names
                .iter()
                .map(|name| obj.get(name).map(Value::from_json).unwrap_or(Value::Null))
                .collect()),
            None => Err(FetchError::Json(format!(
                "expected an object row, got {element}"
            ))),
        })
        .collect();

    Ok(ResultHandle::new(columns, Box::new(rows.into_iter())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(attributes: Vec<FetchAttribute>) -> FetchRequest {
        FetchRequest {
            data_source: "json".into(),
            src: "two.json".into(),
            alias: "j".into(),
            attributes,
        }
    }

    #[test]
    fn star_infers_schema_from_first_object() {
        let doc = serde_json::json!({
            "result": [
                {"id": 1, "category": "A"},
                {"id": 2, "category": "Part"},
            ]
        });
        let path = ResultPath::parse("$.result").unwrap();
        let handle =
            rows_from_document(&doc, &path, &request(vec![FetchAttribute::Star])).unwrap();

        let names: Vec<&str> = handle
            .columns
            .columns()
            .iter()
            .map(|c| c.output_name())
            .collect();
        assert_eq!(names, vec!["id", "category"]);

        let rows: Vec<Row> = handle.rows.collect::<Result<_, _>>().unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::Int(1), Value::String("A".into())],
                vec![Value::Int(2), Value::String("Part".into())],
            ]
        );
    }

    #[test]
    fn missing_keys_become_null() {
        let doc = serde_json::json!([{"a": 1}, {"b": 2}]);
        let path = ResultPath::root();
        let handle = rows_from_document(
            &doc,
            &path,
            &request(vec![FetchAttribute::field("a"), FetchAttribute::field("b")]),
        )
        .unwrap();
        let rows: Vec<Row> = handle.rows.collect::<Result<_, _>>().unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::Int(1), Value::Null],
                vec![Value::Null, Value::Int(2)],
            ]
        );
    }

    #[test]
    fn non_array_result_path_is_rejected() {
        let doc = serde_json::json!({"result": {"not": "array"}});
        let path = ResultPath::parse("$.result").unwrap();
        let err =
            rows_from_document(&doc, &path, &request(vec![FetchAttribute::Star])).unwrap_err();
        assert!(matches!(err, ConnectorError::Prepare(_)));
    }

    #[test]
    fn non_object_row_errors_inline() {
        let doc = serde_json::json!([{"a": 1}, 42]);
        let handle = rows_from_document(
            &doc,
            &ResultPath::root(),
            &request(vec![FetchAttribute::field("a")]),
        )
        .unwrap();
        let results: Vec<Result<Row, FetchError>> = handle.rows.collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(FetchError::Json(_))));
    }

    #[test]
    fn empty_array_star_yields_no_columns() {
        let doc = serde_json::json!([]);
        let handle =
            rows_from_document(&doc, &ResultPath::root(), &request(vec![FetchAttribute::Star]))
                .unwrap();
        assert!(handle.columns.is_empty());
        assert_eq!(handle.rows.count(), 0);
    }
}
