use crate::{
    coerce::coerce_scalar,
    error::{ConnectorError, FetchError},
    request::{FetchAttribute, FetchRequest, ResultHandle},
};
use ::csv::ReaderBuilder;
use model::row::{ColumnDescriptor, ColumnIndex, Row};
use std::{collections::HashSet, path::Path};

/// Prepare a CSV fetch: the header row is the schema, requested columns
/// are mapped to header ordinals, and records stream lazily with implicit
/// numeric coercion.
pub fn prepare(
    path: &Path,
    delimiter: u8,
    request: &FetchRequest,
) -> Result<ResultHandle, ConnectorError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| ConnectorError::Connect(format!("{}: {e}", path.display())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ConnectorError::Prepare(format!("reading CSV header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut columns = ColumnIndex::default();
    let mut ordinals: Vec<usize> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for attr in &request.attributes {
        match attr {
            FetchAttribute::Field { name, alias, .. } => {
                if !seen.insert(name.clone()) {
                    continue;
                }
                let ordinal = headers.iter().position(|h| h == name).ok_or_else(|| {
                    ConnectorError::UnknownColumn {
                        src: request.src.clone(),
                        column: name.clone(),
                    }
                })?;
                columns
                    .push(ColumnDescriptor::field(&request.alias, name).with_alias(alias.clone()));
                ordinals.push(ordinal);
            }
            FetchAttribute::Star => {
                for (ordinal, header) in headers.iter().enumerate() {
                    if !seen.insert(header.clone()) {
                        continue;
                    }
                    columns.push(ColumnDescriptor::field(&request.alias, header));
                    ordinals.push(ordinal);
                }
            }
            FetchAttribute::Rendered { .. } => {
                return Err(ConnectorError::Prepare(
                    "function pushdown is not supported for file sources".into(),
                ));
            }
        }
    }

    let rows = reader.into_records().map(move |record| match record {
        Ok(record) => ordinals
            .iter()
            .map(|&ordinal| coerce_scalar(record.get(ordinal).unwrap_or("")))
            .collect::<Result<Row, FetchError>>(),
        Err(e) => Err(FetchError::Read(e.to_string())),
    });

    Ok(ResultHandle::new(columns, Box::new(rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::value::Value;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn request(attributes: Vec<FetchAttribute>) -> FetchRequest {
        FetchRequest {
            data_source: "csv".into(),
            src: "one.csv".into(),
            alias: "c".into(),
            attributes,
        }
    }

    #[test]
    fn star_uses_header_schema_and_coerces_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "one.csv", "id,name\n1,Testing\n2,Two\n");
        let handle = prepare(&path, b',', &request(vec![FetchAttribute::Star])).unwrap();

        let names: Vec<&str> = handle
            .columns
            .columns()
            .iter()
            .map(|c| c.output_name())
            .collect();
        assert_eq!(names, vec!["id", "name"]);

        let rows: Vec<Row> = handle.rows.collect::<Result<_, _>>().unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::Int(1), Value::String("Testing".into())],
                vec![Value::Int(2), Value::String("Two".into())],
            ]
        );
    }

    #[test]
    fn explicit_columns_follow_request_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "one.csv", "id,name\n1,A\n");
        let handle = prepare(
            &path,
            b',',
            &request(vec![
                FetchAttribute::field("name"),
                FetchAttribute::field("id"),
            ]),
        )
        .unwrap();
        let rows: Vec<Row> = handle.rows.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, vec![vec![Value::String("A".into()), Value::Int(1)]]);
    }

    #[test]
    fn star_plus_explicit_column_is_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "one.csv", "id,name\n1,A\n");
        let handle = prepare(
            &path,
            b',',
            &request(vec![FetchAttribute::Star, FetchAttribute::field("id")]),
        )
        .unwrap();
        assert_eq!(handle.columns.len(), 2);
    }

    #[test]
    fn unknown_column_is_a_prepare_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "one.csv", "id\n1\n");
        let err = prepare(&path, b',', &request(vec![FetchAttribute::field("nope")])).unwrap_err();
        assert!(matches!(err, ConnectorError::UnknownColumn { .. }));
    }

    #[test]
    fn missing_file_is_a_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare(
            &dir.path().join("absent.csv"),
            b',',
            &request(vec![FetchAttribute::Star]),
        )
        .unwrap_err();
        assert!(matches!(err, ConnectorError::Connect(_)));
    }

    #[test]
    fn custom_separator_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "semi.csv", "a;b\n1;x\n");
        let handle = prepare(&path, b';', &request(vec![FetchAttribute::Star])).unwrap();
        let rows: Vec<Row> = handle.rows.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, vec![vec![Value::Int(1), Value::String("x".into())]]);
    }
}
