use crate::{
    coerce::coerce_scalar,
    error::{ConnectorError, FetchError},
    relational::select,
    request::{FetchAttribute, FetchRequest},
};
use model::{
    row::{ColumnIndex, Row},
    value::Value,
};
use odbc_api::{buffers::TextRowSet, Connection, ConnectionOptions, Cursor, Environment};
use std::sync::LazyLock;

const BATCH_SIZE: usize = 1024;
const MAX_CELL_BYTES: usize = 4096;

// The ODBC environment must outlive every connection; one per process.
static ENV: LazyLock<Environment> =
    LazyLock::new(|| Environment::new().expect("ODBC environment"));

/// Open a connection, expand `*` through a catalog probe when needed,
/// issue the rendered SELECT, and materialise the rows. NULL sentinels
/// become `Value::Null`; text cells pass through the implicit coercion.
pub fn fetch_blocking(
    conn_str: &str,
    request: &FetchRequest,
) -> Result<(ColumnIndex, Vec<Result<Row, FetchError>>), ConnectorError> {
    let conn = ENV
        .connect_with_connection_string(conn_str, ConnectionOptions::default())
        .map_err(|e| ConnectorError::Connect(e.to_string()))?;

    let needs_star = request
        .attributes
        .iter()
        .any(|a| matches!(a, FetchAttribute::Star));
    let expanded = if needs_star {
        Some(probe_columns(&conn, &request.src)?)
    } else {
        None
    };

    let (sql, columns) = select::build_select(request, expanded.as_deref())?;

    let mut cursor = conn
        .execute(&sql, ())
        .map_err(|e| ConnectorError::Prepare(e.to_string()))?
        .ok_or_else(|| ConnectorError::Prepare("statement produced no result set".into()))?;

    let mut buffers = TextRowSet::for_cursor(BATCH_SIZE, &mut cursor, Some(MAX_CELL_BYTES))
        .map_err(|e| ConnectorError::Prepare(e.to_string()))?;
    let mut row_set_cursor = cursor
        .bind_buffer(&mut buffers)
        .map_err(|e| ConnectorError::Prepare(e.to_string()))?;

    let width = columns.len();
    let mut rows: Vec<Result<Row, FetchError>> = Vec::new();
    loop {
        let batch = match row_set_cursor.fetch() {
            Ok(Some(batch)) => batch,
            Ok(None) => break,
            Err(e) => {
                rows.push(Err(FetchError::Read(e.to_string())));
                break;
            }
        };
        for row_index in 0..batch.num_rows() {
            let mut row: Row = Vec::with_capacity(width);
            let mut failed = None;
            for col_index in 0..width {
                match batch.at(col_index, row_index) {
                    None => row.push(Value::Null),
                    Some(bytes) => {
                        let text = String::from_utf8_lossy(bytes);
                        match coerce_scalar(&text) {
                            Ok(value) => row.push(value),
                            Err(e) => {
                                failed = Some(e);
                                break;
                            }
                        }
                    }
                }
            }
            match failed {
                Some(e) => rows.push(Err(e)),
                None => rows.push(Ok(row)),
            }
        }
    }

    Ok((columns, rows))
}

/// DESCRIBE-equivalent: a zero-row probe whose result-set metadata carries
/// the table's full column list.
fn probe_columns(conn: &Connection<'_>, src: &str) -> Result<Vec<String>, ConnectorError> {
    let mut cursor = conn
        .execute(&format!("SELECT * FROM {src} WHERE 1=0"), ())
        .map_err(|e| ConnectorError::Prepare(e.to_string()))?
        .ok_or_else(|| ConnectorError::Prepare(format!("cannot describe table {src}")))?;
    let names = cursor
        .column_names()
        .map_err(|e| ConnectorError::Prepare(e.to_string()))?
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| ConnectorError::Prepare(e.to_string()))?;
    Ok(names)
}
