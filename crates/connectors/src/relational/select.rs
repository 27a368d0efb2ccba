use crate::{
    error::ConnectorError,
    request::{FetchAttribute, FetchRequest},
};
use model::row::{ColumnDescriptor, ColumnIndex};
use std::collections::HashSet;

/// Render the single SELECT a relational fetch issues, together with the
/// column index describing its projection.
///
/// When the request contains `Star`, `expanded` carries the table's full
/// column list (from the catalog probe); it is prepended to the explicit
/// projection and duplicates are dropped.
pub fn build_select(
    request: &FetchRequest,
    expanded: Option<&[String]>,
) -> Result<(String, ColumnIndex), ConnectorError> {
    let alias = &request.alias;
    let mut projection: Vec<String> = Vec::new();
    let mut columns = ColumnIndex::default();
    let mut seen: HashSet<String> = HashSet::new();

    if request.attributes.iter().any(|a| matches!(a, FetchAttribute::Star)) {
        let expanded = expanded.ok_or_else(|| {
            ConnectorError::Prepare(format!(
                "star projection on '{}' requires the expanded column list",
                request.src
            ))
        })?;
        for column in expanded {
            if !seen.insert(column.clone()) {
                continue;
            }
            projection.push(format!("{alias}.{column}"));
            columns.push(ColumnDescriptor::field(alias, column));
        }
    }

    for attr in &request.attributes {
        match attr {
            FetchAttribute::Field {
                name,
                alias: user_alias,
                ..
            } => {
                if !seen.insert(name.clone()) {
                    continue;
                }
                projection.push(format!("{alias}.{name}"));
                columns.push(ColumnDescriptor::field(alias, name).with_alias(user_alias.clone()));
            }
            FetchAttribute::Star => {}
            FetchAttribute::Rendered {
                sql,
                ident,
                function,
                alias: user_alias,
            } => {
                projection.push(format!("{sql} AS {ident}"));
                columns
                    .push(ColumnDescriptor::function(function, ident).with_alias(user_alias.clone()));
            }
        }
    }

    if projection.is_empty() {
        return Err(ConnectorError::Prepare(format!(
            "empty projection for '{}'",
            request.src
        )));
    }

    let sql = format!(
        "SELECT {} FROM {} {}",
        projection.join(", "),
        request.src,
        alias
    );
    Ok((sql, columns))
}
