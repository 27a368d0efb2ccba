pub mod csv;
pub mod json;
pub mod path;

use crate::{
    error::ConnectorError,
    request::{FetchRequest, ResultHandle},
    result_path::ResultPath,
    spec::DataSourceSpec,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

/// Connector over a directory of flat files. Reads run as the process
/// identity; `src` is always resolved as a child of the configured base
/// directory.
pub struct FileConnector {
    base_dir: PathBuf,
    format: FileFormat,
    delimiter: u8,
    result_path: ResultPath,
}

impl FileConnector {
    pub fn from_spec(spec: &DataSourceSpec) -> Result<Self, ConnectorError> {
        let format = if spec.source_type.eq_ignore_ascii_case("csv") {
            FileFormat::Csv
        } else if spec.source_type.eq_ignore_ascii_case("json") {
            FileFormat::Json
        } else {
            return Err(ConnectorError::Connect(format!(
                "unsupported file source type '{}'",
                spec.source_type
            )));
        };

        let base_dir = spec.prop_path("base_dir").ok_or_else(|| {
            ConnectorError::Connect(format!(
                "file data source '{}' is missing base_dir",
                spec.name
            ))
        })?;

        let delimiter = match spec.prop_str("separator") {
            None => b',',
            Some(s) if s.len() == 1 && s.is_ascii() => s.as_bytes()[0],
            Some(s) => {
                return Err(ConnectorError::Connect(format!(
                    "separator must be a single ASCII character, got '{s}'"
                )));
            }
        };

        let result_path = match spec.prop_str("result_path") {
            Some(p) => ResultPath::parse(p)?,
            None => ResultPath::root(),
        };

        Ok(FileConnector {
            base_dir,
            format,
            delimiter,
            result_path,
        })
    }

    pub async fn prepare(&self, request: &FetchRequest) -> Result<ResultHandle, ConnectorError> {
        let file = path::safe_child(&self.base_dir, &request.src);
        match self.format {
            FileFormat::Csv => csv::prepare(&file, self.delimiter, request),
            FileFormat::Json => json::prepare(&file, &self.result_path, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_selects_format_and_defaults() {
        let spec = DataSourceSpec::new("files", "CSV", None)
            .with_properties(serde_json::json!({"base_dir": "/data"}));
        let conn = FileConnector::from_spec(&spec).unwrap();
        assert_eq!(conn.format, FileFormat::Csv);
        assert_eq!(conn.delimiter, b',');
    }

    #[test]
    fn missing_base_dir_is_rejected() {
        let spec = DataSourceSpec::new("files", "JSON", None);
        assert!(matches!(
            FileConnector::from_spec(&spec),
            Err(ConnectorError::Connect(_))
        ));
    }

    #[test]
    fn multi_char_separator_is_rejected() {
        let spec = DataSourceSpec::new("files", "CSV", None)
            .with_properties(serde_json::json!({"base_dir": "/data", "separator": "||"}));
        assert!(FileConnector::from_spec(&spec).is_err());
    }
}
