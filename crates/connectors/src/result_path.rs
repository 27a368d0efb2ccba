use crate::error::ConnectorError;

/// A dotted path selecting where result rows live inside a JSON document:
/// `$` is the document root, `$.a.b` descends through object keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPath {
    segments: Vec<String>,
}

impl ResultPath {
    pub fn root() -> Self {
        ResultPath {
            segments: Vec::new(),
        }
    }

    pub fn parse(path: &str) -> Result<Self, ConnectorError> {
        let trimmed = path.trim();
        if trimmed == "$" {
            return Ok(ResultPath::root());
        }
        let rest = trimmed
            .strip_prefix("$.")
            .ok_or_else(|| ConnectorError::InvalidResultPath(path.to_string()))?;
        if rest.is_empty() {
            return Err(ConnectorError::InvalidResultPath(path.to_string()));
        }
        let segments: Vec<String> = rest.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConnectorError::InvalidResultPath(path.to_string()));
        }
        Ok(ResultPath { segments })
    }

    /// Descend into `doc`; `None` when any segment is missing or crosses a
    /// non-object.
    pub fn eval<'a>(&self, doc: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        let mut node = doc;
        for segment in &self.segments {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }
}

impl std::fmt::Display for ResultPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$");
        }
        write!(f, "$.{}", self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_returns_document() {
        let doc = serde_json::json!([1, 2]);
        let path = ResultPath::parse("$").unwrap();
        assert_eq!(path.eval(&doc), Some(&doc));
    }

    #[test]
    fn dotted_path_descends_objects() {
        let doc = serde_json::json!({"result": {"items": [1]}});
        let path = ResultPath::parse("$.result.items").unwrap();
        assert_eq!(path.eval(&doc), Some(&serde_json::json!([1])));
    }

    #[test]
    fn missing_segment_yields_none() {
        let doc = serde_json::json!({"result": []});
        let path = ResultPath::parse("$.other").unwrap();
        assert_eq!(path.eval(&doc), None);
    }

    #[test]
    fn malformed_paths_are_rejected() {
        for bad in ["", "result", "$.", "$..a"] {
            assert!(ResultPath::parse(bad).is_err(), "accepted {bad:?}");
        }
    }
}
