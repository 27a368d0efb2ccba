use serde::Serialize;

/// A `(data_source, src)` naming of a table, file, or API mapping. The
/// alias is mandatory and is how every other clause refers back to the
/// resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub data_source: String,
    pub src: String,
    pub alias: String,
}
