use crate::error::FetchError;
use model::row::{ColumnIndex, Row};

/// What the planner asks a connector to fetch for one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// The data-source name the resource was declared under, for messages.
    pub data_source: String,
    /// Table name, file name, or endpoint-mapping key.
    pub src: String,
    /// The resource alias; every emitted column descriptor carries it.
    pub alias: String,
    pub attributes: Vec<FetchAttribute>,
}

/// One entry of a per-source fetch list.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchAttribute {
    /// A native column of the source.
    Field {
        name: String,
        alias: Option<String>,
        /// Fetched for internal use (join key, filter, function input) and
        /// stripped from the projected output.
        drop: bool,
    },
    /// Every column of the source.
    Star,
    /// A pushdown function rendered into the source query, selected
    /// `{sql} AS {ident}`.
    Rendered {
        sql: String,
        ident: String,
        function: String,
        alias: Option<String>,
    },
}

impl FetchAttribute {
    pub fn field(name: impl Into<String>) -> Self {
        FetchAttribute::Field {
            name: name.into(),
            alias: None,
            drop: false,
        }
    }
}

/// A prepared fetch: the ordered output schema plus a lazy row stream.
/// Stream errors are yielded inline and abort the consumer.
pub struct ResultHandle {
    pub columns: ColumnIndex,
    pub rows: RowIter,
}

impl std::fmt::Debug for ResultHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultHandle")
            .field("columns", &self.columns)
            .field("rows", &"RowIter")
            .finish()
    }
}

pub type RowIter = Box<dyn Iterator<Item = Result<Row, FetchError>> + Send>;

impl ResultHandle {
    pub fn new(columns: ColumnIndex, rows: RowIter) -> Self {
        ResultHandle { columns, rows }
    }

    pub fn empty(columns: ColumnIndex) -> Self {
        ResultHandle {
            columns,
            rows: Box::new(std::iter::empty()),
        }
    }
}
