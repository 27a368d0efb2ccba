use thiserror::Error;

/// Errors raised while opening a source or preparing a fetch.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Kerberos authentication failed: {0}")]
    Kerberos(String),

    #[error("Prepare failed: {0}")]
    Prepare(String),

    #[error("Unknown column '{column}' in source '{src}'")]
    UnknownColumn { src: String, column: String },

    #[error("Unknown endpoint mapping: {0}")]
    UnknownMapping(String),

    #[error("No connector registered for type '{source_type}' version {version:?}")]
    NotRegistered {
        source_type: String,
        version: Option<i64>,
    },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Invalid result path '{0}'")]
    InvalidResultPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Support for {0} is not compiled into this build")]
    Unsupported(&'static str),
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        ConnectorError::Http(err.to_string())
    }
}

/// Errors yielded inline by a row stream. The consumer short-circuits on
/// the first one.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Row read failed: {0}")]
    Read(String),

    #[error("Value coercion failed: {0}")]
    Coerce(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("SPNEGO negotiation exhausted after {0} rounds")]
    NegotiateExhausted(usize),

    #[error("JSON error: {0}")]
    Json(String),
}
