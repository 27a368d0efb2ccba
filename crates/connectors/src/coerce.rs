use crate::error::FetchError;
use model::value::Value;
use regex::Regex;
use std::sync::LazyLock;

static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer pattern"));
static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+\.\d+$").expect("valid float pattern"));

/// Implicit coercion for sources that only carry text: digits become an
/// integer, digits-dot-digits a float, anything else stays a string.
/// Values that look numeric but do not fit the numeric types abort the
/// stream.
pub fn coerce_scalar(raw: &str) -> Result<Value, FetchError> {
    if INT_RE.is_match(raw) {
        return raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| FetchError::Coerce(format!("integer out of range: {raw}")));
    }
    if FLOAT_RE.is_match(raw) {
        return raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| FetchError::Coerce(format!("invalid float: {raw}")));
    }
    Ok(Value::String(raw.to_string()))
}
