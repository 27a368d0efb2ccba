use thiserror::Error;

/// Syntax failure. `position` is the byte offset of the first unconsumed
/// input and `remaining` the tail starting there, so callers can point at
/// exactly what the parser gave up on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at offset {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
    pub remaining: String,
}

impl ParseError {
    pub fn new(input: &str, position: usize, message: impl Into<String>) -> Self {
        let position = position.min(input.len());
        ParseError {
            message: message.into(),
            position,
            remaining: input[position..].to_string(),
        }
    }
}
