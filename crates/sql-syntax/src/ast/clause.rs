use serde::Serialize;
use std::fmt;

/// The comparison operator set of the dialect. `<>` parses to `NotEquals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Equals,
    NotEquals,
    LessEquals,
    GreaterEquals,
    Less,
    Greater,
}

impl CompareOp {
    pub fn from_token(tok: &str) -> Option<CompareOp> {
        match tok {
            "=" => Some(CompareOp::Equals),
            "<>" => Some(CompareOp::NotEquals),
            "<=" => Some(CompareOp::LessEquals),
            ">=" => Some(CompareOp::GreaterEquals),
            "<" => Some(CompareOp::Less),
            ">" => Some(CompareOp::Greater),
            _ => None,
        }
    }

    /// The operator seen from the other side of the clause: `a < b` is
    /// `b > a`. Equality operators are their own inverse.
    pub fn invert(&self) -> CompareOp {
        match self {
            CompareOp::Equals => CompareOp::Equals,
            CompareOp::NotEquals => CompareOp::NotEquals,
            CompareOp::Less => CompareOp::Greater,
            CompareOp::Greater => CompareOp::Less,
            CompareOp::LessEquals => CompareOp::GreaterEquals,
            CompareOp::GreaterEquals => CompareOp::LessEquals,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tok = match self {
            CompareOp::Equals => "=",
            CompareOp::NotEquals => "<>",
            CompareOp::LessEquals => "<=",
            CompareOp::GreaterEquals => ">=",
            CompareOp::Less => "<",
            CompareOp::Greater => ">",
        };
        write!(f, "{tok}")
    }
}

/// One side of a binary clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    Field { src: String, field: String },
    QuotedString(String),
    Number(NumberLit),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NumberLit {
    Int(i64),
    Float(f64),
}

impl Operand {
    pub fn field_ref(&self) -> Option<(&str, &str)> {
        match self {
            Operand::Field { src, field } => Some((src, field)),
            _ => None,
        }
    }
}

/// A single `lhs op rhs` comparison, the only clause shape the dialect has.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryClause {
    pub p1: Operand,
    pub op: CompareOp,
    pub p2: Operand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_swaps_direction_and_keeps_equality() {
        assert_eq!(CompareOp::Less.invert(), CompareOp::Greater);
        assert_eq!(CompareOp::GreaterEquals.invert(), CompareOp::LessEquals);
        assert_eq!(CompareOp::Equals.invert(), CompareOp::Equals);
        assert_eq!(CompareOp::NotEquals.invert(), CompareOp::NotEquals);
    }
}
