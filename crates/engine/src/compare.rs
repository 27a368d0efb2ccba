use crate::error::EngineError;
use model::value::Value;
use sql_syntax::ast::clause::CompareOp;
use std::cmp::Ordering;

/// Total order over cell values with two-sided coercion:
/// boolean vs non-boolean compares both sides as strings, numeric vs
/// string parses the string side, mixed numerics compare numerically, and
/// `Null` is greater than everything (so it sorts last ascending, first
/// descending) while `Null = Null` holds.
pub fn compare(v1: &Value, v2: &Value) -> Result<Ordering, EngineError> {
    use Value::*;
    match (v1, v2) {
        (Null, Null) => Ok(Ordering::Equal),
        (Null, _) => Ok(Ordering::Greater),
        (_, Null) => Ok(Ordering::Less),

        (Boolean(a), Boolean(b)) => Ok(a.cmp(b)),
        (Boolean(_), _) | (_, Boolean(_)) => Ok(v1.render().cmp(&v2.render())),

        (Int(a), Int(b)) => Ok(a.cmp(b)),
        (Float(a), Float(b)) => Ok(total_float(*a, *b)),
        (Int(a), Float(b)) => Ok(total_float(*a as f64, *b)),
        (Float(a), Int(b)) => Ok(total_float(*a, *b as f64)),

        (Int(a), String(s)) => Ok(a.cmp(&parse_int(s)?)),
        (String(s), Int(b)) => Ok(parse_int(s)?.cmp(b)),
        (Float(a), String(s)) => Ok(total_float(*a, parse_float(s)?)),
        (String(s), Float(b)) => Ok(total_float(parse_float(s)?, *b)),

        (String(a), String(b)) => Ok(a.cmp(b)),
    }
}

/// Evaluate one comparison operator through the coercing order.
pub fn eval_op(op: CompareOp, v1: &Value, v2: &Value) -> Result<bool, EngineError> {
    let ordering = compare(v1, v2)?;
    Ok(match op {
        CompareOp::Equals => ordering == Ordering::Equal,
        CompareOp::NotEquals => ordering != Ordering::Equal,
        CompareOp::Less => ordering == Ordering::Less,
        CompareOp::Greater => ordering == Ordering::Greater,
        CompareOp::LessEquals => ordering != Ordering::Greater,
        CompareOp::GreaterEquals => ordering != Ordering::Less,
    })
}

fn total_float(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn parse_int(s: &str) -> Result<i64, EngineError> {
    s.parse::<i64>()
        .map_err(|_| EngineError::Coercion(format!("cannot compare '{s}' with an integer")))
}

fn parse_float(s: &str) -> Result<f64, EngineError> {
    s.parse::<f64>()
        .map_err(|_| EngineError::Coercion(format!("cannot compare '{s}' with a float")))
}
