use serde::Serialize;
use std::fmt;

/// One entry of the SELECT list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldExpr {
    /// All columns of a source alias (`s.*`).
    Star { src: String },
    /// A single column, optionally renamed (`s.name AS label`).
    Field {
        src: String,
        field: String,
        alias: Option<String>,
    },
    FuncCall(FuncCall),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FuncKind {
    Scalar,
    ScalarVarargs,
    Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FuncName {
    Count,
    Min,
    Max,
    Avg,
    Sum,
    Concat,
    ConcatWs,
    Lower,
    Upper,
}

impl FuncName {
    pub fn from_keyword(kw: &str) -> Option<FuncName> {
        match kw {
            "COUNT" => Some(FuncName::Count),
            "MIN" => Some(FuncName::Min),
            "MAX" => Some(FuncName::Max),
            "AVG" => Some(FuncName::Avg),
            "SUM" => Some(FuncName::Sum),
            "CONCAT" => Some(FuncName::Concat),
            "CONCAT_WS" => Some(FuncName::ConcatWs),
            "LOWER" => Some(FuncName::Lower),
            "UPPER" => Some(FuncName::Upper),
            _ => None,
        }
    }

    pub fn kind(&self) -> FuncKind {
        match self {
            FuncName::Count | FuncName::Min | FuncName::Max | FuncName::Avg | FuncName::Sum => {
                FuncKind::Aggregate
            }
            FuncName::Concat | FuncName::ConcatWs => FuncKind::ScalarVarargs,
            FuncName::Lower | FuncName::Upper => FuncKind::Scalar,
        }
    }

    /// Lowercase name, used for synthesised output idents.
    pub fn as_str(&self) -> &'static str {
        match self {
            FuncName::Count => "count",
            FuncName::Min => "min",
            FuncName::Max => "max",
            FuncName::Avg => "avg",
            FuncName::Sum => "sum",
            FuncName::Concat => "concat",
            FuncName::ConcatWs => "concat_ws",
            FuncName::Lower => "lower",
            FuncName::Upper => "upper",
        }
    }

    /// Source-dialect spelling, used when rendering pushdown SQL.
    pub fn sql(&self) -> &'static str {
        match self {
            FuncName::Count => "COUNT",
            FuncName::Min => "MIN",
            FuncName::Max => "MAX",
            FuncName::Avg => "AVG",
            FuncName::Sum => "SUM",
            FuncName::Concat => "CONCAT",
            FuncName::ConcatWs => "CONCAT_WS",
            FuncName::Lower => "LOWER",
            FuncName::Upper => "UPPER",
        }
    }
}

impl fmt::Display for FuncName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The closed atom set usable as a function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AtomLiteral {
    Distinct,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FuncParam {
    /// A column reference (`s.msg`).
    Field { src: String, field: String },
    /// `*` or `s.*`.
    Star { src: Option<String> },
    /// A quoted string literal; `raw` keeps the source spelling, `unquoted`
    /// the unescaped content.
    QuotedString { raw: String, unquoted: String },
    Atom(AtomLiteral),
    /// A bare identifier referring to an output alias of the SELECT list.
    AliasRef { alias: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuncCall {
    pub name: FuncName,
    pub kind: FuncKind,
    pub params: Vec<FuncParam>,
    pub alias: Option<String>,
    /// Unique output identifier within the query: the user alias when given,
    /// otherwise `{name}_{select_index}`.
    pub ident: String,
}

impl FuncCall {
    pub fn is_distinct(&self) -> bool {
        self.params
            .iter()
            .any(|p| matches!(p, FuncParam::Atom(AtomLiteral::Distinct)))
    }

    /// Parameters other than atoms, in declaration order.
    pub fn value_params(&self) -> Vec<&FuncParam> {
        self.params
            .iter()
            .filter(|p| !matches!(p, FuncParam::Atom(_)))
            .collect()
    }
}
