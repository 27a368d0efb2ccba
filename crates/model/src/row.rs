use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows are plain value vectors; all naming lives in the side-car
/// [`ColumnIndex`] so joins and projections can rebuild the layout without
/// touching row storage.
pub type Row = Vec<Value>;

/// Temporary columns the join operator attaches to track row ordinals on
/// each side. They never survive into the projected output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowMarker {
    LhsIndex,
    RhsIndex,
}

impl fmt::Display for RowMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowMarker::LhsIndex => write!(f, "lhs_index"),
            RowMarker::RhsIndex => write!(f, "rhs_index"),
        }
    }
}

/// Where a column came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnOrigin {
    /// A plain field fetched from a source, identified by the resource alias
    /// it was fetched under and its source-side name.
    Field { source: String, name: String },
    /// The output of a scalar or aggregate function. `ident` is the unique
    /// per-query identifier (`lower_2` style) used for projection lookup.
    Function { name: String, ident: String },
    /// Join bookkeeping.
    Marker(RowMarker),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub origin: ColumnOrigin,
    /// The user-supplied output alias, if any.
    pub alias: Option<String>,
}

impl ColumnDescriptor {
    pub fn field(source: impl Into<String>, name: impl Into<String>) -> Self {
        ColumnDescriptor {
            origin: ColumnOrigin::Field {
                source: source.into(),
                name: name.into(),
            },
            alias: None,
        }
    }

    pub fn function(name: impl Into<String>, ident: impl Into<String>) -> Self {
        ColumnDescriptor {
            origin: ColumnOrigin::Function {
                name: name.into(),
                ident: ident.into(),
            },
            alias: None,
        }
    }

    pub fn marker(marker: RowMarker) -> Self {
        ColumnDescriptor {
            origin: ColumnOrigin::Marker(marker),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.origin, ColumnOrigin::Marker(_))
    }

    pub fn source(&self) -> Option<&str> {
        match &self.origin {
            ColumnOrigin::Field { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The name this column gets in the output schema: the user alias if
    /// present, otherwise the source-side field name or the function ident.
    pub fn output_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        match &self.origin {
            ColumnOrigin::Field { name, .. } => name,
            ColumnOrigin::Function { ident, .. } => ident,
            ColumnOrigin::Marker(_) => "",
        }
    }
}

/// Ordered column descriptors plus the lookup logic the operators share.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnIndex {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        ColumnIndex { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn get(&self, idx: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(idx)
    }

    pub fn push(&mut self, descriptor: ColumnDescriptor) {
        self.columns.push(descriptor);
    }

    /// Prepend a descriptor, shifting every existing ordinal by one. Scalar
    /// platform functions insert their output cells at the front of the row.
    pub fn prepend(&mut self, descriptor: ColumnDescriptor) {
        self.columns.insert(0, descriptor);
    }

    /// Concatenate `other` after `self`; the caller shifts any cached RHS
    /// ordinals by `self.len()` before the concatenation.
    pub fn concat(&self, other: &ColumnIndex) -> ColumnIndex {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        ColumnIndex { columns }
    }

    /// Position of a field column matched by `(source, field)` only, ignoring
    /// any user alias on the descriptor.
    pub fn position_ignore_alias(&self, source: &str, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| match &c.origin {
            ColumnOrigin::Field { source: s, name } => s == source && name == field,
            _ => false,
        })
    }

    /// Position of a column by its user-facing output alias: matches the
    /// user alias on any column, or a function column's ident.
    pub fn position_by_alias(&self, alias: &str) -> Option<usize> {
        self.columns.iter().position(|c| {
            if c.alias.as_deref() == Some(alias) {
                return true;
            }
            matches!(&c.origin, ColumnOrigin::Function { ident, .. } if ident == alias)
        })
    }

    pub fn position_of_function(&self, ident: &str) -> Option<usize> {
        self.columns.iter().position(
            |c| matches!(&c.origin, ColumnOrigin::Function { ident: i, .. } if i == ident),
        )
    }

    pub fn position_of_marker(&self, marker: RowMarker) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.origin == ColumnOrigin::Marker(marker))
    }

    /// Ordinals of every non-marker column fetched under `source`, in
    /// source order. `Star` projection expands through this.
    pub fn positions_of_source(&self, source: &str) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.source() == Some(source))
            .map(|(i, _)| i)
            .collect()
    }

    /// Ordinals of every non-marker column, used by `COUNT(*)` over the
    /// whole row.
    pub fn positions_non_marker(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_marker())
            .map(|(i, _)| i)
            .collect()
    }
}

impl From<Vec<ColumnDescriptor>> for ColumnIndex {
    fn from(columns: Vec<ColumnDescriptor>) -> Self {
        ColumnIndex { columns }
    }
}
