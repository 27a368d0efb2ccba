use connectors::{DataSourceSpec, FetchAttribute, FetchRequest};
use sql_syntax::ast::{
    clause::BinaryClause,
    field::{FuncCall, FuncKind},
    JoinType, KeyRef, SortDir,
};

/// A projected attribute: what the SELECT list (or an internal reference)
/// asks for, before connector-specific resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectedField {
    Star {
        src: String,
    },
    Field {
        src: String,
        field: String,
        alias: Option<String>,
    },
}

/// One projection entry plus its plan bookkeeping: the SELECT ordinal the
/// engine projects by, and whether the attribute is fetched only for
/// internal use.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub field: ProjectedField,
    pub index: usize,
    pub drop: bool,
}

impl FieldEntry {
    pub fn covers(&self, src: &str, field: &str) -> bool {
        match &self.field {
            ProjectedField::Star { src: s } => s == src,
            ProjectedField::Field {
                src: s, field: f, ..
            } => s == src && f == field,
        }
    }
}

/// Where a classified function executes.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionTarget {
    /// Rendered into the fetch of `source` and returned as a column.
    Pushdown { source: String, rendered: String },
    /// Evaluated by the engine after fetch.
    Platform,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFunction {
    pub call: FuncCall,
    pub index: usize,
    pub target: FunctionTarget,
}

impl PlannedFunction {
    pub fn is_aggregate(&self) -> bool {
        self.call.kind == FuncKind::Aggregate
    }

    pub fn is_platform(&self) -> bool {
        self.target == FunctionTarget::Platform
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub join_type: JoinType,
    pub clause: BinaryClause,
}

/// Everything needed to fetch one resource: the bound data source, the
/// attribute list, and how the result merges into the pipeline.
#[derive(Debug, Clone)]
pub struct FetchSegment {
    pub alias: String,
    pub src: String,
    pub spec: DataSourceSpec,
    pub attributes: Vec<FetchAttribute>,
    pub merge: Option<JoinSpec>,
}

impl FetchSegment {
    pub fn to_request(&self) -> FetchRequest {
        FetchRequest {
            data_source: self.spec.name.clone(),
            src: self.src.clone(),
            alias: self.alias.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

/// The planner's output: per-source fetches plus the engine-side
/// post-operations, with every attribute the query consults accounted for
/// in exactly one fetch list.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub fields: Vec<FieldEntry>,
    pub functions: Vec<PlannedFunction>,
    pub segments: Vec<FetchSegment>,
    pub where_clause: Option<BinaryClause>,
    pub group_by: Option<KeyRef>,
    pub order_by: Option<(KeyRef, SortDir)>,
    pub limit: Option<usize>,
}

impl QueryPlan {
    /// Platform scalar and varargs functions, in declaration order.
    pub fn platform_scalars(&self) -> Vec<&PlannedFunction> {
        self.functions
            .iter()
            .filter(|f| f.is_platform() && !f.is_aggregate())
            .collect()
    }

    /// Aggregate functions, in declaration order. Aggregates are always
    /// platform-evaluated.
    pub fn aggregates(&self) -> Vec<&PlannedFunction> {
        self.functions.iter().filter(|f| f.is_aggregate()).collect()
    }

    pub fn has_aggregates(&self) -> bool {
        self.functions.iter().any(|f| f.is_aggregate())
    }
}
