pub mod clause;
pub mod field;
pub mod resource;

use clause::BinaryClause;
use field::FieldExpr;
use resource::Resource;
use serde::Serialize;

/// A parsed query: an ordered list of segments, `Select` always first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Segment {
    Select(SelectSegment),
    Join(JoinSegment),
    Where(WhereSegment),
    GroupBy(GroupBySegment),
    OrderBy(OrderBySegment),
    Limit(LimitSegment),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectSegment {
    pub fields: Vec<FieldExpr>,
    pub resource: Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinType {
    Left,
    Right,
    Inner,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinSegment {
    pub join_type: JoinType,
    pub resource: Resource,
    pub clause: BinaryClause,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhereSegment {
    pub clause: BinaryClause,
}

/// A group or sort key: either a `(source, field)` reference or a reference
/// to an output alias declared in the SELECT list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum KeyRef {
    Field { src: String, field: String },
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBySegment {
    pub key: KeyRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBySegment {
    pub key: KeyRef,
    pub dir: SortDir,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitSegment {
    pub n: usize,
}

impl Query {
    pub fn select(&self) -> Option<&SelectSegment> {
        self.segments.iter().find_map(|s| match s {
            Segment::Select(sel) => Some(sel),
            _ => None,
        })
    }

    pub fn joins(&self) -> Vec<&JoinSegment> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Join(j) => Some(j),
                _ => None,
            })
            .collect()
    }

    pub fn where_clause(&self) -> Option<&WhereSegment> {
        self.segments.iter().find_map(|s| match s {
            Segment::Where(w) => Some(w),
            _ => None,
        })
    }

    pub fn group_by(&self) -> Option<&GroupBySegment> {
        self.segments.iter().find_map(|s| match s {
            Segment::GroupBy(g) => Some(g),
            _ => None,
        })
    }

    pub fn order_by(&self) -> Option<&OrderBySegment> {
        self.segments.iter().find_map(|s| match s {
            Segment::OrderBy(o) => Some(o),
            _ => None,
        })
    }

    pub fn limit(&self) -> Option<usize> {
        self.segments.iter().find_map(|s| match s {
            Segment::Limit(l) => Some(l.n),
            _ => None,
        })
    }
}
