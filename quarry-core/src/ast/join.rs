//! Join clauses and their ON trees.

use crate::ast::expr::{Ref, TableRef};
use crate::ast::operators::Operator;
use crate::ast::query::Query;
use crate::ast::raw::Raw;
use crate::ast::values::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "inner join",
            JoinKind::Left => "left join",
            JoinKind::Right => "right join",
            JoinKind::Full => "full outer join",
            JoinKind::Cross => "cross join",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinTarget {
    Table(TableRef),
    Subquery { query: Box<Query>, alias: String },
    Raw(Raw),
}

/// One ON-clause condition, joined to the previous one by `bool_op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnEntry {
    pub bool_op: super::predicate::BoolOp,
    pub not: bool,
    pub condition: OnCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OnCondition {
    /// `a.x <op> b.y` — both sides are column references.
    Columns { lhs: Ref, op: Operator, rhs: Ref },
    /// `a.x <op> ?` — right side is a bound value (`onVal`).
    Value { lhs: Ref, op: Operator, value: Value },
    In { column: Ref, values: Vec<Value> },
    Between { column: Ref, low: Value, high: Value },
    Exists { query: Box<Query> },
    Null { column: Ref },
    Raw(Raw),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub target: JoinTarget,
    /// Empty for cross joins and USING joins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on: Vec<OnEntry>,
    /// Columns of a `USING (...)` clause; mutually exclusive with `on`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub using: Vec<String>,
}
