//! Predicate trees for WHERE, HAVING and ON clauses.

use crate::ast::expr::Ref;
use crate::ast::operators::Operator;
use crate::ast::query::Query;
use crate::ast::raw::Raw;
use crate::ast::values::Value;
use serde::{Deserialize, Serialize};

/// Connective joining a predicate entry to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

/// Right-hand side of a binary comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Value(Value),
    /// Column-to-column comparison (join conditions, correlated predicates).
    Column(Ref),
    Subquery(Box<Query>),
    Raw(Raw),
}

/// Source of an IN list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InList {
    Values(Vec<Value>),
    Subquery(Box<Query>),
    Raw(Raw),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Binary {
        lhs: Ref,
        op: Operator,
        rhs: Operand,
    },
    In {
        column: Ref,
        list: InList,
    },
    Between {
        column: Ref,
        low: Value,
        high: Value,
    },
    Null {
        column: Ref,
    },
    Exists {
        query: Box<Query>,
    },
    /// Parenthesized sub-tree built by a nested builder callback.
    Group(Vec<WhereEntry>),
    Raw(Raw),
    /// Scalar comparison against a JSON path extraction.
    JsonPath {
        column: Ref,
        path: String,
        op: Operator,
        value: Value,
    },
    /// Column's JSON document contains the given document (superset test).
    JsonContains {
        column: Ref,
        value: Value,
    },
    /// Column's JSON document is contained in the given document (subset test).
    JsonContainedIn {
        column: Ref,
        value: Value,
    },
}

/// One ordered entry of a predicate slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereEntry {
    pub bool_op: BoolOp,
    /// Negates the rendered predicate (`not in`, `is not null`, `not (...)`).
    pub not: bool,
    pub predicate: Predicate,
}

impl WhereEntry {
    pub fn and(predicate: Predicate) -> Self {
        Self {
            bool_op: BoolOp::And,
            not: false,
            predicate,
        }
    }

    pub fn or(predicate: Predicate) -> Self {
        Self {
            bool_op: BoolOp::Or,
            not: false,
            predicate,
        }
    }

    pub fn negated(mut self) -> Self {
        self.not = true;
        self
    }
}
