//! The query record: one tagged kind plus ordered clause slots.

use crate::ast::expr::{Ref, SelectItem, TableRef};
use crate::ast::join::Join;
use crate::ast::predicate::WhereEntry;
use crate::ast::raw::Raw;
use crate::ast::values::Value;
use crate::types::ColumnType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Helper for skip_serializing_if on bool fields.
fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryKind {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
    Raw,
    CreateTable,
}

/// Principal relation of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FromTarget {
    Table(TableRef),
    Subquery { query: Box<Query>, alias: String },
    Raw(Raw),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NullsOrder {
    #[default]
    Default,
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderTarget {
    Column(Ref),
    Raw(Raw),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub target: OrderTarget,
    pub direction: SortDirection,
    pub nulls: NullsOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GroupItem {
    Column(Ref),
    Raw(Raw),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Materialization {
    #[default]
    Default,
    Materialized,
    NotMaterialized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CteBody {
    Query(Box<Query>),
    Raw(Raw),
}

/// A common table expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cte {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    pub body: CteBody,
    #[serde(default, skip_serializing_if = "is_false")]
    pub recursive: bool,
    #[serde(default)]
    pub materialization: Materialization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOpKind {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl SetOpKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SetOpKind::Union => "union",
            SetOpKind::UnionAll => "union all",
            SetOpKind::Intersect => "intersect",
            SetOpKind::Except => "except",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SetOperand {
    Query(Box<Query>),
    Raw(Raw),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOp {
    pub kind: SetOpKind,
    pub operand: SetOperand,
    /// Parenthesize the operand.
    pub wrap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConflictAction {
    /// DO NOTHING / INSERT IGNORE.
    Ignore,
    /// DO UPDATE SET; `None` merges every inserted column outside the
    /// conflict target.
    Merge(Option<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnConflict {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    pub action: ConflictAction,
}

/// A named window definition (`WINDOW w AS (...)`), referenced from
/// window-function projections via `over`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partition_by: Vec<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderItem>,
}

impl WindowDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_by: vec![],
            order_by: vec![],
        }
    }

    pub fn partition_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.partition_by
            .extend(cols.into_iter().map(|c| Ref::parse(c.as_ref())));
        self
    }

    pub fn order_by(mut self, col: impl AsRef<str>, direction: SortDirection) -> Self {
        self.order_by.push(OrderItem {
            target: OrderTarget::Column(Ref::parse(col.as_ref())),
            direction,
            nulls: NullsOrder::Default,
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockStrength {
    Update,
    Share,
    NoKeyUpdate,
    KeyShare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockClause {
    pub strength: LockStrength,
    pub skip_locked: bool,
    pub no_wait: bool,
    /// Restrict the lock to these tables (`FOR UPDATE OF a, b`), on
    /// dialects that support it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub of_tables: Vec<String>,
}

/// LIMIT or OFFSET amount. `skip_binding` inlines the number as a literal
/// for positions where the dialect disallows a bound placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitClause {
    pub value: i64,
    pub skip_binding: bool,
}

/// Normalized multi-row insert payload. `rows` are aligned to `columns`;
/// `None` cells mark columns a row never mentioned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsertData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            primary_key: false,
            unique: false,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub if_not_exists: bool,
}

/// Statement timeout requested on the builder chain. Without `cancel` the
/// runner merely stops waiting; with it, the driver is asked to cancel the
/// in-flight statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTimeout {
    pub duration: Duration,
    pub cancel: bool,
}

/// The in-memory query AST.
///
/// Every slot is an ordered sequence: the compiler emits clauses in a fixed
/// canonical order, while within-clause ordering reflects builder call order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    pub kind: QueryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<FromTarget>,
    /// Default schema for unqualified references, set by `with_schema`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ctes: Vec<Cte>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<SelectItem>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub distinct: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distinct_on: Vec<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<Join>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wheres: Vec<WhereEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<GroupItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub havings: Vec<WhereEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub windows: Vec<WindowDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orders: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<LimitClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<LimitClause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_ops: Vec<SetOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<InsertData>,
    /// UPDATE assignments in call order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<(String, Value)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returning: Option<Vec<SelectItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_conflict: Option<OnConflict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockClause>,
    /// Body of a `QueryKind::Raw` query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_body: Option<Raw>,
    /// Definition of a `QueryKind::CreateTable` query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddl: Option<TableDef>,
    /// Set by `first()`: project a single row at terminal time.
    #[serde(default, skip_serializing_if = "is_false")]
    pub single_row: bool,
    /// Set by `pluck()`: unwrap the named column to a flat list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pluck: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<QueryTimeout>,
    /// Opaque caller context, passed through to post-processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}
