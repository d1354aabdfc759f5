//! Fluent builder methods on [`Query`].
//!
//! Every method consumes and returns the builder. Builders are cheap to
//! clone and clones share no mutable state; a clone taken before a call is
//! unaffected by it. Compilation is recompile-on-demand: `to_sql` never
//! freezes the builder.

mod aggregates;
mod cte;
mod dml;
mod filters;
mod joins;
mod locks;
mod ordering;
mod setops;
mod windows;

pub use dml::OnConflictBuilder;
pub use joins::OnBuilder;

use crate::ast::{
    FromTarget, Query, QueryKind, QueryTimeout, Raw, Ref, SelectItem, TableRef, Value,
};
use crate::compiled::CompiledQuery;
use crate::compiler::{self, CompileOptions};
use crate::dialect::Dialect;
use crate::error::QuarryResult;
use std::time::Duration;

/// Named clause slots for [`Query::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseSlot {
    Select,
    Where,
    Group,
    Order,
    Having,
    Limit,
    Offset,
    Join,
    With,
    Window,
    Returning,
    Lock,
}

impl Query {
    /// Start a SELECT from the given table (`"schema.table as alias"` forms
    /// are parsed).
    pub fn from_table(table: impl AsRef<str>) -> Self {
        Query {
            kind: QueryKind::Select,
            from: Some(FromTarget::Table(TableRef::parse(table.as_ref()))),
            ..Default::default()
        }
    }

    /// A raw query: the fragment is the whole statement.
    pub fn raw(raw: impl Into<Raw>) -> Self {
        Query {
            kind: QueryKind::Raw,
            raw_body: Some(raw.into()),
            ..Default::default()
        }
    }

    pub fn create_table(table: impl AsRef<str>) -> Self {
        Query {
            kind: QueryKind::CreateTable,
            from: Some(FromTarget::Table(TableRef::parse(table.as_ref()))),
            ddl: Some(Default::default()),
            ..Default::default()
        }
    }

    /// Append a column definition to a `create_table` builder.
    pub fn add_column(mut self, column: crate::ast::ColumnDef) -> Self {
        self.ddl.get_or_insert_with(Default::default).columns.push(column);
        self
    }

    /// CREATE TABLE IF NOT EXISTS.
    pub fn if_not_exists(mut self) -> Self {
        self.ddl.get_or_insert_with(Default::default).if_not_exists = true;
        self
    }

    pub fn truncate(table: impl AsRef<str>) -> Self {
        Query {
            kind: QueryKind::Truncate,
            from: Some(FromTarget::Table(TableRef::parse(table.as_ref()))),
            ..Default::default()
        }
    }

    /// Set (or replace) the principal table.
    pub fn from(mut self, table: impl AsRef<str>) -> Self {
        self.from = Some(FromTarget::Table(TableRef::parse(table.as_ref())));
        self
    }

    /// Select from a sub-query.
    pub fn from_subquery(mut self, query: Query, alias: impl Into<String>) -> Self {
        self.from = Some(FromTarget::Subquery {
            query: Box::new(query),
            alias: alias.into(),
        });
        self
    }

    pub fn from_raw(mut self, raw: impl Into<Raw>) -> Self {
        self.from = Some(FromTarget::Raw(raw.into()));
        self
    }

    /// Target table for DML; same slot as `from`.
    pub fn into_table(self, table: impl AsRef<str>) -> Self {
        self.from(table)
    }

    /// Default schema for unqualified references within this query only.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Alias the principal table.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        match &mut self.from {
            Some(FromTarget::Table(t)) => t.alias = Some(alias.into()),
            Some(FromTarget::Subquery { alias: a, .. }) => *a = alias.into(),
            _ => {}
        }
        self
    }

    // Projection -----------------------------------------------------------

    /// Add columns to the projection. `*` yields a wildcard node.
    pub fn select<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns.extend(
            cols.into_iter()
                .map(|c| SelectItem::Column(Ref::parse(c.as_ref()))),
        );
        self
    }

    pub fn column(mut self, col: impl AsRef<str>) -> Self {
        self.columns
            .push(SelectItem::Column(Ref::parse(col.as_ref())));
        self
    }

    /// Aliased column (the `{alias: source}` object form).
    pub fn select_as(mut self, col: impl AsRef<str>, alias: impl Into<String>) -> Self {
        self.columns
            .push(SelectItem::Column(Ref::parse(col.as_ref()).aliased(alias)));
        self
    }

    pub fn select_raw(mut self, raw: impl Into<Raw>) -> Self {
        self.columns.push(SelectItem::Raw(raw.into()));
        self
    }

    /// Project a sub-query as a column.
    pub fn select_subquery(mut self, query: Query, alias: impl Into<String>) -> Self {
        self.columns.push(SelectItem::Subquery {
            query: Box::new(query),
            alias: alias.into(),
        });
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn distinct_on<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.distinct_on
            .extend(cols.into_iter().map(|c| Ref::parse(c.as_ref())));
        self
    }

    // Terminal shaping ------------------------------------------------------

    /// Sugar for `limit(1)` plus project-single at terminal time.
    pub fn first(mut self) -> Self {
        self.single_row = true;
        self.limit = Some(crate::ast::LimitClause {
            value: 1,
            skip_binding: false,
        });
        self
    }

    /// Project the named column and unwrap to a flat list.
    pub fn pluck(mut self, col: impl AsRef<str>) -> Self {
        self.columns = vec![SelectItem::Column(Ref::parse(col.as_ref()))];
        self.pluck = Some(col.as_ref().to_string());
        self
    }

    /// Statement timeout; the query keeps running server-side when it fires.
    pub fn timeout(mut self, ms: u64) -> Self {
        self.timeout = Some(QueryTimeout {
            duration: Duration::from_millis(ms),
            cancel: false,
        });
        self
    }

    /// Statement timeout that also asks the driver to cancel the in-flight
    /// statement. Rejected at dispatch when the adapter cannot cancel.
    pub fn timeout_with_cancel(mut self, ms: u64) -> Self {
        self.timeout = Some(QueryTimeout {
            duration: Duration::from_millis(ms),
            cancel: true,
        });
        self
    }

    /// Opaque context passed through to events and post-processing.
    pub fn query_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    // Clearing --------------------------------------------------------------

    pub fn clear(mut self, slot: ClauseSlot) -> Self {
        match slot {
            ClauseSlot::Select => {
                self.columns.clear();
                self.distinct = false;
                self.distinct_on.clear();
            }
            ClauseSlot::Where => self.wheres.clear(),
            ClauseSlot::Group => self.group_by.clear(),
            ClauseSlot::Order => self.orders.clear(),
            ClauseSlot::Having => self.havings.clear(),
            ClauseSlot::Limit => self.limit = None,
            ClauseSlot::Offset => self.offset = None,
            ClauseSlot::Join => self.joins.clear(),
            ClauseSlot::With => self.ctes.clear(),
            ClauseSlot::Window => self.windows.clear(),
            ClauseSlot::Returning => self.returning = None,
            ClauseSlot::Lock => self.lock = None,
        }
        self
    }

    pub fn clear_select(self) -> Self {
        self.clear(ClauseSlot::Select)
    }

    pub fn clear_where(self) -> Self {
        self.clear(ClauseSlot::Where)
    }

    pub fn clear_group(self) -> Self {
        self.clear(ClauseSlot::Group)
    }

    pub fn clear_order(self) -> Self {
        self.clear(ClauseSlot::Order)
    }

    pub fn clear_having(self) -> Self {
        self.clear(ClauseSlot::Having)
    }

    /// Drop aggregate projections, keeping plain columns.
    pub fn clear_counters(mut self) -> Self {
        self.columns
            .retain(|c| !matches!(c, SelectItem::Aggregate { .. }));
        self
    }

    // Compilation -----------------------------------------------------------

    /// Compile against a dialect with default options, without executing.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> QuarryResult<CompiledQuery> {
        compiler::compile(self, dialect, &CompileOptions::default())
    }

    /// Compile with explicit options (default schema, NULL-fill policy,
    /// identifier-wrapping override).
    pub fn to_sql_with(
        &self,
        dialect: &dyn Dialect,
        options: &CompileOptions,
    ) -> QuarryResult<CompiledQuery> {
        compiler::compile(self, dialect, options)
    }

    pub(crate) fn push_assignment(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.assignments.push((column.into(), value.into()));
    }
}
