//! The SQL compiler.
//!
//! Walks the query's clause slots in canonical order (WITH, SELECT/DML,
//! FROM, JOIN, WHERE, GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET, locking,
//! RETURNING) regardless of builder call order, formatting identifiers and
//! accumulating bindings through the active dialect.

mod ddl;
mod dml;
mod predicates;
mod raw;
mod select;

#[cfg(test)]
mod tests;

use crate::ast::{
    FromTarget, LimitClause, Query, QueryKind, Ref, TableRef, Value,
};
use crate::compiled::{CompiledQuery, Method};
use crate::dialect::Dialect;
use crate::error::{QuarryError, QuarryResult};
use std::sync::Arc;

/// User override of identifier quoting.
pub type IdentifierWrapper = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Compile-time options sourced from client configuration.
#[derive(Clone, Default)]
pub struct CompileOptions {
    /// Default schema for tables without an explicit one (`searchPath`).
    pub default_schema: Option<String>,
    /// Insert missing columns as NULL (SQLite-leaning dialects).
    pub use_null_as_default: bool,
    /// Full override of identifier quoting, applied per segment.
    pub wrap_identifier: Option<IdentifierWrapper>,
}

impl std::fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOptions")
            .field("default_schema", &self.default_schema)
            .field("use_null_as_default", &self.use_null_as_default)
            .field("wrap_identifier", &self.wrap_identifier.is_some())
            .finish()
    }
}

/// Compile a query against a dialect. Deterministic: the same AST and
/// dialect produce byte-equal SQL and an identical binding list.
pub fn compile(
    query: &Query,
    dialect: &dyn Dialect,
    options: &CompileOptions,
) -> QuarryResult<CompiledQuery> {
    let mut compiler = Compiler {
        dialect,
        options,
        bindings: Vec::new(),
    };
    let sql = compiler.statement(query)?;
    Ok(CompiledQuery {
        sql,
        bindings: compiler.bindings,
        method: infer_method(query),
        returning: returning_names(query),
        timeout: query.timeout,
        context: query.context.clone(),
    })
}

fn infer_method(query: &Query) -> Method {
    match query.kind {
        QueryKind::Select => {
            if let Some(col) = &query.pluck {
                Method::Pluck(col.clone())
            } else if query.single_row {
                Method::First
            } else {
                Method::Select
            }
        }
        QueryKind::Insert => Method::Insert,
        QueryKind::Update => Method::Update,
        QueryKind::Delete | QueryKind::Truncate => Method::Del,
        QueryKind::Raw => Method::Raw,
        QueryKind::CreateTable => Method::Ddl,
    }
}

fn returning_names(query: &Query) -> Option<Vec<String>> {
    query.returning.as_ref().map(|items| {
        items
            .iter()
            .map(|item| match item {
                crate::ast::SelectItem::Column(r) => r.column.clone(),
                crate::ast::SelectItem::Raw(raw) => raw.sql.clone(),
                crate::ast::SelectItem::Aggregate { alias, .. } => {
                    alias.clone().unwrap_or_default()
                }
                crate::ast::SelectItem::Window { alias, .. } => alias.clone(),
                crate::ast::SelectItem::Subquery { alias, .. } => alias.clone(),
            })
            .collect()
    })
}

pub(crate) struct Compiler<'a> {
    pub(crate) dialect: &'a dyn Dialect,
    pub(crate) options: &'a CompileOptions,
    pub(crate) bindings: Vec<Value>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn statement(&mut self, q: &Query) -> QuarryResult<String> {
        match q.kind {
            QueryKind::Select => select::select_sql(self, q),
            QueryKind::Insert => dml::insert_sql(self, q),
            QueryKind::Update => dml::update_sql(self, q),
            QueryKind::Delete => dml::delete_sql(self, q),
            QueryKind::Truncate => dml::truncate_sql(self, q),
            QueryKind::Raw => {
                let raw = q
                    .raw_body
                    .as_ref()
                    .ok_or_else(|| QuarryError::config("raw query without a body"))?;
                Ok(raw::splice(self, raw))
            }
            QueryKind::CreateTable => ddl::create_table_sql(self, q),
        }
    }

    /// Record a binding and return its placeholder. Embedded raw fragments
    /// expand in place instead of binding.
    pub(crate) fn push_binding(&mut self, value: Value) -> String {
        match value {
            Value::Raw(raw) => raw::splice(self, &raw),
            v => {
                self.bindings.push(v);
                self.dialect.placeholder(self.bindings.len())
            }
        }
    }

    /// Quote one identifier segment; `*` stays bare.
    pub(crate) fn ident(&self, segment: &str) -> String {
        if segment == "*" {
            return "*".to_string();
        }
        match &self.options.wrap_identifier {
            Some(wrap) => wrap(segment),
            None => self.dialect.quote_identifier(segment),
        }
    }

    /// Dotted path of a column reference, each segment quoted independently.
    pub(crate) fn ref_path(&self, r: &Ref) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(schema) = &r.schema {
            parts.push(self.ident(schema));
        }
        if let Some(table) = &r.table {
            parts.push(self.ident(table));
        }
        parts.push(self.ident(&r.column));
        parts.join(".")
    }

    /// Column reference in a projection position (alias honored).
    pub(crate) fn select_ref(&self, r: &Ref) -> String {
        let path = self.ref_path(r);
        match &r.alias {
            Some(alias) => format!("{} as {}", path, self.ident(alias)),
            None => path,
        }
    }

    /// Table reference with the schema default applied and alias honored.
    pub(crate) fn table_ref(&self, q: &Query, t: &TableRef) -> String {
        let schema = t
            .schema
            .as_deref()
            .or(q.default_schema.as_deref())
            .or(self.options.default_schema.as_deref());
        let mut sql = match schema {
            Some(s) => format!("{}.{}", self.ident(s), self.ident(&t.name)),
            None => self.ident(&t.name),
        };
        if let Some(alias) = &t.alias {
            sql.push_str(" as ");
            sql.push_str(&self.ident(alias));
        }
        sql
    }

    /// The FROM target of a query, required for DML statements.
    pub(crate) fn from_target(&mut self, q: &Query) -> QuarryResult<String> {
        match &q.from {
            Some(FromTarget::Table(t)) => Ok(self.table_ref(q, t)),
            Some(FromTarget::Subquery { query, alias }) => {
                let sub = self.statement(query)?;
                Ok(format!("({}) as {}", sub, self.ident(alias)))
            }
            Some(FromTarget::Raw(raw)) => Ok(raw::splice(self, raw)),
            None => Err(QuarryError::config("query has no table")),
        }
    }

    /// Render a LIMIT/OFFSET amount as a placeholder or inline literal.
    pub(crate) fn paging_piece(
        &mut self,
        clause: Option<&LimitClause>,
        name: &str,
    ) -> QuarryResult<Option<String>> {
        match clause {
            None => Ok(None),
            Some(lc) => {
                if lc.value < 0 {
                    return Err(QuarryError::config(format!(
                        "{} must be non-negative, got {}",
                        name, lc.value
                    )));
                }
                Ok(Some(if lc.skip_binding {
                    lc.value.to_string()
                } else {
                    self.push_binding(Value::Int(lc.value))
                }))
            }
        }
    }

    pub(crate) fn unsupported(&self, feature: impl Into<String>) -> QuarryError {
        QuarryError::unsupported(self.dialect.name(), feature)
    }
}
