//! Column and table references, projection items.

use crate::ast::query::Query;
use crate::ast::raw::Raw;
use serde::{Deserialize, Serialize};

/// A column reference with optional schema, table and alias.
///
/// The compiler quotes each segment independently, so `a.b.c` becomes three
/// quoted segments. A `column` of `*` renders unquoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ref {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Ref {
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: None,
            column: name.into(),
            alias: None,
        }
    }

    /// Parse a dotted reference, optionally with an ` as ` alias:
    /// `users.id`, `public.users.id`, `id as user_id`.
    pub fn parse(input: &str) -> Self {
        let (path, alias) = split_alias(input);
        let parts: Vec<&str> = path.split('.').map(str::trim).collect();
        let mut r = match parts.as_slice() {
            [column] => Ref::column(*column),
            [table, column] => Ref {
                schema: None,
                table: Some((*table).to_string()),
                column: (*column).to_string(),
                alias: None,
            },
            [schema, table, column] => Ref {
                schema: Some((*schema).to_string()),
                table: Some((*table).to_string()),
                column: (*column).to_string(),
                alias: None,
            },
            _ => Ref::column(path.trim()),
        };
        r.alias = alias;
        r
    }

    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.column == "*"
    }
}

/// A table reference for FROM / INTO / JOIN targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    /// Parse `schema.table`, optionally with an ` as ` alias.
    pub fn parse(input: &str) -> Self {
        let (path, alias) = split_alias(input);
        let mut t = match path.split_once('.') {
            Some((schema, name)) => TableRef {
                schema: Some(schema.trim().to_string()),
                name: name.trim().to_string(),
                alias: None,
            },
            None => TableRef::new(path.trim()),
        };
        t.alias = alias;
        t
    }
}

fn split_alias(input: &str) -> (&str, Option<String>) {
    let lower = input.to_ascii_lowercase();
    match lower.find(" as ") {
        Some(pos) => (
            input[..pos].trim(),
            Some(input[pos + 4..].trim().to_string()),
        ),
        None => (input.trim(), None),
    }
}

/// Aggregate function tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunc {
    Count,
    Min,
    Max,
    Sum,
    Avg,
}

impl AggregateFunc {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
        }
    }
}

/// One entry of the projection list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    Column(Ref),
    Aggregate {
        func: AggregateFunc,
        distinct: bool,
        args: Vec<Ref>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    /// Window-function call over a named window from the WINDOW clause.
    Window {
        func: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Ref>,
        over: String,
        alias: String,
    },
    Subquery {
        query: Box<Query>,
        alias: String,
    },
    Raw(Raw),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_column() {
        let r = Ref::parse("name");
        assert_eq!(r.column, "name");
        assert_eq!(r.table, None);
        assert_eq!(r.alias, None);
    }

    #[test]
    fn test_parse_qualified_with_alias() {
        let r = Ref::parse("public.users.id as uid");
        assert_eq!(r.schema.as_deref(), Some("public"));
        assert_eq!(r.table.as_deref(), Some("users"));
        assert_eq!(r.column, "id");
        assert_eq!(r.alias.as_deref(), Some("uid"));
    }

    #[test]
    fn test_parse_table_ref() {
        let t = TableRef::parse("crm.accounts as a");
        assert_eq!(t.schema.as_deref(), Some("crm"));
        assert_eq!(t.name, "accounts");
        assert_eq!(t.alias.as_deref(), Some("a"));
    }
}
