//! The immutable compiled-query artifact.

use crate::ast::{QueryTimeout, Value};
use crate::dialect::Dialect;
use serde::{Deserialize, Serialize};

/// What the runner should do with the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Select,
    /// Single-row projection.
    First,
    /// Flat projection of one column.
    Pluck(String),
    Insert,
    Update,
    Del,
    Raw,
    Ddl,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Select => write!(f, "select"),
            Method::First => write!(f, "first"),
            Method::Pluck(_) => write!(f, "pluck"),
            Method::Insert => write!(f, "insert"),
            Method::Update => write!(f, "update"),
            Method::Del => write!(f, "del"),
            Method::Raw => write!(f, "raw"),
            Method::Ddl => write!(f, "ddl"),
        }
    }
}

/// SQL text plus ordered bindings.
///
/// Invariant: the number of placeholders in `sql` equals `bindings.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
    pub method: Method,
    /// RETURNING columns the caller asked for, whether or not the dialect
    /// could emit them; the runner fabricates a response when it could not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returning: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<QueryTimeout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl CompiledQuery {
    /// Render with bindings inlined as literals. Debug and logging only;
    /// never execute the result.
    pub fn to_debug_string(&self, dialect: &dyn Dialect) -> String {
        if self.bindings.is_empty() {
            return self.sql.clone();
        }
        if dialect.placeholder(1) == "?" {
            let parts: Vec<&str> = self.sql.split('?').collect();
            let mut out = String::with_capacity(self.sql.len());
            for (i, part) in parts.iter().enumerate() {
                out.push_str(part);
                if i + 1 < parts.len() {
                    match self.bindings.get(i) {
                        Some(v) => out.push_str(&dialect.escape_value(v)),
                        None => out.push('?'),
                    }
                }
            }
            out
        } else {
            // Indexed placeholders; replace from the highest index down so
            // `$1` never clobbers the prefix of `$10`.
            let mut out = self.sql.clone();
            for (i, v) in self.bindings.iter().enumerate().rev() {
                out = out.replace(&dialect.placeholder(i + 1), &dialect.escape_value(v));
            }
            out
        }
    }
}
