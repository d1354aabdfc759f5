//! Raw SQL fragments.
//!
//! A raw fragment is spliced verbatim wherever a column, table or predicate
//! may appear. `?` marks a positional binding (`\?` escapes a literal
//! question mark) and `:name` marks a named binding; the compiler repositions
//! both into the active dialect's placeholder style.

use crate::ast::values::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum RawBindings {
    #[default]
    None,
    /// Consumed left to right, one per unescaped `?`.
    Positional(Vec<Value>),
    /// Looked up by `:name` occurrence.
    Named(Vec<(String, Value)>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raw {
    pub sql: String,
    #[serde(default, skip_serializing_if = "raw_bindings_is_none")]
    pub bindings: RawBindings,
}

fn raw_bindings_is_none(b: &RawBindings) -> bool {
    matches!(b, RawBindings::None)
}

impl Raw {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: RawBindings::None,
        }
    }

    /// Raw SQL with positional `?` bindings.
    pub fn bind<I, V>(sql: impl Into<String>, bindings: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            sql: sql.into(),
            bindings: RawBindings::Positional(bindings.into_iter().map(Into::into).collect()),
        }
    }

    /// Raw SQL with named `:name` bindings.
    pub fn named<I, S, V>(sql: impl Into<String>, bindings: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        Self {
            sql: sql.into(),
            bindings: RawBindings::Named(
                bindings
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Raw {
    fn from(sql: &str) -> Self {
        Raw::new(sql)
    }
}

impl From<String> for Raw {
    fn from(sql: String) -> Self {
        Raw::new(sql)
    }
}
