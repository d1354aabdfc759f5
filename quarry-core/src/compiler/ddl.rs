//! CREATE TABLE emission through the dialect type mapping.

use super::Compiler;
use crate::ast::{FromTarget, Query};
use crate::error::{QuarryError, QuarryResult};
use crate::types::ColumnType;

pub(crate) fn create_table_sql(c: &mut Compiler, q: &Query) -> QuarryResult<String> {
    let def = q
        .ddl
        .as_ref()
        .ok_or_else(|| QuarryError::config("create table without a definition"))?;
    if def.columns.is_empty() {
        return Err(QuarryError::config("create table requires at least one column"));
    }
    let target = match &q.from {
        Some(FromTarget::Table(t)) => c.table_ref(q, t),
        _ => return Err(QuarryError::config("create table requires a table name")),
    };

    let mut sql = String::from("create table ");
    if def.if_not_exists {
        sql.push_str("if not exists ");
    }
    sql.push_str(&target);
    sql.push_str(" (");

    let cols: Vec<String> = def
        .columns
        .iter()
        .map(|col| {
            let mut line = format!("{} {}", c.ident(&col.name), c.dialect.column_type(&col.column_type));
            // Increment types already carry their key and nullability.
            let auto = matches!(
                col.column_type,
                ColumnType::Increments | ColumnType::BigIncrements
            );
            if !auto {
                if !col.nullable {
                    line.push_str(" not null");
                }
                if col.primary_key {
                    line.push_str(" primary key");
                }
            }
            if col.unique {
                line.push_str(" unique");
            }
            if let Some(default) = &col.default {
                line.push_str(" default ");
                line.push_str(&c.dialect.escape_value(default));
            }
            line
        })
        .collect();
    sql.push_str(&cols.join(", "));
    sql.push(')');
    Ok(sql)
}
