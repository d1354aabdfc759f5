//! INSERT / UPDATE / DELETE / TRUNCATE emission.

use super::select::{select_item_sql, with_clause};
use super::{predicates, raw, Compiler};
use crate::ast::{
    ConflictAction, FromTarget, JoinTarget, Query, Value,
};
use crate::dialect::ConflictSyntax;
use crate::error::{QuarryError, QuarryResult};

/// DML target: the plain table, no alias.
fn dml_target(c: &mut Compiler, q: &Query) -> QuarryResult<String> {
    match &q.from {
        Some(FromTarget::Table(t)) => {
            let bare = crate::ast::TableRef {
                schema: t.schema.clone(),
                name: t.name.clone(),
                alias: None,
            };
            Ok(c.table_ref(q, &bare))
        }
        Some(FromTarget::Raw(fragment)) => Ok(raw::splice(c, fragment)),
        Some(FromTarget::Subquery { .. }) => {
            Err(QuarryError::config("DML requires a table, not a sub-query"))
        }
        None => Err(QuarryError::config("query has no table")),
    }
}

pub(crate) fn insert_sql(c: &mut Compiler, q: &Query) -> QuarryResult<String> {
    let mut sql = with_clause(c, q)?;
    let data = q
        .insert
        .as_ref()
        .ok_or_else(|| QuarryError::config("insert without rows"))?;

    let conflict = q.on_conflict.as_ref();
    let ignore_via_verb = matches!(
        (conflict.map(|oc| &oc.action), c.dialect.conflict_syntax()),
        (Some(ConflictAction::Ignore), ConflictSyntax::OnDuplicateKey)
    );
    if conflict.is_some() && !c.dialect.supports_on_conflict() {
        return Err(c.unsupported("on conflict"));
    }

    sql.push_str(if ignore_via_verb {
        "insert ignore into "
    } else {
        "insert into "
    });
    sql.push_str(&dml_target(c, q)?);

    if data.columns.is_empty() || data.rows.is_empty() {
        sql.push_str(" default values");
    } else {
        let cols: Vec<String> = data.columns.iter().map(|col| c.ident(col)).collect();
        sql.push_str(&format!(" ({}) values ", cols.join(", ")));
        let mut row_parts = Vec::with_capacity(data.rows.len());
        for row in &data.rows {
            let mut cells = Vec::with_capacity(row.len());
            for (cell, col) in row.iter().zip(&data.columns) {
                match cell {
                    Some(value) => cells.push(c.push_binding(value.clone())),
                    None => {
                        if c.options.use_null_as_default
                            || c.dialect.inserts_undefined_as_null()
                        {
                            cells.push(c.push_binding(Value::Null));
                        } else {
                            return Err(QuarryError::config(format!(
                                "undefined value for column '{}'; enable use_null_as_default to insert NULL",
                                col
                            )));
                        }
                    }
                }
            }
            row_parts.push(format!("({})", cells.join(", ")));
        }
        sql.push_str(&row_parts.join(", "));
    }

    if let Some(oc) = conflict {
        match (&oc.action, c.dialect.conflict_syntax()) {
            (ConflictAction::Ignore, ConflictSyntax::OnConflict) => {
                if oc.columns.is_empty() {
                    sql.push_str(" on conflict do nothing");
                } else {
                    let cols: Vec<String> = oc.columns.iter().map(|col| c.ident(col)).collect();
                    sql.push_str(&format!(" on conflict ({}) do nothing", cols.join(", ")));
                }
            }
            (ConflictAction::Ignore, ConflictSyntax::OnDuplicateKey) => {
                // Folded into the insert verb.
            }
            (ConflictAction::Merge(merge_cols), syntax) => {
                let merge: Vec<String> = match merge_cols {
                    Some(cols) => cols.clone(),
                    // Every inserted column outside the conflict target.
                    None => data
                        .columns
                        .iter()
                        .filter(|col| !oc.columns.contains(col))
                        .cloned()
                        .collect(),
                };
                match syntax {
                    ConflictSyntax::OnConflict => {
                        let target: Vec<String> =
                            oc.columns.iter().map(|col| c.ident(col)).collect();
                        if merge.is_empty() {
                            sql.push_str(&format!(
                                " on conflict ({}) do nothing",
                                target.join(", ")
                            ));
                        } else {
                            let sets: Vec<String> = merge
                                .iter()
                                .map(|col| {
                                    let quoted = c.ident(col);
                                    format!("{} = {}", quoted, c.dialect.excluded_column(&quoted))
                                })
                                .collect();
                            sql.push_str(&format!(
                                " on conflict ({}) do update set {}",
                                target.join(", "),
                                sets.join(", ")
                            ));
                        }
                    }
                    ConflictSyntax::OnDuplicateKey => {
                        let sets: Vec<String> = merge
                            .iter()
                            .map(|col| {
                                let quoted = c.ident(col);
                                format!("{} = {}", quoted, c.dialect.excluded_column(&quoted))
                            })
                            .collect();
                        if !sets.is_empty() {
                            sql.push_str(&format!(
                                " on duplicate key update {}",
                                sets.join(", ")
                            ));
                        }
                    }
                }
            }
        }
    }

    append_returning(c, q, &mut sql)?;
    Ok(sql)
}

pub(crate) fn update_sql(c: &mut Compiler, q: &Query) -> QuarryResult<String> {
    if q.assignments.is_empty() {
        return Err(QuarryError::config("update without assignments"));
    }
    let mut sql = with_clause(c, q)?;
    sql.push_str("update ");
    sql.push_str(&dml_target(c, q)?);
    let sets: Vec<String> = q
        .assignments
        .iter()
        .map(|(col, value)| {
            let quoted = c.ident(col);
            format!("{} = {}", quoted, c.push_binding(value.clone()))
        })
        .collect();
    sql.push_str(" set ");
    sql.push_str(&sets.join(", "));

    // Joins become an UPDATE ... FROM with the ON conditions folded into
    // WHERE, on the dialects that have the form.
    let join_where = join_tables_clause(c, q, " from ", &mut sql)?;

    let wheres = predicates::entries_sql(c, &q.wheres)?;
    push_where(&mut sql, join_where, wheres);

    append_returning(c, q, &mut sql)?;
    Ok(sql)
}

pub(crate) fn delete_sql(c: &mut Compiler, q: &Query) -> QuarryResult<String> {
    let mut sql = with_clause(c, q)?;
    sql.push_str("delete from ");
    sql.push_str(&dml_target(c, q)?);

    let join_where = join_tables_clause(c, q, " using ", &mut sql)?;

    let wheres = predicates::entries_sql(c, &q.wheres)?;
    push_where(&mut sql, join_where, wheres);

    append_returning(c, q, &mut sql)?;
    Ok(sql)
}

pub(crate) fn truncate_sql(c: &mut Compiler, q: &Query) -> QuarryResult<String> {
    let target = dml_target(c, q)?;
    Ok(c.dialect.truncate_statement(&target))
}

/// Render joined tables as a FROM/USING list and return their ON
/// predicates, to be ANDed into WHERE.
fn join_tables_clause(
    c: &mut Compiler,
    q: &Query,
    keyword: &str,
    sql: &mut String,
) -> QuarryResult<Option<String>> {
    if q.joins.is_empty() {
        return Ok(None);
    }
    if !c.dialect.supports_update_from() {
        return Err(c.unsupported("DML with joined tables"));
    }
    let mut targets = Vec::with_capacity(q.joins.len());
    let mut on_parts = Vec::new();
    for join in &q.joins {
        let target = match &join.target {
            JoinTarget::Table(t) => c.table_ref(q, t),
            JoinTarget::Subquery { query, alias } => {
                format!("({}) as {}", c.statement(query)?, c.ident(alias))
            }
            JoinTarget::Raw(fragment) => raw::splice(c, fragment),
        };
        targets.push(target);
        if !join.on.is_empty() {
            on_parts.push(predicates::on_entries_sql(c, &join.on)?);
        }
    }
    sql.push_str(keyword);
    sql.push_str(&targets.join(", "));
    Ok(if on_parts.is_empty() {
        None
    } else {
        Some(on_parts.join(" and "))
    })
}

fn push_where(sql: &mut String, join_where: Option<String>, wheres: Option<String>) {
    let combined = match (join_where, wheres) {
        (Some(j), Some(w)) => Some(format!("{} and {}", j, w)),
        (Some(j), None) => Some(j),
        (None, Some(w)) => Some(w),
        (None, None) => None,
    };
    if let Some(clause) = combined {
        sql.push_str(" where ");
        sql.push_str(&clause);
    }
}

fn append_returning(c: &mut Compiler, q: &Query, sql: &mut String) -> QuarryResult<()> {
    let Some(items) = &q.returning else {
        return Ok(());
    };
    // Unsupported dialects omit the clause; the runner fabricates the
    // response from last-insert-id / affected rows instead.
    if !c.dialect.supports_returning() {
        return Ok(());
    }
    let rendered: Vec<String> = items
        .iter()
        .map(|item| select_item_sql(c, item))
        .collect::<QuarryResult<_>>()?;
    sql.push_str(" returning ");
    sql.push_str(&rendered.join(", "));
    Ok(())
}
