//! Predicate tree serialization.
//!
//! Minimal parentheses: an AND sequence at the outermost level is not
//! wrapped, nested groups always are, raw predicates are atomic.

use super::{raw, Compiler};
use crate::ast::{
    BoolOp, InList, OnCondition, OnEntry, Operand, Operator, Predicate, Value, WhereEntry,
};
use crate::error::QuarryResult;

/// Render a predicate slot; `None` when every entry rendered empty.
pub(crate) fn entries_sql(
    c: &mut Compiler,
    entries: &[WhereEntry],
) -> QuarryResult<Option<String>> {
    let mut sql = String::new();
    for entry in entries {
        let Some(fragment) = predicate_sql(c, entry)? else {
            continue;
        };
        if !sql.is_empty() {
            sql.push_str(connective(entry.bool_op));
        }
        sql.push_str(&fragment);
    }
    Ok(if sql.is_empty() { None } else { Some(sql) })
}

fn connective(op: BoolOp) -> &'static str {
    match op {
        BoolOp::And => " and ",
        BoolOp::Or => " or ",
    }
}

fn predicate_sql(c: &mut Compiler, entry: &WhereEntry) -> QuarryResult<Option<String>> {
    let not = entry.not;
    let sql = match &entry.predicate {
        Predicate::Binary { lhs, op, rhs } => {
            let column = c.ref_path(lhs);
            binary_sql(c, column, op, rhs, not)?
        }
        Predicate::In { column, list } => {
            let column = c.ref_path(column);
            match list {
                InList::Values(values) if values.is_empty() => {
                    // Vacuous IN: always false, NOT IN: always true.
                    if not { "1 = 1".to_string() } else { "1 = 0".to_string() }
                }
                InList::Values(values) => {
                    let placeholders: Vec<String> = values
                        .iter()
                        .map(|v| c.push_binding(v.clone()))
                        .collect();
                    format!(
                        "{} {} ({})",
                        column,
                        if not { "not in" } else { "in" },
                        placeholders.join(", ")
                    )
                }
                InList::Subquery(query) => {
                    let sub = c.statement(query)?;
                    format!("{} {} ({})", column, if not { "not in" } else { "in" }, sub)
                }
                InList::Raw(fragment) => {
                    let spliced = raw::splice(c, fragment);
                    format!(
                        "{} {} ({})",
                        column,
                        if not { "not in" } else { "in" },
                        spliced
                    )
                }
            }
        }
        Predicate::Between { column, low, high } => {
            let column = c.ref_path(column);
            let low = c.push_binding(low.clone());
            let high = c.push_binding(high.clone());
            format!(
                "{} {} {} and {}",
                column,
                if not { "not between" } else { "between" },
                low,
                high
            )
        }
        Predicate::Null { column } => {
            let column = c.ref_path(column);
            if not {
                format!("{} is not null", column)
            } else {
                format!("{} is null", column)
            }
        }
        Predicate::Exists { query } => {
            let sub = c.statement(query)?;
            if not {
                format!("not exists ({})", sub)
            } else {
                format!("exists ({})", sub)
            }
        }
        Predicate::Group(children) => match entries_sql(c, children)? {
            // An empty callback group contributes nothing.
            None => return Ok(None),
            Some(inner) => {
                if not {
                    format!("not ({})", inner)
                } else {
                    format!("({})", inner)
                }
            }
        },
        Predicate::Raw(fragment) => {
            let spliced = raw::splice(c, fragment);
            if not {
                format!("not ({})", spliced)
            } else {
                spliced
            }
        }
        Predicate::JsonPath {
            column,
            path,
            op,
            value,
        } => {
            if !c.dialect.supports_json_path() {
                return Err(c.unsupported("json path predicates"));
            }
            let extracted = c.dialect.json_path_extract(&c.ref_path(column), path);
            let rhs = Operand::Value(value.clone());
            binary_sql(c, extracted, op, &rhs, not)?
        }
        Predicate::JsonContains { column, value } => {
            json_containment(c, column, value, not, false)?
        }
        Predicate::JsonContainedIn { column, value } => {
            json_containment(c, column, value, not, true)?
        }
    };
    Ok(Some(sql))
}

fn json_containment(
    c: &mut Compiler,
    column: &crate::ast::Ref,
    value: &Value,
    not: bool,
    contained: bool,
) -> QuarryResult<String> {
    let path = c.ref_path(column);
    let placeholder = c.push_binding(value.clone());
    let expr = if contained {
        c.dialect.json_contained_expr(&path, &placeholder)
    } else {
        c.dialect.json_contains_expr(&path, &placeholder)
    };
    let expr = expr.ok_or_else(|| c.unsupported("json containment predicates"))?;
    Ok(if not { format!("not ({})", expr) } else { expr })
}

fn binary_sql(
    c: &mut Compiler,
    lhs: String,
    op: &Operator,
    rhs: &Operand,
    not: bool,
) -> QuarryResult<String> {
    // `= null` folds to a null test the way callers expect.
    if let Operand::Value(Value::Null) = rhs {
        if matches!(op, Operator::Eq | Operator::Is) {
            return Ok(format!(
                "{} {}",
                lhs,
                if not { "is not null" } else { "is null" }
            ));
        }
        if matches!(op, Operator::Ne | Operator::IsNot) {
            return Ok(format!(
                "{} {}",
                lhs,
                if not { "is null" } else { "is not null" }
            ));
        }
    }
    let op_sql = match op {
        Operator::ILike => c.dialect.ilike_operator(),
        other => other.as_sql(),
    };
    let rhs_sql = match rhs {
        Operand::Value(v) => c.push_binding(v.clone()),
        Operand::Column(r) => c.ref_path(r),
        Operand::Subquery(query) => format!("({})", c.statement(query)?),
        Operand::Raw(fragment) => raw::splice(c, fragment),
    };
    let sql = format!("{} {} {}", lhs, op_sql, rhs_sql);
    Ok(if not { format!("not {}", sql) } else { sql })
}

/// Render a join's ON entries.
pub(crate) fn on_entries_sql(c: &mut Compiler, entries: &[OnEntry]) -> QuarryResult<String> {
    let mut sql = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            sql.push_str(connective(entry.bool_op));
        }
        sql.push_str(&on_condition_sql(c, entry)?);
    }
    Ok(sql)
}

fn on_condition_sql(c: &mut Compiler, entry: &OnEntry) -> QuarryResult<String> {
    let not = entry.not;
    Ok(match &entry.condition {
        OnCondition::Columns { lhs, op, rhs } => {
            let sql = format!(
                "{} {} {}",
                c.ref_path(lhs),
                op.as_sql(),
                c.ref_path(rhs)
            );
            if not {
                format!("not {}", sql)
            } else {
                sql
            }
        }
        OnCondition::Value { lhs, op, value } => {
            let column = c.ref_path(lhs);
            binary_sql(c, column, op, &Operand::Value(value.clone()), not)?
        }
        OnCondition::In { column, values } => {
            let column = c.ref_path(column);
            let placeholders: Vec<String> =
                values.iter().map(|v| c.push_binding(v.clone())).collect();
            format!(
                "{} {} ({})",
                column,
                if not { "not in" } else { "in" },
                placeholders.join(", ")
            )
        }
        OnCondition::Between { column, low, high } => {
            let column = c.ref_path(column);
            let low = c.push_binding(low.clone());
            let high = c.push_binding(high.clone());
            format!(
                "{} {} {} and {}",
                column,
                if not { "not between" } else { "between" },
                low,
                high
            )
        }
        OnCondition::Exists { query } => {
            let sub = c.statement(query)?;
            if not {
                format!("not exists ({})", sub)
            } else {
                format!("exists ({})", sub)
            }
        }
        OnCondition::Null { column } => {
            let column = c.ref_path(column);
            if not {
                format!("{} is not null", column)
            } else {
                format!("{} is null", column)
            }
        }
        OnCondition::Raw(fragment) => raw::splice(c, fragment),
    })
}
