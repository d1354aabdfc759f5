//! SELECT emission, plus the WITH/JOIN pieces shared with DML.

use super::{predicates, raw, Compiler};
use crate::ast::{
    AggregateFunc, Cte, CteBody, GroupItem, Join, JoinKind, JoinTarget, Materialization,
    NullsOrder, OrderItem, OrderTarget, Query, SelectItem, SetOperand, WindowDef,
};
use crate::error::QuarryResult;

pub(crate) fn select_sql(c: &mut Compiler, q: &Query) -> QuarryResult<String> {
    let mut sql = with_clause(c, q)?;
    sql.push_str("select ");

    if q.distinct {
        sql.push_str("distinct ");
    } else if !q.distinct_on.is_empty() {
        if !c.dialect.supports_distinct_on() {
            return Err(c.unsupported("distinct on"));
        }
        let exprs: Vec<String> = q.distinct_on.iter().map(|r| c.ref_path(r)).collect();
        sql.push_str(&format!("distinct on ({}) ", exprs.join(", ")));
    }

    // TOP-style paging binds before the projection, so emit it here.
    let mut top_used = false;
    if c.dialect.uses_top() && q.offset.is_none() && q.limit.is_some() {
        if let Some(piece) = c.paging_piece(q.limit.as_ref(), "limit")? {
            sql.push_str(&format!("top ({}) ", piece));
            top_used = true;
        }
    }

    if q.columns.is_empty() {
        sql.push('*');
    } else {
        let items: Vec<String> = q
            .columns
            .iter()
            .map(|item| select_item_sql(c, item))
            .collect::<QuarryResult<_>>()?;
        sql.push_str(&items.join(", "));
    }

    if q.from.is_some() {
        sql.push_str(" from ");
        sql.push_str(&c.from_target(q)?);
    }

    for join in &q.joins {
        sql.push(' ');
        sql.push_str(&join_sql(c, q, join)?);
    }

    if let Some(wheres) = predicates::entries_sql(c, &q.wheres)? {
        sql.push_str(" where ");
        sql.push_str(&wheres);
    }

    if !q.group_by.is_empty() {
        let items: Vec<String> = q
            .group_by
            .iter()
            .map(|item| match item {
                GroupItem::Column(r) => c.ref_path(r),
                GroupItem::Raw(fragment) => raw::splice(c, fragment),
            })
            .collect();
        sql.push_str(" group by ");
        sql.push_str(&items.join(", "));
    }

    if let Some(havings) = predicates::entries_sql(c, &q.havings)? {
        sql.push_str(" having ");
        sql.push_str(&havings);
    }

    if !q.windows.is_empty() {
        if !c.dialect.supports_window() {
            return Err(c.unsupported("window clauses"));
        }
        let defs: Vec<String> = q.windows.iter().map(|def| window_def_sql(c, def)).collect();
        sql.push_str(" window ");
        sql.push_str(&defs.join(", "));
    }

    for set_op in &q.set_ops {
        let operand = match &set_op.operand {
            SetOperand::Query(query) => c.statement(query)?,
            SetOperand::Raw(fragment) => raw::splice(c, fragment),
        };
        sql.push(' ');
        sql.push_str(set_op.kind.as_sql());
        sql.push(' ');
        if set_op.wrap {
            sql.push('(');
            sql.push_str(&operand);
            sql.push(')');
        } else {
            sql.push_str(&operand);
        }
    }

    if !q.orders.is_empty() {
        let items: Vec<String> = q.orders.iter().map(|order| order_item_sql(c, order)).collect();
        sql.push_str(" order by ");
        sql.push_str(&items.join(", "));
    }

    // Bindings must accumulate in the order they appear in the text, and
    // OFFSET/FETCH dialects render the offset first.
    let (limit, offset) = if c.dialect.offset_binds_first() {
        let offset = c.paging_piece(q.offset.as_ref(), "offset")?;
        let limit = if top_used {
            None
        } else {
            c.paging_piece(q.limit.as_ref(), "limit")?
        };
        (limit, offset)
    } else {
        let limit = if top_used {
            None
        } else {
            c.paging_piece(q.limit.as_ref(), "limit")?
        };
        let offset = c.paging_piece(q.offset.as_ref(), "offset")?;
        (limit, offset)
    };
    sql.push_str(&c.dialect.limit_offset(limit, offset));

    if let Some(lock) = &q.lock {
        let of_tables: Vec<String> = if c.dialect.supports_for_update_of_tables() {
            lock.of_tables.iter().map(|t| c.ident(t)).collect()
        } else {
            vec![]
        };
        if let Some(clause) = c.dialect.lock_clause(lock, &of_tables) {
            sql.push_str(&clause);
        }
    }

    Ok(sql)
}

fn order_item_sql(c: &mut Compiler, order: &OrderItem) -> String {
    let mut part = match &order.target {
        OrderTarget::Column(r) => c.ref_path(r),
        OrderTarget::Raw(fragment) => return raw::splice(c, fragment),
    };
    part.push(' ');
    part.push_str(order.direction.as_sql());
    if c.dialect.supports_order_nulls() {
        match order.nulls {
            NullsOrder::First => part.push_str(" nulls first"),
            NullsOrder::Last => part.push_str(" nulls last"),
            NullsOrder::Default => {}
        }
    }
    part
}

/// `"w" as (partition by ... order by ...)`.
fn window_def_sql(c: &mut Compiler, def: &WindowDef) -> String {
    let mut body = String::new();
    if !def.partition_by.is_empty() {
        let cols: Vec<String> = def.partition_by.iter().map(|r| c.ref_path(r)).collect();
        body.push_str("partition by ");
        body.push_str(&cols.join(", "));
    }
    if !def.order_by.is_empty() {
        if !body.is_empty() {
            body.push(' ');
        }
        let items: Vec<String> = def.order_by.iter().map(|o| order_item_sql(c, o)).collect();
        body.push_str("order by ");
        body.push_str(&items.join(", "));
    }
    format!("{} as ({})", c.ident(&def.name), body)
}

pub(crate) fn select_item_sql(c: &mut Compiler, item: &SelectItem) -> QuarryResult<String> {
    Ok(match item {
        SelectItem::Column(r) => c.select_ref(r),
        SelectItem::Aggregate {
            func,
            distinct,
            args,
            alias,
        } => {
            let rendered: Vec<String> = args.iter().map(|r| c.ref_path(r)).collect();
            let call = if *distinct {
                if *func == AggregateFunc::Count && rendered.len() > 1 {
                    c.dialect.count_distinct(&rendered)
                } else {
                    format!("{}(distinct {})", func.as_sql(), rendered.join(", "))
                }
            } else {
                format!("{}({})", func.as_sql(), rendered.join(", "))
            };
            match alias {
                Some(a) => format!("{} as {}", call, c.ident(a)),
                None => call,
            }
        }
        SelectItem::Window {
            func,
            args,
            over,
            alias,
        } => {
            if !c.dialect.supports_window() {
                return Err(c.unsupported("window functions"));
            }
            let rendered: Vec<String> = args.iter().map(|r| c.ref_path(r)).collect();
            format!(
                "{}({}) over {} as {}",
                func,
                rendered.join(", "),
                c.ident(over),
                c.ident(alias)
            )
        }
        SelectItem::Subquery { query, alias } => {
            format!("({}) as {}", c.statement(query)?, c.ident(alias))
        }
        SelectItem::Raw(fragment) => raw::splice(c, fragment),
    })
}

/// `WITH [RECURSIVE] name [(cols)] AS [MATERIALIZED] (body), ... ` or empty.
pub(crate) fn with_clause(c: &mut Compiler, q: &Query) -> QuarryResult<String> {
    if q.ctes.is_empty() {
        return Ok(String::new());
    }
    if !c.dialect.supports_cte() {
        return Err(c.unsupported("common table expressions"));
    }
    let recursive = q.ctes.iter().any(|cte| cte.recursive);
    if recursive && !c.dialect.supports_recursive_cte() {
        return Err(c.unsupported("recursive common table expressions"));
    }
    let parts: Vec<String> = q
        .ctes
        .iter()
        .map(|cte| cte_sql(c, cte))
        .collect::<QuarryResult<_>>()?;
    Ok(format!(
        "with {}{} ",
        if recursive { "recursive " } else { "" },
        parts.join(", ")
    ))
}

fn cte_sql(c: &mut Compiler, cte: &Cte) -> QuarryResult<String> {
    let mut sql = c.ident(&cte.name);
    if !cte.columns.is_empty() {
        let cols: Vec<String> = cte.columns.iter().map(|col| c.ident(col)).collect();
        sql.push_str(&format!(" ({})", cols.join(", ")));
    }
    sql.push_str(" as ");
    match cte.materialization {
        Materialization::Default => {}
        Materialization::Materialized => {
            if !c.dialect.supports_materialized_cte() {
                return Err(c.unsupported("materialized common table expressions"));
            }
            sql.push_str("materialized ");
        }
        Materialization::NotMaterialized => {
            if !c.dialect.supports_materialized_cte() {
                return Err(c.unsupported("materialized common table expressions"));
            }
            sql.push_str("not materialized ");
        }
    }
    let body = match &cte.body {
        CteBody::Query(query) => c.statement(query)?,
        CteBody::Raw(fragment) => raw::splice(c, fragment),
    };
    sql.push('(');
    sql.push_str(&body);
    sql.push(')');
    Ok(sql)
}

/// One join clause. Multi-table joins compose left to right in call order.
pub(crate) fn join_sql(c: &mut Compiler, q: &Query, join: &Join) -> QuarryResult<String> {
    let target = match &join.target {
        JoinTarget::Table(t) => c.table_ref(q, t),
        JoinTarget::Subquery { query, alias } => {
            format!("({}) as {}", c.statement(query)?, c.ident(alias))
        }
        // A raw join replaces the whole clause.
        JoinTarget::Raw(fragment) => return Ok(raw::splice(c, fragment)),
    };
    let mut sql = format!("{} {}", join.kind.as_sql(), target);
    if join.kind == JoinKind::Cross {
        return Ok(sql);
    }
    if !join.using.is_empty() {
        let cols: Vec<String> = join.using.iter().map(|col| c.ident(col)).collect();
        sql.push_str(&format!(" using ({})", cols.join(", ")));
    } else if !join.on.is_empty() {
        sql.push_str(" on ");
        sql.push_str(&predicates::on_entries_sql(c, &join.on)?);
    }
    Ok(sql)
}
