//! Compiler invariants: placeholder/binding agreement, determinism,
//! clearing equivalence, AND-commutativity, and a random-chain fuzz.

use proptest::prelude::*;
use quarry_core::prelude::*;

fn pg() -> &'static dyn Dialect {
    resolve_dialect("pg").unwrap()
}

fn mysql() -> &'static dyn Dialect {
    resolve_dialect("mysql").unwrap()
}

fn sqlite() -> &'static dyn Dialect {
    resolve_dialect("sqlite").unwrap()
}

/// Count placeholders in compiled SQL for the dialect's style.
fn count_placeholders(sql: &str, dialect: &dyn Dialect) -> usize {
    if dialect.placeholder(1) == "?" {
        sql.chars().filter(|c| *c == '?').count()
    } else {
        // Indexed style: count marker-then-digit occurrences.
        let marker = dialect
            .placeholder(1)
            .chars()
            .next()
            .expect("placeholder marker");
        let chars: Vec<char> = sql.chars().collect();
        let mut count = 0;
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == marker {
                let mut j = i + 1;
                // Skip mssql's 'p' infix.
                if j < chars.len() && chars[j] == 'p' {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    count += 1;
                    i = j;
                }
            }
            i += 1;
        }
        count
    }
}

#[test]
fn binding_count_matches_placeholders() {
    let query = Query::from_table("users")
        .select(["name", "email"])
        .where_eq("active", true)
        .where_in("role", ["admin", "mod"])
        .where_between("age", 18, 65)
        .or_where_group(|q| q.where_eq("vip", true).where_not_null("email"))
        .order_desc("created_at")
        .limit(25)
        .offset(50);
    for name in ["pg", "mysql", "sqlite", "mssql", "oracle"] {
        let dialect = resolve_dialect(name).unwrap();
        let compiled = query.to_sql(dialect).unwrap();
        assert_eq!(
            count_placeholders(&compiled.sql, dialect),
            compiled.bindings.len(),
            "placeholder mismatch for {}: {}",
            name,
            compiled.sql
        );
    }
}

#[test]
fn to_sql_twice_is_equal() {
    let query = Query::from_table("users")
        .where_eq("id", 9)
        .select(["name"])
        .first();
    assert_eq!(query.to_sql(pg()).unwrap(), query.to_sql(pg()).unwrap());
}

#[test]
fn clones_share_no_state() {
    let base = Query::from_table("users").where_eq("a", 1);
    let cloned = base.clone();
    let extended = cloned.where_eq("b", 2);
    assert_eq!(
        base.to_sql(pg()).unwrap().sql,
        r#"select * from "users" where "a" = $1"#
    );
    assert_eq!(
        extended.to_sql(pg()).unwrap().sql,
        r#"select * from "users" where "a" = $1 and "b" = $2"#
    );
}

#[test]
fn and_conjuncts_commute_up_to_reordering() {
    let ab = Query::from_table("t")
        .where_eq("a", 1)
        .where_eq("b", 2)
        .to_sql(pg())
        .unwrap();
    let ba = Query::from_table("t")
        .where_eq("b", 2)
        .where_eq("a", 1)
        .to_sql(pg())
        .unwrap();

    let conjuncts = |sql: &str| {
        let clause = sql.split(" where ").nth(1).unwrap().to_string();
        let mut parts: Vec<String> = clause.split(" and ").map(|s| s.to_string()).collect();
        // Normalize placeholder numbering before comparing the sets.
        parts.iter_mut().for_each(|p| {
            *p = p.replace("$1", "$n").replace("$2", "$n");
        });
        parts.sort();
        parts
    };
    assert_eq!(conjuncts(&ab.sql), conjuncts(&ba.sql));
}

#[test]
fn clearing_then_rebuilding_equals_direct_build() {
    let direct = Query::from_table("t").where_eq("x", 1).order_asc("y");
    let rebuilt = Query::from_table("t")
        .where_eq("scrapped", true)
        .order_desc("scrapped")
        .clear_where()
        .clear_order()
        .where_eq("x", 1)
        .order_asc("y");
    assert_eq!(direct.to_sql(pg()).unwrap(), rebuilt.to_sql(pg()).unwrap());
}

// Random-chain fuzz ---------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Select(u8),
    WhereEq(u8, i64),
    OrWhereEq(u8, i64),
    WhereNot(u8, i64),
    WhereIn(u8, Vec<i64>),
    WhereNull(u8),
    WhereNotNull(u8),
    WhereLike(u8, String),
    WhereBetween(u8, i64, i64),
    GroupBy(u8),
    Having(u8, i64),
    OrderAsc(u8),
    OrderDesc(u8),
    Limit(i64),
    Offset(i64),
    Distinct,
    First,
    Join(u8, u8),
}

const COLS: [&str; 6] = ["id", "name", "email", "age", "role", "created_at"];

fn col(i: u8) -> &'static str {
    COLS[i as usize % COLS.len()]
}

fn apply(query: Query, op: &Op) -> Query {
    match op {
        Op::Select(c) => query.column(col(*c)),
        Op::WhereEq(c, v) => query.where_eq(col(*c), *v),
        Op::OrWhereEq(c, v) => query.or_where_eq(col(*c), *v),
        Op::WhereNot(c, v) => query.where_not(col(*c), *v),
        Op::WhereIn(c, vs) => query.where_in(col(*c), vs.clone()),
        Op::WhereNull(c) => query.where_null(col(*c)),
        Op::WhereNotNull(c) => query.where_not_null(col(*c)),
        Op::WhereLike(c, pat) => query.where_like(col(*c), pat.as_str()),
        Op::WhereBetween(c, lo, hi) => query.where_between(col(*c), *lo, *hi),
        Op::GroupBy(c) => query.group_by([col(*c)]),
        Op::Having(c, v) => query.having(col(*c), ">", *v),
        Op::OrderAsc(c) => query.order_asc(col(*c)),
        Op::OrderDesc(c) => query.order_desc(col(*c)),
        Op::Limit(n) => query.limit(*n),
        Op::Offset(n) => query.offset(*n),
        Op::Distinct => query.distinct(),
        Op::First => query.first(),
        Op::Join(t, c) => {
            let table = ["orders", "sessions", "events"][*t as usize % 3];
            query.join(
                table,
                format!("t.{}", col(*c)),
                format!("{}.t_id", table),
            )
        }
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::Select),
        (any::<u8>(), any::<i64>()).prop_map(|(c, v)| Op::WhereEq(c, v)),
        (any::<u8>(), any::<i64>()).prop_map(|(c, v)| Op::OrWhereEq(c, v)),
        (any::<u8>(), any::<i64>()).prop_map(|(c, v)| Op::WhereNot(c, v)),
        (any::<u8>(), proptest::collection::vec(any::<i64>(), 0..5))
            .prop_map(|(c, vs)| Op::WhereIn(c, vs)),
        any::<u8>().prop_map(Op::WhereNull),
        any::<u8>().prop_map(Op::WhereNotNull),
        (any::<u8>(), "[a-z%]{0,8}").prop_map(|(c, p)| Op::WhereLike(c, p)),
        (any::<u8>(), any::<i64>(), any::<i64>()).prop_map(|(c, lo, hi)| Op::WhereBetween(c, lo, hi)),
        any::<u8>().prop_map(Op::GroupBy),
        (any::<u8>(), any::<i64>()).prop_map(|(c, v)| Op::Having(c, v)),
        any::<u8>().prop_map(Op::OrderAsc),
        any::<u8>().prop_map(Op::OrderDesc),
        (0i64..10_000).prop_map(Op::Limit),
        (0i64..10_000).prop_map(Op::Offset),
        Just(Op::Distinct),
        Just(Op::First),
        (any::<u8>(), any::<u8>()).prop_map(|(t, c)| Op::Join(t, c)),
    ]
}

proptest! {
    /// Random builder chains always compile, and every compiled query
    /// satisfies the placeholder-count invariant on every dialect.
    #[test]
    fn random_chains_compile_with_matching_bindings(
        ops in proptest::collection::vec(op_strategy(), 0..24)
    ) {
        let mut query = Query::from_table("t");
        for op in &ops {
            query = apply(query, op);
        }
        for dialect in [pg(), mysql(), sqlite()] {
            let compiled = query.to_sql(dialect).unwrap();
            prop_assert_eq!(
                count_placeholders(&compiled.sql, dialect),
                compiled.bindings.len(),
                "sql: {}",
                compiled.sql
            );
        }
    }

    /// Compilation is a pure function of (AST, dialect).
    #[test]
    fn random_chains_are_deterministic(
        ops in proptest::collection::vec(op_strategy(), 0..16)
    ) {
        let mut query = Query::from_table("t");
        for op in &ops {
            query = apply(query, op);
        }
        let first = query.to_sql(pg()).unwrap();
        let second = query.to_sql(pg()).unwrap();
        prop_assert_eq!(first, second);
    }
}
