use crate::ast::{Query, Raw, SortDirection, Value, WindowDef};
use crate::compiler::CompileOptions;
use crate::dialect::resolve_dialect;
use crate::error::QuarryError;

fn pg() -> &'static dyn crate::dialect::Dialect {
    resolve_dialect("pg").unwrap()
}

fn mysql() -> &'static dyn crate::dialect::Dialect {
    resolve_dialect("mysql").unwrap()
}

fn sqlite() -> &'static dyn crate::dialect::Dialect {
    resolve_dialect("sqlite").unwrap()
}

#[test]
fn test_select_where_postgres() {
    let compiled = Query::from_table("users")
        .where_eq("id", 1)
        .select(["name"])
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select "name" from "users" where "id" = $1"#);
    assert_eq!(compiled.bindings, vec![Value::Int(1)]);
}

#[test]
fn test_where_in_mysql() {
    let compiled = Query::from_table("users")
        .where_in("id", [1, 2, 3])
        .to_sql(mysql())
        .unwrap();
    assert_eq!(compiled.sql, "select * from `users` where `id` in (?, ?, ?)");
    assert_eq!(
        compiled.bindings,
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn test_join_sqlite() {
    let compiled = Query::from_table("a")
        .join("b", "a.id", "b.a_id")
        .select(["a.x", "b.y"])
        .to_sql(sqlite())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"select "a"."x", "b"."y" from "a" inner join "b" on "a"."id" = "b"."a_id""#
    );
    assert!(compiled.bindings.is_empty());
}

#[test]
fn test_insert_without_returning_support() {
    // SQLite has no RETURNING here; the clause is omitted and the runner
    // fabricates the response from last_insert_rowid.
    let compiled = Query::from_table("users")
        .insert([("name", "Alice")])
        .returning(["id"])
        .to_sql(sqlite())
        .unwrap();
    assert_eq!(compiled.sql, r#"insert into "users" ("name") values (?)"#);
    assert_eq!(compiled.returning, Some(vec!["id".to_string()]));
}

#[test]
fn test_insert_returning_star_postgres() {
    let compiled = Query::from_table("users")
        .insert([("name", "Alice")])
        .returning_all()
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"insert into "users" ("name") values ($1) returning *"#
    );
}

#[test]
fn test_clause_order_is_canonical() {
    // Builder call order differs; emitted clause order must not.
    let a = Query::from_table("t")
        .limit(10)
        .where_eq("x", 1)
        .order_asc("y")
        .group_by(["z"])
        .select(["z"])
        .to_sql(pg())
        .unwrap();
    let b = Query::from_table("t")
        .select(["z"])
        .group_by(["z"])
        .order_asc("y")
        .where_eq("x", 1)
        .limit(10)
        .to_sql(pg())
        .unwrap();
    assert_eq!(a.sql, b.sql);
    assert_eq!(
        a.sql,
        r#"select "z" from "t" where "x" = $1 group by "z" order by "y" asc limit $2"#
    );
}

#[test]
fn test_or_where_and_groups() {
    let compiled = Query::from_table("users")
        .where_eq("active", true)
        .or_where_group(|q| q.where_eq("role", "admin").or_where_eq("role", "mod"))
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"select * from "users" where "active" = $1 or ("role" = $2 or "role" = $3)"#
    );
}

#[test]
fn test_empty_group_is_dropped() {
    let compiled = Query::from_table("users")
        .where_eq("id", 7)
        .where_group(|q| q)
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "users" where "id" = $1"#);
}

#[test]
fn test_where_null_folding() {
    let compiled = Query::from_table("users")
        .where_eq("deleted_at", Value::Null)
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "users" where "deleted_at" is null"#);
    assert!(compiled.bindings.is_empty());
}

#[test]
fn test_empty_in_list() {
    let compiled = Query::from_table("users")
        .where_in("id", Vec::<i64>::new())
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "users" where 1 = 0"#);

    let compiled = Query::from_table("users")
        .where_not_in("id", Vec::<i64>::new())
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "users" where 1 = 1"#);
}

#[test]
fn test_between_and_not_between() {
    let compiled = Query::from_table("events")
        .where_between("at", 10, 20)
        .to_sql(mysql())
        .unwrap();
    assert_eq!(
        compiled.sql,
        "select * from `events` where `at` between ? and ?"
    );

    let compiled = Query::from_table("events")
        .where_not_between("at", 10, 20)
        .to_sql(mysql())
        .unwrap();
    assert_eq!(
        compiled.sql,
        "select * from `events` where `at` not between ? and ?"
    );
}

#[test]
fn test_exists_subquery_shares_binding_counter() {
    let sub = Query::from_table("orders")
        .where_column("orders.user_id", "=", "users.id")
        .where_eq("status", "open");
    let compiled = Query::from_table("users")
        .where_eq("active", true)
        .where_exists(sub)
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"select * from "users" where "active" = $1 and exists (select * from "orders" where "orders"."user_id" = "users"."id" and "status" = $2)"#
    );
    assert_eq!(compiled.bindings.len(), 2);
}

#[test]
fn test_raw_positional_rewriting_postgres() {
    let compiled = Query::from_table("users")
        .where_eq("a", 1)
        .where_raw(Raw::bind("lower(email) = lower(?)", ["X@Y.Z"]))
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"select * from "users" where "a" = $1 and lower(email) = lower($2)"#
    );
    assert_eq!(compiled.bindings.len(), 2);
}

#[test]
fn test_raw_escaped_question_mark() {
    let compiled = Query::from_table("docs")
        .where_raw(Raw::bind(r"payload \? ?", ["tag"]))
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "docs" where payload ? $1"#);
    assert_eq!(compiled.bindings, vec![Value::Text("tag".into())]);
}

#[test]
fn test_raw_named_bindings_and_casts() {
    let compiled = Query::raw(Raw::named(
        "select * from logs where level = :level and at > :since::timestamptz",
        [("level", Value::from("warn")), ("since", Value::from("2024-01-01"))],
    ))
    .to_sql(pg())
    .unwrap();
    assert_eq!(
        compiled.sql,
        "select * from logs where level = $1 and at > $2::timestamptz"
    );
    assert_eq!(compiled.bindings.len(), 2);
}

#[test]
fn test_raw_bindings_exhausted_leaves_marker() {
    let compiled = Query::from_table("t")
        .where_raw(Raw::bind("a = ? and b = ?", [1]))
        .to_sql(sqlite())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "t" where a = ? and b = ?"#);
    assert_eq!(compiled.bindings, vec![Value::Int(1)]);
}

#[test]
fn test_update_mysql() {
    let compiled = Query::from_table("users")
        .set("verified", true)
        .where_eq("id", 5)
        .to_sql(mysql())
        .unwrap();
    assert_eq!(
        compiled.sql,
        "update `users` set `verified` = ? where `id` = ?"
    );
    assert_eq!(compiled.bindings, vec![Value::Bool(true), Value::Int(5)]);
}

#[test]
fn test_delete_with_returning_postgres() {
    let compiled = Query::from_table("sessions")
        .del()
        .where_eq("expired", true)
        .returning(["id"])
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"delete from "sessions" where "expired" = $1 returning "id""#
    );
}

#[test]
fn test_multi_row_insert_null_fill() {
    let rows = vec![
        vec![("a", Value::Int(1)), ("b", Value::Int(2))],
        vec![("a", Value::Int(3))],
    ];
    let err = Query::from_table("t")
        .insert_rows(rows.clone())
        .to_sql(pg())
        .unwrap_err();
    assert!(matches!(err, QuarryError::Config(_)));

    let options = CompileOptions {
        use_null_as_default: true,
        ..Default::default()
    };
    let compiled = Query::from_table("t")
        .insert_rows(rows)
        .to_sql_with(pg(), &options)
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"insert into "t" ("a", "b") values ($1, $2), ($3, $4)"#
    );
    assert_eq!(compiled.bindings[3], Value::Null);
}

#[test]
fn test_on_conflict_merge_postgres() {
    let compiled = Query::from_table("users")
        .insert([("id", Value::Int(1)), ("name", Value::from("Alice"))])
        .on_conflict(["id"])
        .merge_all()
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"insert into "users" ("id", "name") values ($1, $2) on conflict ("id") do update set "name" = excluded."name""#
    );
}

#[test]
fn test_on_conflict_mysql_duplicate_key() {
    let compiled = Query::from_table("users")
        .insert([("id", Value::Int(1)), ("name", Value::from("Alice"))])
        .on_conflict(["id"])
        .merge_all()
        .to_sql(mysql())
        .unwrap();
    assert_eq!(
        compiled.sql,
        "insert into `users` (`id`, `name`) values (?, ?) on duplicate key update `name` = values(`name`)"
    );

    let compiled = Query::from_table("users")
        .insert([("id", Value::Int(1))])
        .on_conflict(["id"])
        .ignore()
        .to_sql(mysql())
        .unwrap();
    assert_eq!(compiled.sql, "insert ignore into `users` (`id`) values (?)");
}

#[test]
fn test_cte_recursive_postgres() {
    let base = Query::from_table("categories").where_null("parent_id");
    let compiled = Query::from_table("tree")
        .with_recursive("tree", ["id"], base)
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"with recursive "tree" ("id") as (select * from "categories" where "parent_id" is null) select * from "tree""#
    );
}

#[test]
fn test_union_wrap() {
    let other = Query::from_table("b").select(["x"]);
    let compiled = Query::from_table("a")
        .select(["x"])
        .set_op(crate::ast::SetOpKind::Union, other, true)
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"select "x" from "a" union (select "x" from "b")"#
    );
}

#[test]
fn test_limit_offset_mssql_rewrite() {
    let mssql = resolve_dialect("mssql").unwrap();
    let compiled = Query::from_table("users")
        .order_asc("id")
        .limit(10)
        .offset(5)
        .to_sql(mssql)
        .unwrap();
    assert_eq!(
        compiled.sql,
        "select * from [users] order by [id] asc offset @p1 rows fetch next @p2 rows only"
    );
    // OFFSET binds before FETCH in the emitted text.
    assert_eq!(compiled.bindings, vec![Value::Int(5), Value::Int(10)]);
}

#[test]
fn test_top_mssql_without_offset() {
    let mssql = resolve_dialect("mssql").unwrap();
    let compiled = Query::from_table("users").limit(3).to_sql(mssql).unwrap();
    assert_eq!(compiled.sql, "select top (@p1) * from [users]");
    assert_eq!(compiled.bindings, vec![Value::Int(3)]);
}

#[test]
fn test_limit_literal_skips_binding() {
    let compiled = Query::from_table("users")
        .limit_literal(10)
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "users" limit 10"#);
    assert!(compiled.bindings.is_empty());
}

#[test]
fn test_negative_limit_rejected() {
    let err = Query::from_table("users").limit(-1).to_sql(pg()).unwrap_err();
    assert!(matches!(err, QuarryError::Config(_)));
}

#[test]
fn test_oracle_placeholders_and_paging() {
    let oracle = resolve_dialect("oracle").unwrap();
    let compiled = Query::from_table("users")
        .where_eq("id", 1)
        .limit(10)
        .offset(5)
        .to_sql(oracle)
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"select * from "users" where "id" = :1 offset :2 rows fetch next :3 rows only"#
    );
}

#[test]
fn test_count_distinct_multi_argument() {
    let compiled = Query::from_table("t")
        .count_distinct(["a", "b"])
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select count(distinct "a", "b") from "t""#);

    let compiled = Query::from_table("t")
        .count_distinct(["a", "b"])
        .to_sql(sqlite())
        .unwrap();
    assert_eq!(compiled.sql, r#"select count(distinct "a" || "b") from "t""#);
}

#[test]
fn test_with_schema_applies_to_tables_only() {
    let compiled = Query::from_table("users")
        .with_schema("crm")
        .join("accounts", "users.account_id", "accounts.id")
        .select(["users.name"])
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"select "users"."name" from "crm"."users" inner join "crm"."accounts" on "users"."account_id" = "accounts"."id""#
    );
}

#[test]
fn test_window_clause_and_projection() {
    let compiled = Query::from_table("scores")
        .select(["player"])
        .select_window("sum", ["points"], "w", "running_total")
        .window(
            WindowDef::new("w")
                .partition_by(["team"])
                .order_by("points", SortDirection::Desc),
        )
        .order_asc("player")
        .to_sql(pg())
        .unwrap();
    // The WINDOW clause sits between HAVING and ORDER BY.
    assert_eq!(
        compiled.sql,
        r#"select "player", sum("points") over "w" as "running_total" from "scores" window "w" as (partition by "team" order by "points" desc) order by "player" asc"#
    );
    assert!(compiled.bindings.is_empty());
}

#[test]
fn test_window_unsupported_dialect() {
    let mssql = resolve_dialect("mssql").unwrap();
    let err = Query::from_table("scores")
        .window(WindowDef::new("w").partition_by(["team"]))
        .to_sql(mssql)
        .unwrap_err();
    assert!(matches!(err, QuarryError::Unsupported { .. }));

    let err = Query::from_table("scores")
        .select_window("row_number", Vec::<&str>::new(), "w", "rank")
        .to_sql(mssql)
        .unwrap_err();
    assert!(matches!(err, QuarryError::Unsupported { .. }));
}

#[test]
fn test_for_update_of_tables() {
    let compiled = Query::from_table("jobs")
        .join("runs", "jobs.id", "runs.job_id")
        .for_update_of(["jobs"])
        .skip_locked()
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"select * from "jobs" inner join "runs" on "jobs"."id" = "runs"."job_id" for update of "jobs" skip locked"#
    );

    let compiled = Query::from_table("jobs")
        .for_update_of(["jobs"])
        .to_sql(mysql())
        .unwrap();
    assert_eq!(compiled.sql, "select * from `jobs` for update of `jobs`");

    // Redshift locks rows but has no OF list; the table list is dropped.
    let redshift = resolve_dialect("redshift").unwrap();
    let compiled = Query::from_table("jobs")
        .for_update_of(["jobs"])
        .to_sql(redshift)
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "jobs" for update"#);
}

#[test]
fn test_locking_gated_by_dialect() {
    let compiled = Query::from_table("jobs")
        .for_update()
        .skip_locked()
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "jobs" for update skip locked"#);

    // SQLite has no row locks; the clause is omitted, not an error.
    let compiled = Query::from_table("jobs")
        .for_update()
        .to_sql(sqlite())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "jobs""#);
}

#[test]
fn test_distinct_on_unsupported() {
    let err = Query::from_table("users")
        .distinct_on(["email"])
        .to_sql(mysql())
        .unwrap_err();
    assert!(matches!(err, QuarryError::Unsupported { .. }));
}

#[test]
fn test_order_by_nulls_last() {
    let compiled = Query::from_table("t")
        .order_by_nulls("x", SortDirection::Desc, crate::ast::NullsOrder::Last)
        .to_sql(pg())
        .unwrap();
    assert_eq!(compiled.sql, r#"select * from "t" order by "x" desc nulls last"#);

    // Emission is gated on dialect support.
    let compiled = Query::from_table("t")
        .order_by_nulls("x", SortDirection::Desc, crate::ast::NullsOrder::Last)
        .to_sql(mysql())
        .unwrap();
    assert_eq!(compiled.sql, "select * from `t` order by `x` desc");
}

#[test]
fn test_truncate_per_dialect() {
    let compiled = Query::truncate("users").to_sql(pg()).unwrap();
    assert_eq!(compiled.sql, r#"truncate "users""#);

    let compiled = Query::truncate("users").to_sql(sqlite()).unwrap();
    assert_eq!(compiled.sql, r#"delete from "users""#);
}

#[test]
fn test_create_table_type_mapping() {
    use crate::ast::ColumnDef;
    use crate::types::ColumnType;
    let query = Query::create_table("users")
        .add_column(ColumnDef::new("id", ColumnType::Increments))
        .add_column(ColumnDef::new("email", ColumnType::String(255)).unique())
        .add_column(ColumnDef::new("bio", ColumnType::Text).nullable());

    let compiled = query.to_sql(pg()).unwrap();
    assert_eq!(
        compiled.sql,
        r#"create table "users" ("id" serial primary key, "email" varchar(255) not null unique, "bio" text)"#
    );

    let compiled = query.to_sql(mysql()).unwrap();
    assert_eq!(
        compiled.sql,
        "create table `users` (`id` int unsigned not null auto_increment primary key, `email` varchar(255) not null unique, `bio` text)"
    );
}

#[test]
fn test_compile_is_deterministic() {
    let query = Query::from_table("users")
        .where_eq("id", 1)
        .where_in("role", ["a", "b"])
        .order_desc("created_at")
        .limit(5);
    let first = query.to_sql(pg()).unwrap();
    let second = query.to_sql(pg()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_debug_string_inlines_bindings() {
    let compiled = Query::from_table("users")
        .where_eq("name", "O'Brien")
        .where_eq("age", 30)
        .to_sql(pg())
        .unwrap();
    assert_eq!(
        compiled.to_debug_string(pg()),
        r#"select * from "users" where "name" = 'O''Brien' and "age" = 30"#
    );
}

#[test]
fn test_wrap_identifier_override() {
    let options = CompileOptions {
        wrap_identifier: Some(std::sync::Arc::new(|segment: &str| {
            format!("\"{}\"", segment.to_ascii_uppercase())
        })),
        ..Default::default()
    };
    let compiled = Query::from_table("users")
        .select(["name"])
        .to_sql_with(pg(), &options)
        .unwrap();
    assert_eq!(compiled.sql, r#"select "NAME" from "USERS""#);
}
