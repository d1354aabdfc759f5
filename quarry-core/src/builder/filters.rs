//! The `where` family.
//!
//! Predicates accept `(column, value)`, `(column, op, value)`, an object map
//! for equality conjunction, a nested builder closure (wrapped in
//! parentheses), or a raw fragment. Within-clause ordering reflects call
//! order; `or_*` variants attach with OR.

use crate::ast::{InList, Operand, Operator, Predicate, Query, Raw, Ref, Value, WhereEntry};

impl Query {
    fn add_where(mut self, entry: WhereEntry) -> Self {
        self.wheres.push(entry);
        self
    }

    fn add_having(mut self, entry: WhereEntry) -> Self {
        self.havings.push(entry);
        self
    }

    // (column, op, value) --------------------------------------------------

    /// `column <op> value`. The operator may be an [`Operator`] or a string;
    /// unknown operator strings are emitted verbatim at the caller's risk.
    pub fn filter(
        self,
        column: impl AsRef<str>,
        op: impl Into<Operator>,
        value: impl Into<Value>,
    ) -> Self {
        self.add_where(WhereEntry::and(binary(column, op, value)))
    }

    pub fn or_filter(
        self,
        column: impl AsRef<str>,
        op: impl Into<Operator>,
        value: impl Into<Value>,
    ) -> Self {
        self.add_where(WhereEntry::or(binary(column, op, value)))
    }

    pub fn not_filter(
        self,
        column: impl AsRef<str>,
        op: impl Into<Operator>,
        value: impl Into<Value>,
    ) -> Self {
        self.add_where(WhereEntry::and(binary(column, op, value)).negated())
    }

    // Equality sugar -------------------------------------------------------

    pub fn where_eq(self, column: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.filter(column, Operator::Eq, value)
    }

    pub fn or_where_eq(self, column: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::Eq, value)
    }

    /// `whereNot`: negated equality.
    pub fn where_not(self, column: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.not_filter(column, Operator::Eq, value)
    }

    /// Object-map form: one equality conjunct per pair.
    pub fn where_all<I, S, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<Value>,
    {
        for (column, value) in pairs {
            self = self.where_eq(column, value);
        }
        self
    }

    /// Column-to-column comparison.
    pub fn where_column(
        self,
        lhs: impl AsRef<str>,
        op: impl Into<Operator>,
        rhs: impl AsRef<str>,
    ) -> Self {
        self.add_where(WhereEntry::and(Predicate::Binary {
            lhs: Ref::parse(lhs.as_ref()),
            op: op.into(),
            rhs: Operand::Column(Ref::parse(rhs.as_ref())),
        }))
    }

    // IN -------------------------------------------------------------------

    pub fn where_in<I, V>(self, column: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_where(WhereEntry::and(in_list(column, values)))
    }

    pub fn where_not_in<I, V>(self, column: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_where(WhereEntry::and(in_list(column, values)).negated())
    }

    pub fn or_where_in<I, V>(self, column: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_where(WhereEntry::or(in_list(column, values)))
    }

    pub fn or_where_not_in<I, V>(self, column: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_where(WhereEntry::or(in_list(column, values)).negated())
    }

    /// `column in (<sub-query>)`.
    pub fn where_in_query(self, column: impl AsRef<str>, query: Query) -> Self {
        self.add_where(WhereEntry::and(Predicate::In {
            column: Ref::parse(column.as_ref()),
            list: InList::Subquery(Box::new(query)),
        }))
    }

    pub fn where_not_in_query(self, column: impl AsRef<str>, query: Query) -> Self {
        self.add_where(
            WhereEntry::and(Predicate::In {
                column: Ref::parse(column.as_ref()),
                list: InList::Subquery(Box::new(query)),
            })
            .negated(),
        )
    }

    // BETWEEN --------------------------------------------------------------

    pub fn where_between(
        self,
        column: impl AsRef<str>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.add_where(WhereEntry::and(between(column, low, high)))
    }

    pub fn where_not_between(
        self,
        column: impl AsRef<str>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.add_where(WhereEntry::and(between(column, low, high)).negated())
    }

    pub fn or_where_between(
        self,
        column: impl AsRef<str>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.add_where(WhereEntry::or(between(column, low, high)))
    }

    // NULL tests -----------------------------------------------------------

    pub fn where_null(self, column: impl AsRef<str>) -> Self {
        self.add_where(WhereEntry::and(null(column)))
    }

    pub fn where_not_null(self, column: impl AsRef<str>) -> Self {
        self.add_where(WhereEntry::and(null(column)).negated())
    }

    pub fn or_where_null(self, column: impl AsRef<str>) -> Self {
        self.add_where(WhereEntry::or(null(column)))
    }

    pub fn or_where_not_null(self, column: impl AsRef<str>) -> Self {
        self.add_where(WhereEntry::or(null(column)).negated())
    }

    // EXISTS ---------------------------------------------------------------

    pub fn where_exists(self, query: Query) -> Self {
        self.add_where(WhereEntry::and(Predicate::Exists {
            query: Box::new(query),
        }))
    }

    pub fn where_not_exists(self, query: Query) -> Self {
        self.add_where(
            WhereEntry::and(Predicate::Exists {
                query: Box::new(query),
            })
            .negated(),
        )
    }

    pub fn or_where_exists(self, query: Query) -> Self {
        self.add_where(WhereEntry::or(Predicate::Exists {
            query: Box::new(query),
        }))
    }

    // LIKE -----------------------------------------------------------------

    pub fn where_like(self, column: impl AsRef<str>, pattern: impl Into<Value>) -> Self {
        self.filter(column, Operator::Like, pattern)
    }

    pub fn where_ilike(self, column: impl AsRef<str>, pattern: impl Into<Value>) -> Self {
        self.filter(column, Operator::ILike, pattern)
    }

    pub fn or_where_like(self, column: impl AsRef<str>, pattern: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::Like, pattern)
    }

    pub fn or_where_ilike(self, column: impl AsRef<str>, pattern: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::ILike, pattern)
    }

    // Raw ------------------------------------------------------------------

    pub fn where_raw(self, raw: impl Into<Raw>) -> Self {
        self.add_where(WhereEntry::and(Predicate::Raw(raw.into())))
    }

    pub fn or_where_raw(self, raw: impl Into<Raw>) -> Self {
        self.add_where(WhereEntry::or(Predicate::Raw(raw.into())))
    }

    // Nested groups --------------------------------------------------------

    /// Nested builder callback; the children render parenthesized.
    pub fn where_group(self, build: impl FnOnce(Query) -> Query) -> Self {
        let group = build(Query::default());
        self.add_where(WhereEntry::and(Predicate::Group(group.wheres)))
    }

    pub fn or_where_group(self, build: impl FnOnce(Query) -> Query) -> Self {
        let group = build(Query::default());
        self.add_where(WhereEntry::or(Predicate::Group(group.wheres)))
    }

    pub fn where_not_group(self, build: impl FnOnce(Query) -> Query) -> Self {
        let group = build(Query::default());
        self.add_where(WhereEntry::and(Predicate::Group(group.wheres)).negated())
    }

    // JSON -----------------------------------------------------------------

    /// Compare the scalar at a JSON path: `whereJsonPath('doc', '$.a.b', '>', 5)`.
    pub fn where_json_path(
        self,
        column: impl AsRef<str>,
        path: impl Into<String>,
        op: impl Into<Operator>,
        value: impl Into<Value>,
    ) -> Self {
        self.add_where(WhereEntry::and(Predicate::JsonPath {
            column: Ref::parse(column.as_ref()),
            path: path.into(),
            op: op.into(),
            value: value.into(),
        }))
    }

    /// Whole-document equality against a JSON object.
    pub fn where_json_object(self, column: impl AsRef<str>, value: serde_json::Value) -> Self {
        self.add_where(WhereEntry::and(Predicate::Binary {
            lhs: Ref::parse(column.as_ref()),
            op: Operator::Eq,
            rhs: Operand::Value(Value::Json(value)),
        }))
    }

    /// The column's document contains the given one (superset test).
    pub fn where_json_superset_of(
        self,
        column: impl AsRef<str>,
        value: serde_json::Value,
    ) -> Self {
        self.add_where(WhereEntry::and(Predicate::JsonContains {
            column: Ref::parse(column.as_ref()),
            value: Value::Json(value),
        }))
    }

    /// The column's document is contained in the given one (subset test).
    pub fn where_json_subset_of(self, column: impl AsRef<str>, value: serde_json::Value) -> Self {
        self.add_where(WhereEntry::and(Predicate::JsonContainedIn {
            column: Ref::parse(column.as_ref()),
            value: Value::Json(value),
        }))
    }

    // HAVING ---------------------------------------------------------------

    pub fn having(
        self,
        column: impl AsRef<str>,
        op: impl Into<Operator>,
        value: impl Into<Value>,
    ) -> Self {
        self.add_having(WhereEntry::and(binary(column, op, value)))
    }

    pub fn or_having(
        self,
        column: impl AsRef<str>,
        op: impl Into<Operator>,
        value: impl Into<Value>,
    ) -> Self {
        self.add_having(WhereEntry::or(binary(column, op, value)))
    }

    pub fn having_in<I, V>(self, column: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_having(WhereEntry::and(in_list(column, values)))
    }

    pub fn having_between(
        self,
        column: impl AsRef<str>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.add_having(WhereEntry::and(between(column, low, high)))
    }

    pub fn having_null(self, column: impl AsRef<str>) -> Self {
        self.add_having(WhereEntry::and(null(column)))
    }

    pub fn having_not_null(self, column: impl AsRef<str>) -> Self {
        self.add_having(WhereEntry::and(null(column)).negated())
    }

    pub fn having_raw(self, raw: impl Into<Raw>) -> Self {
        self.add_having(WhereEntry::and(Predicate::Raw(raw.into())))
    }
}

fn binary(
    column: impl AsRef<str>,
    op: impl Into<Operator>,
    value: impl Into<Value>,
) -> Predicate {
    Predicate::Binary {
        lhs: Ref::parse(column.as_ref()),
        op: op.into(),
        rhs: Operand::Value(value.into()),
    }
}

fn in_list<I, V>(column: impl AsRef<str>, values: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Predicate::In {
        column: Ref::parse(column.as_ref()),
        list: InList::Values(values.into_iter().map(Into::into).collect()),
    }
}

fn between(column: impl AsRef<str>, low: impl Into<Value>, high: impl Into<Value>) -> Predicate {
    Predicate::Between {
        column: Ref::parse(column.as_ref()),
        low: low.into(),
        high: high.into(),
    }
}

fn null(column: impl AsRef<str>) -> Predicate {
    Predicate::Null {
        column: Ref::parse(column.as_ref()),
    }
}
