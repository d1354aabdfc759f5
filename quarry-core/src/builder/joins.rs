//! Join builder methods and the ON-clause sub-builder.

use crate::ast::{
    BoolOp, Join, JoinKind, JoinTarget, OnCondition, OnEntry, Operator, Query, Raw, Ref, TableRef,
    Value,
};

/// Builds the ON tree of a join, handed to the `join_with` closure.
#[derive(Debug, Default)]
pub struct OnBuilder {
    pub(crate) entries: Vec<OnEntry>,
    pub(crate) using: Vec<String>,
}

impl OnBuilder {
    fn push(mut self, bool_op: BoolOp, not: bool, condition: OnCondition) -> Self {
        self.entries.push(OnEntry {
            bool_op,
            not,
            condition,
        });
        self
    }

    /// `lhs = rhs` column equality.
    pub fn on(self, lhs: impl AsRef<str>, rhs: impl AsRef<str>) -> Self {
        self.on_op(lhs, Operator::Eq, rhs)
    }

    pub fn on_op(
        self,
        lhs: impl AsRef<str>,
        op: impl Into<Operator>,
        rhs: impl AsRef<str>,
    ) -> Self {
        self.push(
            BoolOp::And,
            false,
            OnCondition::Columns {
                lhs: Ref::parse(lhs.as_ref()),
                op: op.into(),
                rhs: Ref::parse(rhs.as_ref()),
            },
        )
    }

    pub fn and_on(self, lhs: impl AsRef<str>, rhs: impl AsRef<str>) -> Self {
        self.on(lhs, rhs)
    }

    pub fn or_on(self, lhs: impl AsRef<str>, rhs: impl AsRef<str>) -> Self {
        self.push(
            BoolOp::Or,
            false,
            OnCondition::Columns {
                lhs: Ref::parse(lhs.as_ref()),
                op: Operator::Eq,
                rhs: Ref::parse(rhs.as_ref()),
            },
        )
    }

    /// Compare a joined column against a bound value.
    pub fn on_val(
        self,
        lhs: impl AsRef<str>,
        op: impl Into<Operator>,
        value: impl Into<Value>,
    ) -> Self {
        self.push(
            BoolOp::And,
            false,
            OnCondition::Value {
                lhs: Ref::parse(lhs.as_ref()),
                op: op.into(),
                value: value.into(),
            },
        )
    }

    pub fn on_in<I, V>(self, column: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push(
            BoolOp::And,
            false,
            OnCondition::In {
                column: Ref::parse(column.as_ref()),
                values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn on_between(
        self,
        column: impl AsRef<str>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.push(
            BoolOp::And,
            false,
            OnCondition::Between {
                column: Ref::parse(column.as_ref()),
                low: low.into(),
                high: high.into(),
            },
        )
    }

    pub fn on_exists(self, query: Query) -> Self {
        self.push(
            BoolOp::And,
            false,
            OnCondition::Exists {
                query: Box::new(query),
            },
        )
    }

    pub fn on_null(self, column: impl AsRef<str>) -> Self {
        self.push(
            BoolOp::And,
            false,
            OnCondition::Null {
                column: Ref::parse(column.as_ref()),
            },
        )
    }

    pub fn on_not_null(self, column: impl AsRef<str>) -> Self {
        self.push(
            BoolOp::And,
            true,
            OnCondition::Null {
                column: Ref::parse(column.as_ref()),
            },
        )
    }

    pub fn on_raw(self, raw: impl Into<Raw>) -> Self {
        self.push(BoolOp::And, false, OnCondition::Raw(raw.into()))
    }

    /// `USING (col, ...)`; replaces any ON conditions.
    pub fn using<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.using
            .extend(cols.into_iter().map(|c| c.as_ref().to_string()));
        self
    }
}

impl Query {
    fn add_join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Inner join with a single-column equality: `join("b", "a.id", "b.a_id")`.
    pub fn join(self, table: impl AsRef<str>, lhs: impl AsRef<str>, rhs: impl AsRef<str>) -> Self {
        self.join_kind(JoinKind::Inner, table, lhs, rhs)
    }

    pub fn inner_join(
        self,
        table: impl AsRef<str>,
        lhs: impl AsRef<str>,
        rhs: impl AsRef<str>,
    ) -> Self {
        self.join_kind(JoinKind::Inner, table, lhs, rhs)
    }

    pub fn left_join(
        self,
        table: impl AsRef<str>,
        lhs: impl AsRef<str>,
        rhs: impl AsRef<str>,
    ) -> Self {
        self.join_kind(JoinKind::Left, table, lhs, rhs)
    }

    pub fn right_join(
        self,
        table: impl AsRef<str>,
        lhs: impl AsRef<str>,
        rhs: impl AsRef<str>,
    ) -> Self {
        self.join_kind(JoinKind::Right, table, lhs, rhs)
    }

    pub fn full_outer_join(
        self,
        table: impl AsRef<str>,
        lhs: impl AsRef<str>,
        rhs: impl AsRef<str>,
    ) -> Self {
        self.join_kind(JoinKind::Full, table, lhs, rhs)
    }

    pub fn cross_join(self, table: impl AsRef<str>) -> Self {
        self.add_join(Join {
            kind: JoinKind::Cross,
            target: JoinTarget::Table(TableRef::parse(table.as_ref())),
            on: vec![],
            using: vec![],
        })
    }

    /// Join with an explicit operator: `join_op("b", "a.x", ">=", "b.y")`.
    pub fn join_op(
        self,
        table: impl AsRef<str>,
        lhs: impl AsRef<str>,
        op: impl Into<Operator>,
        rhs: impl AsRef<str>,
    ) -> Self {
        let on = OnBuilder::default().on_op(lhs, op, rhs);
        self.join_built(JoinKind::Inner, table, on)
    }

    /// Multi-column equality map.
    pub fn join_map<I, S1, S2>(self, table: impl AsRef<str>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S1, S2)>,
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        let mut on = OnBuilder::default();
        for (lhs, rhs) in pairs {
            on = on.on(lhs, rhs);
        }
        self.join_built(JoinKind::Inner, table, on)
    }

    /// Join with an ON tree built by a closure.
    pub fn join_with(
        self,
        kind: JoinKind,
        table: impl AsRef<str>,
        build: impl FnOnce(OnBuilder) -> OnBuilder,
    ) -> Self {
        let on = build(OnBuilder::default());
        self.join_built(kind, table, on)
    }

    /// Join against a sub-query.
    pub fn join_subquery(
        self,
        kind: JoinKind,
        query: Query,
        join_alias: impl Into<String>,
        build: impl FnOnce(OnBuilder) -> OnBuilder,
    ) -> Self {
        let on = build(OnBuilder::default());
        self.add_join(Join {
            kind,
            target: JoinTarget::Subquery {
                query: Box::new(query),
                alias: join_alias.into(),
            },
            on: on.entries,
            using: on.using,
        })
    }

    /// Splice a raw fragment as the whole join clause.
    pub fn join_raw(self, raw: impl Into<Raw>) -> Self {
        self.add_join(Join {
            kind: JoinKind::Inner,
            target: JoinTarget::Raw(raw.into()),
            on: vec![],
            using: vec![],
        })
    }

    fn join_kind(
        self,
        kind: JoinKind,
        table: impl AsRef<str>,
        lhs: impl AsRef<str>,
        rhs: impl AsRef<str>,
    ) -> Self {
        let on = OnBuilder::default().on(lhs, rhs);
        self.join_built(kind, table, on)
    }

    fn join_built(self, kind: JoinKind, table: impl AsRef<str>, on: OnBuilder) -> Self {
        self.add_join(Join {
            kind,
            target: JoinTarget::Table(TableRef::parse(table.as_ref())),
            on: on.entries,
            using: on.using,
        })
    }
}
