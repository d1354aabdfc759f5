//! Aggregate projection methods.

use crate::ast::{AggregateFunc, Query, Ref, SelectItem};

impl Query {
    fn add_aggregate(
        mut self,
        func: AggregateFunc,
        distinct: bool,
        args: Vec<Ref>,
        alias: Option<String>,
    ) -> Self {
        self.columns.push(SelectItem::Aggregate {
            func,
            distinct,
            args,
            alias,
        });
        self
    }

    /// `count(col)`; pass `*` for a row count.
    pub fn count(self, col: impl AsRef<str>) -> Self {
        self.add_aggregate(
            AggregateFunc::Count,
            false,
            vec![Ref::parse(col.as_ref())],
            None,
        )
    }

    pub fn count_as(self, col: impl AsRef<str>, alias: impl Into<String>) -> Self {
        self.add_aggregate(
            AggregateFunc::Count,
            false,
            vec![Ref::parse(col.as_ref())],
            Some(alias.into()),
        )
    }

    /// `count(distinct a, b)`; dialects without multi-argument distinct
    /// rewrite to a concatenation.
    pub fn count_distinct<I, S>(self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args = cols.into_iter().map(|c| Ref::parse(c.as_ref())).collect();
        self.add_aggregate(AggregateFunc::Count, true, args, None)
    }

    pub fn count_distinct_as<I, S>(self, cols: I, alias: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args = cols.into_iter().map(|c| Ref::parse(c.as_ref())).collect();
        self.add_aggregate(AggregateFunc::Count, true, args, Some(alias.into()))
    }

    pub fn min(self, col: impl AsRef<str>) -> Self {
        self.add_aggregate(
            AggregateFunc::Min,
            false,
            vec![Ref::parse(col.as_ref())],
            None,
        )
    }

    pub fn min_as(self, col: impl AsRef<str>, alias: impl Into<String>) -> Self {
        self.add_aggregate(
            AggregateFunc::Min,
            false,
            vec![Ref::parse(col.as_ref())],
            Some(alias.into()),
        )
    }

    pub fn max(self, col: impl AsRef<str>) -> Self {
        self.add_aggregate(
            AggregateFunc::Max,
            false,
            vec![Ref::parse(col.as_ref())],
            None,
        )
    }

    pub fn max_as(self, col: impl AsRef<str>, alias: impl Into<String>) -> Self {
        self.add_aggregate(
            AggregateFunc::Max,
            false,
            vec![Ref::parse(col.as_ref())],
            Some(alias.into()),
        )
    }

    pub fn sum(self, col: impl AsRef<str>) -> Self {
        self.add_aggregate(
            AggregateFunc::Sum,
            false,
            vec![Ref::parse(col.as_ref())],
            None,
        )
    }

    pub fn sum_as(self, col: impl AsRef<str>, alias: impl Into<String>) -> Self {
        self.add_aggregate(
            AggregateFunc::Sum,
            false,
            vec![Ref::parse(col.as_ref())],
            Some(alias.into()),
        )
    }

    pub fn sum_distinct(self, col: impl AsRef<str>) -> Self {
        self.add_aggregate(
            AggregateFunc::Sum,
            true,
            vec![Ref::parse(col.as_ref())],
            None,
        )
    }

    pub fn avg(self, col: impl AsRef<str>) -> Self {
        self.add_aggregate(
            AggregateFunc::Avg,
            false,
            vec![Ref::parse(col.as_ref())],
            None,
        )
    }

    pub fn avg_as(self, col: impl AsRef<str>, alias: impl Into<String>) -> Self {
        self.add_aggregate(
            AggregateFunc::Avg,
            false,
            vec![Ref::parse(col.as_ref())],
            Some(alias.into()),
        )
    }

    pub fn avg_distinct(self, col: impl AsRef<str>) -> Self {
        self.add_aggregate(
            AggregateFunc::Avg,
            true,
            vec![Ref::parse(col.as_ref())],
            None,
        )
    }
}
