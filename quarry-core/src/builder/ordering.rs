//! Grouping, ordering and paging.

use crate::ast::{
    GroupItem, LimitClause, NullsOrder, OrderItem, OrderTarget, Query, Raw, Ref, SortDirection,
};

impl Query {
    pub fn group_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.group_by.extend(
            cols.into_iter()
                .map(|c| GroupItem::Column(Ref::parse(c.as_ref()))),
        );
        self
    }

    pub fn group_by_raw(mut self, raw: impl Into<Raw>) -> Self {
        self.group_by.push(GroupItem::Raw(raw.into()));
        self
    }

    pub fn order_by(mut self, col: impl AsRef<str>, direction: SortDirection) -> Self {
        self.orders.push(OrderItem {
            target: OrderTarget::Column(Ref::parse(col.as_ref())),
            direction,
            nulls: NullsOrder::Default,
        });
        self
    }

    pub fn order_asc(self, col: impl AsRef<str>) -> Self {
        self.order_by(col, SortDirection::Asc)
    }

    pub fn order_desc(self, col: impl AsRef<str>) -> Self {
        self.order_by(col, SortDirection::Desc)
    }

    /// Full form with NULLS FIRST/LAST placement.
    pub fn order_by_nulls(
        mut self,
        col: impl AsRef<str>,
        direction: SortDirection,
        nulls: NullsOrder,
    ) -> Self {
        self.orders.push(OrderItem {
            target: OrderTarget::Column(Ref::parse(col.as_ref())),
            direction,
            nulls,
        });
        self
    }

    pub fn order_by_raw(mut self, raw: impl Into<Raw>) -> Self {
        self.orders.push(OrderItem {
            target: OrderTarget::Raw(raw.into()),
            direction: SortDirection::Asc,
            nulls: NullsOrder::Default,
        });
        self
    }

    /// The compiler rejects negative values.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(LimitClause {
            value: n,
            skip_binding: false,
        });
        self
    }

    /// Limit inlined as a literal instead of a bound placeholder, for
    /// dialects that disallow a binding in that position.
    pub fn limit_literal(mut self, n: i64) -> Self {
        self.limit = Some(LimitClause {
            value: n,
            skip_binding: true,
        });
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(LimitClause {
            value: n,
            skip_binding: false,
        });
        self
    }

    pub fn offset_literal(mut self, n: i64) -> Self {
        self.offset = Some(LimitClause {
            value: n,
            skip_binding: true,
        });
        self
    }
}
