//! DML builder methods: insert, update, delete, upsert, returning.

use crate::ast::{
    ConflictAction, InsertData, OnConflict, Query, QueryKind, Ref, SelectItem, Value,
};

impl Query {
    /// Insert a single row of `(column, value)` pairs.
    pub fn insert<I, S, V>(self, row: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<Value>,
    {
        self.insert_rows(std::iter::once(row))
    }

    /// Insert many rows. Column sets may differ between rows; the compiled
    /// statement uses the union of columns in first-seen order, and cells a
    /// row never mentioned compile to NULL only when the NULL-fill policy
    /// allows it.
    pub fn insert_rows<O, I, S, V>(mut self, rows: O) -> Self
    where
        O: IntoIterator<Item = I>,
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<Value>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut raw_rows: Vec<Vec<(String, Value)>> = Vec::new();
        for row in rows {
            let pairs: Vec<(String, Value)> = row
                .into_iter()
                .map(|(c, v)| (c.as_ref().to_string(), v.into()))
                .collect();
            for (c, _) in &pairs {
                if !columns.contains(c) {
                    columns.push(c.clone());
                }
            }
            raw_rows.push(pairs);
        }
        let aligned = raw_rows
            .into_iter()
            .map(|mut pairs| {
                columns
                    .iter()
                    .map(|col| {
                        pairs
                            .iter()
                            .position(|(c, _)| c == col)
                            .map(|i| pairs.swap_remove(i).1)
                    })
                    .collect()
            })
            .collect();
        self.kind = QueryKind::Insert;
        self.insert = Some(InsertData {
            columns,
            rows: aligned,
        });
        self
    }

    /// Insert relying on backend defaults for every column.
    pub fn insert_default_values(mut self) -> Self {
        self.kind = QueryKind::Insert;
        self.insert = Some(InsertData::default());
        self
    }

    /// Turn the builder into an UPDATE with the given assignments.
    pub fn update<I, S, V>(mut self, assignments: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<Value>,
    {
        self.kind = QueryKind::Update;
        for (c, v) in assignments {
            self.push_assignment(c.as_ref(), v);
        }
        self
    }

    /// Single UPDATE assignment; chainable.
    pub fn set(mut self, column: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.kind = QueryKind::Update;
        self.push_assignment(column.as_ref(), value);
        self
    }

    /// Assign only when `Some`; a `None` leaves the column untouched.
    pub fn set_opt<T>(self, column: impl AsRef<str>, value: Option<T>) -> Self
    where
        T: Into<Value>,
    {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Turn the builder into a DELETE.
    pub fn del(mut self) -> Self {
        self.kind = QueryKind::Delete;
        self
    }

    /// RETURNING columns; `*` returns the whole row. Dialects without
    /// RETURNING fall back to affected-rows / last-insert-id responses.
    pub fn returning<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.returning = Some(
            cols.into_iter()
                .map(|c| SelectItem::Column(Ref::parse(c.as_ref())))
                .collect(),
        );
        self
    }

    pub fn returning_all(mut self) -> Self {
        self.returning = Some(vec![SelectItem::Column(Ref::column("*"))]);
        self
    }

    /// Start an ON CONFLICT clause over the given target columns.
    pub fn on_conflict<I, S>(self, cols: I) -> OnConflictBuilder
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        OnConflictBuilder {
            query: self,
            columns: cols.into_iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Insert-or-merge on the given conflict target.
    pub fn upsert<I, S, V, C, CS>(self, row: I, conflict_cols: C) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<Value>,
        C: IntoIterator<Item = CS>,
        CS: AsRef<str>,
    {
        self.insert(row).on_conflict(conflict_cols).merge_all()
    }
}

/// Second half of `on_conflict(...)`: pick merge or ignore.
#[derive(Debug)]
pub struct OnConflictBuilder {
    query: Query,
    columns: Vec<String>,
}

impl OnConflictBuilder {
    /// DO UPDATE SET over every inserted column outside the conflict target.
    pub fn merge_all(mut self) -> Query {
        self.query.on_conflict = Some(OnConflict {
            columns: self.columns,
            action: ConflictAction::Merge(None),
        });
        self.query
    }

    /// DO UPDATE SET over an explicit column list.
    pub fn merge<I, S>(mut self, cols: I) -> Query
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query.on_conflict = Some(OnConflict {
            columns: self.columns,
            action: ConflictAction::Merge(Some(
                cols.into_iter().map(|c| c.as_ref().to_string()).collect(),
            )),
        });
        self.query
    }

    /// DO NOTHING.
    pub fn ignore(mut self) -> Query {
        self.query.on_conflict = Some(OnConflict {
            columns: self.columns,
            action: ConflictAction::Ignore,
        });
        self.query
    }
}
