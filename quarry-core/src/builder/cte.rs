//! Common table expression builder methods.

use crate::ast::{Cte, CteBody, Materialization, Query, Raw};

impl Query {
    fn add_cte(
        mut self,
        name: impl Into<String>,
        columns: Vec<String>,
        body: CteBody,
        recursive: bool,
        materialization: Materialization,
    ) -> Self {
        self.ctes.push(Cte {
            name: name.into(),
            columns,
            body,
            recursive,
            materialization,
        });
        self
    }

    /// `WITH <alias> AS (<body>)`.
    pub fn with(self, alias: impl Into<String>, body: Query) -> Self {
        self.add_cte(
            alias,
            vec![],
            CteBody::Query(Box::new(body)),
            false,
            Materialization::Default,
        )
    }

    /// CTE whose alias carries an explicit column list.
    pub fn with_columns<I, S>(self, alias: impl Into<String>, columns: I, body: Query) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_cte(
            alias,
            columns.into_iter().map(|c| c.as_ref().to_string()).collect(),
            CteBody::Query(Box::new(body)),
            false,
            Materialization::Default,
        )
    }

    pub fn with_recursive<I, S>(self, alias: impl Into<String>, columns: I, body: Query) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_cte(
            alias,
            columns.into_iter().map(|c| c.as_ref().to_string()).collect(),
            CteBody::Query(Box::new(body)),
            true,
            Materialization::Default,
        )
    }

    pub fn with_materialized(self, alias: impl Into<String>, body: Query) -> Self {
        self.add_cte(
            alias,
            vec![],
            CteBody::Query(Box::new(body)),
            false,
            Materialization::Materialized,
        )
    }

    pub fn with_not_materialized(self, alias: impl Into<String>, body: Query) -> Self {
        self.add_cte(
            alias,
            vec![],
            CteBody::Query(Box::new(body)),
            false,
            Materialization::NotMaterialized,
        )
    }

    pub fn with_raw(self, alias: impl Into<String>, raw: impl Into<Raw>) -> Self {
        self.add_cte(
            alias,
            vec![],
            CteBody::Raw(raw.into()),
            false,
            Materialization::Default,
        )
    }
}
