//! Named windows and window-function projections.

use crate::ast::{Query, Ref, SelectItem, WindowDef};

impl Query {
    /// Define a named window, emitted in the WINDOW clause:
    /// `window(WindowDef::new("w").partition_by(["team"]).order_by("score", Desc))`.
    pub fn window(mut self, def: WindowDef) -> Self {
        self.windows.push(def);
        self
    }

    /// Project a window-function call over a named window:
    /// `select_window("sum", ["amount"], "w", "running_total")` renders
    /// `sum("amount") over "w" as "running_total"`.
    pub fn select_window<I, S>(
        mut self,
        func: impl Into<String>,
        args: I,
        over: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns.push(SelectItem::Window {
            func: func.into(),
            args: args.into_iter().map(|a| Ref::parse(a.as_ref())).collect(),
            over: over.into(),
            alias: alias.into(),
        });
        self
    }
}
