//! Query AST: the structured representation of a query before serialization.

pub mod expr;
pub mod join;
pub mod operators;
pub mod predicate;
pub mod query;
pub mod raw;
pub mod values;

pub use expr::{AggregateFunc, Ref, SelectItem, TableRef};
pub use join::{Join, JoinKind, JoinTarget, OnCondition, OnEntry};
pub use operators::Operator;
pub use predicate::{BoolOp, InList, Operand, Predicate, WhereEntry};
pub use query::{
    ColumnDef, ConflictAction, Cte, CteBody, FromTarget, GroupItem, InsertData, LimitClause,
    LockClause, LockStrength, Materialization, NullsOrder, OnConflict, OrderItem, OrderTarget,
    Query, QueryKind, QueryTimeout, SetOp, SetOpKind, SetOperand, SortDirection, TableDef,
    WindowDef,
};
pub use raw::{Raw, RawBindings};
pub use values::Value;
