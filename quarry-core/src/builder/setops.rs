//! Union-family set operations.

use crate::ast::{Query, Raw, SetOp, SetOpKind, SetOperand};

impl Query {
    /// General form; `wrap` parenthesizes the operand.
    pub fn set_op(mut self, kind: SetOpKind, operand: Query, wrap: bool) -> Self {
        self.set_ops.push(SetOp {
            kind,
            operand: SetOperand::Query(Box::new(operand)),
            wrap,
        });
        self
    }

    pub fn set_op_raw(mut self, kind: SetOpKind, raw: impl Into<Raw>, wrap: bool) -> Self {
        self.set_ops.push(SetOp {
            kind,
            operand: SetOperand::Raw(raw.into()),
            wrap,
        });
        self
    }

    pub fn union(self, operand: Query) -> Self {
        self.set_op(SetOpKind::Union, operand, false)
    }

    pub fn union_all(self, operand: Query) -> Self {
        self.set_op(SetOpKind::UnionAll, operand, false)
    }

    pub fn intersect(self, operand: Query) -> Self {
        self.set_op(SetOpKind::Intersect, operand, false)
    }

    pub fn except(self, operand: Query) -> Self {
        self.set_op(SetOpKind::Except, operand, false)
    }

    pub fn union_raw(self, raw: impl Into<Raw>) -> Self {
        self.set_op_raw(SetOpKind::Union, raw, false)
    }
}
