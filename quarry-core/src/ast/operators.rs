//! Comparison operators.

use serde::{Deserialize, Serialize};

/// The closed, validated operator set. Anything outside it becomes
/// `Operator::Verbatim` and is emitted exactly as the caller wrote it,
/// at the caller's own risk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    Like,
    ILike,
    In,
    NotIn,
    Between,
    Is,
    IsNot,
    Verbatim(String),
}

impl Operator {
    /// Parse an operator string. `<>` and `!=` both normalize to `Ne`;
    /// word operators are matched case-insensitively.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "=" => Operator::Eq,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "<>" | "!=" => Operator::Ne,
            "like" => Operator::Like,
            "ilike" => Operator::ILike,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "between" => Operator::Between,
            "is" => Operator::Is,
            "is not" => Operator::IsNot,
            _ => Operator::Verbatim(trimmed.to_string()),
        }
    }

    pub fn as_sql(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Ne => "<>",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Between => "between",
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::Verbatim(op) => op,
        }
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        Operator::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_operators() {
        assert_eq!(Operator::parse("="), Operator::Eq);
        assert_eq!(Operator::parse("!="), Operator::Ne);
        assert_eq!(Operator::parse("<>"), Operator::Ne);
        assert_eq!(Operator::parse("ILIKE"), Operator::ILike);
        assert_eq!(Operator::parse("not in"), Operator::NotIn);
    }

    #[test]
    fn test_unknown_operator_is_verbatim() {
        assert_eq!(
            Operator::parse("@>"),
            Operator::Verbatim("@>".to_string())
        );
    }
}
