//! Error types for quarry.

use thiserror::Error;

/// The constraint class a backend reported, normalized across dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ConstraintKind {
    NotNull,
    Unique,
    ForeignKey,
    Check,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintKind::NotNull => write!(f, "not-null"),
            ConstraintKind::Unique => write!(f, "unique"),
            ConstraintKind::ForeignKey => write!(f, "foreign-key"),
            ConstraintKind::Check => write!(f, "check"),
        }
    }
}

#[derive(Debug, Error)]
pub enum QuarryError {
    /// Invalid client name, pool option, or builder/adapter mismatch.
    #[error("configuration error: {0}")]
    Config(String),

    /// Acquire failure, create timeout, or validation failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// Acquire or statement timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Statement cancelled at the caller's request.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// The backend rejected the SQL text.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// NOT NULL, UNIQUE, FK or CHECK violation, normalized.
    #[error("{kind} constraint violation: {message}")]
    Constraint {
        kind: ConstraintKind,
        message: String,
    },

    /// Begin/commit/rollback failure, or an operation on a closed transaction.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// The sink reported an error or closed early.
    #[error("stream error: {0}")]
    Stream(String),

    /// The current dialect cannot express the requested feature.
    #[error("dialect '{dialect}' does not support {feature}")]
    Unsupported {
        dialect: &'static str,
        feature: String,
    },

    /// A driver error that no dialect transformer recognized.
    #[error("driver error: {0}")]
    Driver(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuarryError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    pub fn unsupported(dialect: &'static str, feature: impl Into<String>) -> Self {
        Self::Unsupported {
            dialect,
            feature: feature.into(),
        }
    }

    /// Decorate the error message with the SQL that was executing when it
    /// surfaced. Used by the runner when `compile_sql_on_error` is enabled.
    pub fn with_sql(self, sql: &str) -> Self {
        let decorate = |message: String| format!("{message} - while executing: {sql}");
        match self {
            Self::Config(m) => Self::Config(decorate(m)),
            Self::Connection(m) => Self::Connection(decorate(m)),
            Self::Timeout(m) => Self::Timeout(decorate(m)),
            Self::Cancelled(m) => Self::Cancelled(decorate(m)),
            Self::Syntax(m) => Self::Syntax(decorate(m)),
            Self::Constraint { kind, message } => Self::Constraint {
                kind,
                message: decorate(message),
            },
            Self::Transaction(m) => Self::Transaction(decorate(m)),
            Self::Stream(m) => Self::Stream(decorate(m)),
            Self::Driver(m) => Self::Driver(decorate(m)),
            other @ (Self::Unsupported { .. } | Self::Io(_)) => other,
        }
    }
}

/// Result type alias for quarry operations.
pub type QuarryResult<T> = Result<T, QuarryError>;
