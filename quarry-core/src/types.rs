//! Logical column types for schema DDL.
//!
//! The closed set the dialect type mapping operates over. Each dialect turns
//! these into the column-declaration string its backend expects.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Auto-incrementing 32-bit primary key.
    Increments,
    /// Auto-incrementing 64-bit primary key.
    BigIncrements,
    Integer,
    TinyInt,
    SmallInt,
    MediumInt,
    BigInteger,
    Text,
    /// Varchar with a maximum length.
    String(u32),
    Float,
    Double,
    /// Precision and scale.
    Decimal(u8, u8),
    Boolean,
    Date,
    DateTime,
    Time,
    Timestamp,
    Geometry,
    Geography,
    Point,
    Binary(u32),
    /// Enumerated values; emitted as a check constraint where the backend
    /// has no native enum type.
    Enum(Vec<String>),
    Json,
    Jsonb,
    Uuid,
}
