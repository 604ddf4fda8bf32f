//! Logical column types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The logical type of a column.
///
/// `Integer` and `BigInt` share the [`Value::Int`](super::Value::Int)
/// representation; they differ only in declared width, which matters for
/// row size estimation and for signature matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// BOOLEAN
    Boolean,
    /// 32-bit INTEGER
    Integer,
    /// 64-bit BIGINT
    BigInt,
    /// 64-bit floating point DOUBLE
    Double,
    /// Variable length UTF-8 string
    Varchar,
}

/// Byte estimate used for variable width values.
const VARCHAR_WIDTH_ESTIMATE: usize = 32;

impl DataType {
    /// Returns the estimated in-memory width of one value of this type.
    #[must_use]
    pub const fn fixed_width(self) -> usize {
        match self {
            Self::Boolean => 1,
            Self::Integer => 4,
            Self::BigInt | Self::Double => 8,
            Self::Varchar => VARCHAR_WIDTH_ESTIMATE,
        }
    }

    /// Returns true for the integral types usable as frame offsets.
    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Integer | Self::BigInt)
    }

    /// Returns the SQL name of this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Varchar => "VARCHAR",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
