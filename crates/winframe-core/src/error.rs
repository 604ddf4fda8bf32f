//! Error types for the core crate.

use thiserror::Error;

/// Maximum length for value display in error messages.
const MAX_VALUE_DISPLAY_LEN: usize = 100;

/// Errors that can occur when building or mutating columns and batches.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A value type mismatch occurred.
    #[error("type mismatch: expected {expected}, got {actual}{}", value.as_ref().map(|v| format!(" (value: {v})")).unwrap_or_default())]
    TypeMismatch {
        /// The expected type.
        expected: String,
        /// The actual type.
        actual: String,
        /// The value that caused the mismatch (truncated for display).
        value: Option<String>,
    },

    /// A batch was built with the wrong number of columns.
    #[error("column count mismatch: schema has {expected} columns, got {actual}")]
    ColumnCountMismatch {
        /// Number of columns declared by the schema.
        expected: usize,
        /// Number of columns supplied.
        actual: usize,
    },

    /// A column length disagrees with the batch row count.
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        /// The column name.
        column: String,
        /// Expected row count.
        expected: usize,
        /// Actual row count.
        actual: usize,
    },

    /// A row or column index is outside the valid range.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The valid length.
        len: usize,
    },
}

impl CoreError {
    /// Creates a type mismatch error without a value.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch { expected: expected.into(), actual: actual.into(), value: None }
    }

    /// Creates a type mismatch error with a value for debugging.
    ///
    /// The value is truncated to 100 characters for display.
    #[must_use]
    pub fn type_mismatch_with_value(
        expected: impl Into<String>,
        actual: impl Into<String>,
        value: impl std::fmt::Display,
    ) -> Self {
        let value_str = value.to_string();
        let truncated = if value_str.chars().count() > MAX_VALUE_DISPLAY_LEN {
            let head: String = value_str.chars().take(MAX_VALUE_DISPLAY_LEN).collect();
            format!("{head}...")
        } else {
            value_str
        };
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
            value: Some(truncated),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
