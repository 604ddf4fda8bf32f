//! Error types for window operator setup and execution.

use thiserror::Error;
use winframe_core::CoreError;

/// Errors that can occur while planning or running the window operator.
///
/// Setup errors ([`UnknownFunction`](Self::UnknownFunction),
/// [`NoMatchingSignature`](Self::NoMatchingSignature),
/// [`Unsupported`](Self::Unsupported), [`InvalidFrame`](Self::InvalidFrame))
/// are raised while the operator is constructed. Offset errors
/// ([`NullFrameOffset`](Self::NullFrameOffset),
/// [`NegativeFrameOffset`](Self::NegativeFrameOffset)) are raised while a
/// batch is produced and abort that batch. Empty or out-of-partition frames
/// are not errors; they are reported through the validity selector.
#[derive(Debug, Error)]
pub enum WindowError {
    /// No window function is registered under this name.
    #[error("window function not registered: {0}")]
    UnknownFunction(String),

    /// The function exists but no signature accepts the argument types.
    #[error("no matching signature for window function {name}: attempted {attempted}, candidates: {candidates}")]
    NoMatchingSignature {
        /// The function name.
        name: String,
        /// The attempted signature, e.g. `sum(VARCHAR)`.
        attempted: String,
        /// The registered signatures, comma separated.
        candidates: String,
    },

    /// A frame shape the operator does not implement.
    #[error("unsupported feature: {0}")]
    Unsupported(String),

    /// A malformed frame definition.
    #[error("invalid window frame: {0}")]
    InvalidFrame(String),

    /// A function argument is not usable by the function.
    #[error("invalid argument for window function {function}: {reason}")]
    InvalidArgument {
        /// The function name.
        function: String,
        /// Why the argument was rejected.
        reason: String,
    },

    /// A column channel outside the input schema.
    #[error("input channel {channel} out of range for {num_columns} input columns")]
    InvalidChannel {
        /// The requested channel.
        channel: usize,
        /// Number of input columns.
        num_columns: usize,
    },

    /// A K PRECEDING/FOLLOWING offset value was null.
    #[error("Window frame offset must not be null")]
    NullFrameOffset,

    /// A K PRECEDING/FOLLOWING offset value was negative.
    #[error("Window frame {value} offset must not be negative")]
    NegativeFrameOffset {
        /// The offending offset.
        value: i64,
    },

    /// An integer aggregate overflowed.
    #[error("arithmetic overflow in window function {function}")]
    Overflow {
        /// The function name.
        function: String,
    },

    /// The operator was driven out of protocol order.
    #[error("invalid operator state: {0}")]
    InvalidState(String),

    /// A column or batch error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for window operations.
pub type WindowResult<T> = Result<T, WindowError>;
