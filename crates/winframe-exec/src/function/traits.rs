//! Window function trait and the types passed to it.

use std::sync::Arc;

use winframe_core::{Column, DataType, Value};

use crate::config::WindowConfig;
use crate::error::WindowResult;
use crate::frame::SelectivityVector;
use crate::partition::WindowPartition;

/// A bound argument of a window function call.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowFunctionArg {
    /// A literal.
    Constant {
        /// Declared type.
        data_type: DataType,
        /// The literal value.
        value: Value,
    },
    /// An input column.
    Column {
        /// Column type.
        data_type: DataType,
        /// Input channel.
        channel: usize,
    },
}

impl WindowFunctionArg {
    /// A literal argument typed after its value.
    #[must_use]
    pub fn constant(data_type: DataType, value: impl Into<Value>) -> Self {
        Self::Constant { data_type, value: value.into() }
    }

    /// An input column argument.
    #[must_use]
    pub const fn column(data_type: DataType, channel: usize) -> Self {
        Self::Column { data_type, channel }
    }

    /// Returns the argument type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Constant { data_type, .. } | Self::Column { data_type, .. } => *data_type,
        }
    }

    /// Returns the input channel of a column argument.
    #[must_use]
    pub const fn channel(&self) -> Option<usize> {
        match self {
            Self::Column { channel, .. } => Some(*channel),
            Self::Constant { .. } => None,
        }
    }

    /// Returns the value of a constant argument.
    #[must_use]
    pub const fn constant_value(&self) -> Option<&Value> {
        match self {
            Self::Constant { value, .. } => Some(value),
            Self::Column { .. } => None,
        }
    }
}

/// Peer and frame bounds of one slice of partition rows, as seen by one
/// function.
///
/// Index `i` describes the `i`-th row of the slice. Peer and frame bounds are
/// inclusive partition row indices. Frames of rows not selected in
/// `valid_frames` are empty and their bounds are meaningless; every selected
/// frame lies within the partition.
#[derive(Debug, Clone, Copy)]
pub struct WindowFrameBuffers<'a> {
    /// First row of each row's peer group.
    pub peer_starts: &'a [i64],
    /// Last row of each row's peer group.
    pub peer_ends: &'a [i64],
    /// First row of each row's frame.
    pub frame_starts: &'a [i64],
    /// Last row of each row's frame.
    pub frame_ends: &'a [i64],
    /// Rows whose frame is not empty.
    pub valid_frames: &'a SelectivityVector,
}

impl WindowFrameBuffers<'_> {
    /// Number of rows in the slice.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.peer_starts.len()
    }

    /// Returns the frame of row `i` as partition row indices, or `None` if it
    /// is empty.
    #[must_use]
    pub fn frame(&self, i: usize) -> Option<(usize, usize)> {
        if !self.valid_frames.is_valid(i) {
            return None;
        }
        let start = usize::try_from(*self.frame_starts.get(i)?).ok()?;
        let end = usize::try_from(*self.frame_ends.get(i)?).ok()?;
        (start <= end).then_some((start, end))
    }
}

/// Everything a factory needs to build a function instance.
#[derive(Debug, Clone, Copy)]
pub struct WindowFunctionContext<'a> {
    /// Name the function was requested under.
    pub name: &'a str,
    /// Bound arguments.
    pub args: &'a [WindowFunctionArg],
    /// Declared result type.
    pub result_type: DataType,
    /// IGNORE NULLS was specified.
    pub ignore_nulls: bool,
    /// Operator configuration.
    pub config: &'a WindowConfig,
}

/// Builds a function instance for one call.
pub type WindowFunctionFactory =
    fn(&WindowFunctionContext<'_>) -> WindowResult<Box<dyn WindowFunction>>;

/// A window function instance owned by one operator.
///
/// The operator calls [`reset_partition`](Self::reset_partition) once per
/// partition, then [`apply`](Self::apply) for consecutive slices of that
/// partition's rows in order.
pub trait WindowFunction: Send + std::fmt::Debug {
    /// Starts a new partition. Any per-partition state is discarded.
    fn reset_partition(&mut self, partition: Arc<dyn WindowPartition>) -> WindowResult<()>;

    /// Writes one result per row of `frames` into `result`, starting at
    /// `result_offset`.
    fn apply(
        &mut self,
        frames: &WindowFrameBuffers<'_>,
        result_offset: usize,
        result: &mut Column,
    ) -> WindowResult<()>;
}
