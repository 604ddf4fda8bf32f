//! Plan-level description of a window operator.
//!
//! A [`WindowNode`] is produced by upstream planning with every expression
//! already bound to an input channel or a constant. The operator compiles it
//! once at construction time.

use std::sync::Arc;

use winframe_core::{DataType, Field, Schema, Value};

use crate::function::WindowFunctionArg;

/// One ORDER BY key of the window specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    /// Input channel of the key.
    pub channel: usize,
    /// Ascending order.
    pub ascending: bool,
    /// Place NULLs before non-null values.
    pub nulls_first: bool,
}

impl SortKey {
    /// Ascending key with NULLs last.
    #[must_use]
    pub const fn asc(channel: usize) -> Self {
        Self { channel, ascending: true, nulls_first: false }
    }

    /// Descending key with NULLs first.
    #[must_use]
    pub const fn desc(channel: usize) -> Self {
        Self { channel, ascending: false, nulls_first: true }
    }

    /// Overrides NULL placement.
    #[must_use]
    pub const fn nulls_first(mut self, nulls_first: bool) -> Self {
        self.nulls_first = nulls_first;
        self
    }
}

/// Framing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// Frames count physical rows.
    Rows,
    /// Frames count peer groups.
    Range,
}

/// Kind of one frame bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// UNBOUNDED PRECEDING
    UnboundedPreceding,
    /// K PRECEDING
    Preceding,
    /// CURRENT ROW
    CurrentRow,
    /// K FOLLOWING
    Following,
    /// UNBOUNDED FOLLOWING
    UnboundedFollowing,
}

impl BoundKind {
    /// Returns true for bounds that carry an offset.
    #[must_use]
    pub const fn has_offset(self) -> bool {
        matches!(self, Self::Preceding | Self::Following)
    }
}

/// The offset expression of a K PRECEDING/FOLLOWING bound.
#[derive(Debug, Clone, PartialEq)]
pub enum OffsetExpr {
    /// A literal offset.
    Constant {
        /// Declared type of the literal.
        data_type: DataType,
        /// The literal value.
        value: Value,
    },
    /// An offset read per row from an input column.
    Column {
        /// Declared type of the column.
        data_type: DataType,
        /// Input channel.
        channel: usize,
    },
}

impl OffsetExpr {
    /// A BIGINT literal offset.
    #[must_use]
    pub const fn constant(value: i64) -> Self {
        Self::Constant { data_type: DataType::BigInt, value: Value::Int(value) }
    }

    /// A BIGINT column offset.
    #[must_use]
    pub const fn column(channel: usize) -> Self {
        Self::Column { data_type: DataType::BigInt, channel }
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Constant { data_type, .. } | Self::Column { data_type, .. } => *data_type,
        }
    }
}

/// One side of a frame: a bound kind plus an optional offset.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBound {
    /// The bound kind.
    pub kind: BoundKind,
    /// Offset for K PRECEDING/FOLLOWING.
    pub value: Option<OffsetExpr>,
}

impl FrameBound {
    /// UNBOUNDED PRECEDING
    #[must_use]
    pub const fn unbounded_preceding() -> Self {
        Self { kind: BoundKind::UnboundedPreceding, value: None }
    }

    /// UNBOUNDED FOLLOWING
    #[must_use]
    pub const fn unbounded_following() -> Self {
        Self { kind: BoundKind::UnboundedFollowing, value: None }
    }

    /// CURRENT ROW
    #[must_use]
    pub const fn current_row() -> Self {
        Self { kind: BoundKind::CurrentRow, value: None }
    }

    /// K PRECEDING
    #[must_use]
    pub const fn preceding(offset: OffsetExpr) -> Self {
        Self { kind: BoundKind::Preceding, value: Some(offset) }
    }

    /// K FOLLOWING
    #[must_use]
    pub const fn following(offset: OffsetExpr) -> Self {
        Self { kind: BoundKind::Following, value: Some(offset) }
    }
}

/// An uncompiled `ROWS|RANGE BETWEEN start AND end` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDefinition {
    /// ROWS or RANGE.
    pub mode: FrameMode,
    /// Frame start.
    pub start: FrameBound,
    /// Frame end.
    pub end: FrameBound,
}

impl FrameDefinition {
    /// `ROWS BETWEEN start AND end`
    #[must_use]
    pub const fn rows(start: FrameBound, end: FrameBound) -> Self {
        Self { mode: FrameMode::Rows, start, end }
    }

    /// `RANGE BETWEEN start AND end`
    #[must_use]
    pub const fn range(start: FrameBound, end: FrameBound) -> Self {
        Self { mode: FrameMode::Range, start, end }
    }
}

impl Default for FrameDefinition {
    /// `RANGE BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW`
    fn default() -> Self {
        Self::range(FrameBound::unbounded_preceding(), FrameBound::current_row())
    }
}

/// One window function of the node.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFunctionCall {
    /// Registered function name.
    pub name: String,
    /// Bound arguments.
    pub args: Vec<WindowFunctionArg>,
    /// Result type.
    pub result_type: DataType,
    /// IGNORE NULLS was specified.
    pub ignore_nulls: bool,
    /// The frame clause.
    pub frame: FrameDefinition,
    /// Output column name.
    pub alias: String,
}

impl WindowFunctionCall {
    /// Creates a call with the default frame and RESPECT NULLS.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        args: Vec<WindowFunctionArg>,
        result_type: DataType,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            args,
            result_type,
            ignore_nulls: false,
            frame: FrameDefinition::default(),
            alias: alias.into(),
        }
    }

    /// Sets the frame clause.
    #[must_use]
    pub fn with_frame(mut self, frame: FrameDefinition) -> Self {
        self.frame = frame;
        self
    }

    /// Sets IGNORE NULLS.
    #[must_use]
    pub fn ignore_nulls(mut self, ignore_nulls: bool) -> Self {
        self.ignore_nulls = ignore_nulls;
        self
    }
}

/// The window operator's plan node.
#[derive(Debug, Clone)]
pub struct WindowNode {
    /// Schema of the input rows.
    pub input_schema: Arc<Schema>,
    /// PARTITION BY channels.
    pub partition_keys: Vec<usize>,
    /// ORDER BY keys.
    pub sort_keys: Vec<SortKey>,
    /// Window functions, in output column order.
    pub functions: Vec<WindowFunctionCall>,
}

impl WindowNode {
    /// Creates a node without functions.
    #[must_use]
    pub fn new(input_schema: Arc<Schema>) -> Self {
        Self {
            input_schema,
            partition_keys: Vec::new(),
            sort_keys: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Sets the PARTITION BY channels.
    #[must_use]
    pub fn partition_by(mut self, channels: Vec<usize>) -> Self {
        self.partition_keys = channels;
        self
    }

    /// Sets the ORDER BY keys.
    #[must_use]
    pub fn order_by(mut self, keys: Vec<SortKey>) -> Self {
        self.sort_keys = keys;
        self
    }

    /// Adds a window function.
    #[must_use]
    pub fn with_function(mut self, function: WindowFunctionCall) -> Self {
        self.functions.push(function);
        self
    }

    /// Returns the input fields followed by one field per function.
    #[must_use]
    pub fn output_schema(&self) -> Schema {
        self.functions.iter().fold(self.input_schema.as_ref().clone(), |schema, f| {
            schema.with_field(Field::new(&f.alias, f.result_type))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_is_range_to_current_row() {
        let frame = FrameDefinition::default();
        assert_eq!(frame.mode, FrameMode::Range);
        assert_eq!(frame.start.kind, BoundKind::UnboundedPreceding);
        assert_eq!(frame.end.kind, BoundKind::CurrentRow);
    }

    #[test]
    fn output_schema_appends_function_columns() {
        let input = Arc::new(Schema::new(vec![Field::new("x", DataType::BigInt)]));
        let node = WindowNode::new(input)
            .with_function(WindowFunctionCall::new("row_number", vec![], DataType::BigInt, "rn"));
        let schema = node.output_schema();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.index_of("rn"), Some(1));
    }
}
