//! Frame value functions: `first_value`, `last_value`, `nth_value`.

use std::sync::Arc;

use winframe_core::{Column, Value};

use super::{argument, ArgumentValues};
use crate::error::{WindowError, WindowResult};
use crate::function::traits::{WindowFrameBuffers, WindowFunction, WindowFunctionContext};
use crate::partition::WindowPartition;

/// Which row of the frame a [`ValueFunction`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePosition {
    /// The first row.
    First,
    /// The last row.
    Last,
    /// The n-th row, counting from 1, with `n` taken from the offset argument.
    Nth,
}

/// Returns the argument at one row of each frame, or NULL if the frame is
/// empty or too short. With IGNORE NULLS only non-null values are counted.
#[derive(Debug)]
pub struct ValueFunction {
    name: &'static str,
    which: FramePosition,
    value: ArgumentValues,
    offset: Option<ArgumentValues>,
    ignore_nulls: bool,
    /// Partition row of the next row to be produced.
    partition_row: usize,
}

impl ValueFunction {
    fn pick(&self, start: usize, end: usize, n: usize) -> Value {
        let rows = start..=end;
        let found = match (self.which, self.ignore_nulls) {
            (FramePosition::Last, false) => Some(end),
            (FramePosition::Last, true) => rows.rev().find(|&r| !self.value.get(r).is_null()),
            (_, false) => start.checked_add(n - 1).filter(|&r| r <= end),
            (_, true) => rows.filter(|&r| !self.value.get(r).is_null()).nth(n - 1),
        };
        found.map(|r| self.value.get(r).clone()).unwrap_or_default()
    }

    /// Returns the 1-based position to read for partition row `row`, or
    /// `None` when the offset is NULL.
    fn position(&self, row: usize) -> WindowResult<Option<usize>> {
        let Some(offset) = &self.offset else {
            return Ok(Some(1));
        };
        match offset.get(row) {
            Value::Null => Ok(None),
            Value::Int(n) if *n >= 1 => Ok(Some(usize::try_from(*n).unwrap_or(usize::MAX))),
            other => Err(WindowError::InvalidArgument {
                function: self.name.to_string(),
                reason: format!("offset must be at least 1, got {other}"),
            }),
        }
    }
}

impl WindowFunction for ValueFunction {
    fn reset_partition(&mut self, partition: Arc<dyn WindowPartition>) -> WindowResult<()> {
        self.partition_row = 0;
        self.value.load(partition.as_ref())?;
        if let Some(offset) = &mut self.offset {
            offset.load(partition.as_ref())?;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        frames: &WindowFrameBuffers<'_>,
        result_offset: usize,
        result: &mut Column,
    ) -> WindowResult<()> {
        for i in 0..frames.num_rows() {
            let value = match (frames.frame(i), self.position(self.partition_row + i)?) {
                (Some((start, end)), Some(n)) => self.pick(start, end, n),
                _ => Value::Null,
            };
            result.set(result_offset + i, value)?;
        }
        self.partition_row += frames.num_rows();
        Ok(())
    }
}

fn build(
    name: &'static str,
    which: FramePosition,
    ctx: &WindowFunctionContext<'_>,
) -> WindowResult<Box<dyn WindowFunction>> {
    let value = ArgumentValues::from_arg(argument(ctx, 0)?);
    let offset = if which == FramePosition::Nth {
        let arg = argument(ctx, 1)?;
        if let Some(Value::Int(n)) = arg.constant_value() {
            if *n < 1 {
                return Err(WindowError::InvalidArgument {
                    function: name.to_string(),
                    reason: format!("offset must be at least 1, got {n}"),
                });
            }
        }
        Some(ArgumentValues::from_arg(arg))
    } else {
        None
    };
    Ok(Box::new(ValueFunction {
        name,
        which,
        value,
        offset,
        ignore_nulls: ctx.ignore_nulls,
        partition_row: 0,
    }))
}

pub(super) fn first_value(
    ctx: &WindowFunctionContext<'_>,
) -> WindowResult<Box<dyn WindowFunction>> {
    build("first_value", FramePosition::First, ctx)
}

pub(super) fn last_value(
    ctx: &WindowFunctionContext<'_>,
) -> WindowResult<Box<dyn WindowFunction>> {
    build("last_value", FramePosition::Last, ctx)
}

pub(super) fn nth_value(
    ctx: &WindowFunctionContext<'_>,
) -> WindowResult<Box<dyn WindowFunction>> {
    build("nth_value", FramePosition::Nth, ctx)
}
