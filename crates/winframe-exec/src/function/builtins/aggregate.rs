//! Frame aggregates: `count`, `sum`, `min`, `max`.
//!
//! Each row aggregates the argument over its frame. When consecutive rows
//! share a frame start and the frame end does not move backwards, the
//! previous row's accumulator is extended instead of rebuilt, which keeps
//! growing frames (the default frame among them) linear in partition size.

use std::cmp::Ordering;
use std::sync::Arc;

use winframe_core::{compare_sql, Column, Value};

use super::{argument, ArgumentValues};
use crate::error::{WindowError, WindowResult};
use crate::function::traits::{WindowFrameBuffers, WindowFunction, WindowFunctionContext};
use crate::partition::WindowPartition;

/// Running state of one aggregate over a contiguous range of rows.
pub trait Accumulator: Default + std::fmt::Debug + Send {
    /// Adds one value.
    fn add(&mut self, function: &str, value: &Value) -> WindowResult<()>;

    /// Returns the aggregate of the values added so far. An accumulator with
    /// no values yields the empty-frame result.
    fn result(&self) -> Value;
}

/// `count()` / `count(x)`: number of non-null values.
#[derive(Debug, Default)]
pub struct Count(i64);

impl Accumulator for Count {
    fn add(&mut self, _function: &str, value: &Value) -> WindowResult<()> {
        if !value.is_null() {
            self.0 += 1;
        }
        Ok(())
    }

    fn result(&self) -> Value {
        Value::Int(self.0)
    }
}

/// `sum(x)`: integer sums fail on overflow.
#[derive(Debug, Default)]
pub enum Sum {
    /// No non-null value yet.
    #[default]
    Empty,
    /// Integer sum.
    Int(i64),
    /// Floating point sum.
    Float(f64),
}

impl Accumulator for Sum {
    fn add(&mut self, function: &str, value: &Value) -> WindowResult<()> {
        *self = match (&*self, value) {
            (_, Value::Null) => return Ok(()),
            (Self::Empty, Value::Int(v)) => Self::Int(*v),
            (Self::Empty, Value::Float(v)) => Self::Float(*v),
            (Self::Int(acc), Value::Int(v)) => Self::Int(
                acc.checked_add(*v)
                    .ok_or_else(|| WindowError::Overflow { function: function.to_string() })?,
            ),
            (Self::Float(acc), Value::Float(v)) => Self::Float(acc + v),
            (_, other) => {
                return Err(WindowError::InvalidArgument {
                    function: function.to_string(),
                    reason: format!("cannot sum {}", other.type_name()),
                })
            }
        };
        Ok(())
    }

    fn result(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Int(v) => Value::Int(*v),
            Self::Float(v) => Value::Float(*v),
        }
    }
}

/// `min(x)` (`MAX = false`) and `max(x)` (`MAX = true`).
#[derive(Debug, Default)]
pub struct Extreme<const MAX: bool>(Option<Value>);

impl<const MAX: bool> Accumulator for Extreme<MAX> {
    fn add(&mut self, _function: &str, value: &Value) -> WindowResult<()> {
        if value.is_null() {
            return Ok(());
        }
        let wanted = if MAX { Ordering::Greater } else { Ordering::Less };
        match &self.0 {
            Some(current) if compare_sql(value, current, false) != wanted => {}
            _ => self.0 = Some(value.clone()),
        }
        Ok(())
    }

    fn result(&self) -> Value {
        self.0.clone().unwrap_or_default()
    }
}

/// A frame aggregate built on an [`Accumulator`].
#[derive(Debug)]
pub struct AggregateFunction<A> {
    name: &'static str,
    argument: ArgumentValues,
    /// Frame start, one past the last accumulated row, and the accumulator.
    running: Option<(usize, usize, A)>,
}

impl<A: Accumulator> AggregateFunction<A> {
    fn new(name: &'static str, argument: ArgumentValues) -> Self {
        Self { name, argument, running: None }
    }

    fn aggregate(&mut self, start: usize, end: usize) -> WindowResult<Value> {
        let (next, mut acc) = match self.running.take() {
            Some((s, next, acc)) if s == start && next <= end + 1 => (next, acc),
            _ => (start, A::default()),
        };
        for row in next..=end {
            acc.add(self.name, self.argument.get(row))?;
        }
        let value = acc.result();
        self.running = Some((start, end + 1, acc));
        Ok(value)
    }
}

impl<A: Accumulator> WindowFunction for AggregateFunction<A> {
    fn reset_partition(&mut self, partition: Arc<dyn WindowPartition>) -> WindowResult<()> {
        self.running = None;
        self.argument.load(partition.as_ref())
    }

    fn apply(
        &mut self,
        frames: &WindowFrameBuffers<'_>,
        result_offset: usize,
        result: &mut Column,
    ) -> WindowResult<()> {
        for i in 0..frames.num_rows() {
            let value = match frames.frame(i) {
                Some((start, end)) => self.aggregate(start, end)?,
                None => A::default().result(),
            };
            result.set(result_offset + i, value)?;
        }
        Ok(())
    }
}

fn build<A: Accumulator + 'static>(
    name: &'static str,
    ctx: &WindowFunctionContext<'_>,
) -> WindowResult<Box<dyn WindowFunction>> {
    let arg = argument(ctx, 0)?;
    Ok(Box::new(AggregateFunction::<A>::new(name, ArgumentValues::from_arg(arg))))
}

pub(super) fn count(ctx: &WindowFunctionContext<'_>) -> WindowResult<Box<dyn WindowFunction>> {
    if ctx.args.is_empty() {
        // count() counts rows: every row contributes one non-null value.
        return Ok(Box::new(AggregateFunction::<Count>::new(
            "count",
            ArgumentValues::Constant(Value::Bool(true)),
        )));
    }
    build::<Count>("count", ctx)
}

pub(super) fn sum(ctx: &WindowFunctionContext<'_>) -> WindowResult<Box<dyn WindowFunction>> {
    build::<Sum>("sum", ctx)
}

pub(super) fn min(ctx: &WindowFunctionContext<'_>) -> WindowResult<Box<dyn WindowFunction>> {
    build::<Extreme<false>>("min", ctx)
}

pub(super) fn max(ctx: &WindowFunctionContext<'_>) -> WindowResult<Box<dyn WindowFunction>> {
    build::<Extreme<true>>("max", ctx)
}

#[cfg(test)]
mod tests {
    use winframe_core::DataType;

    use super::super::test_support::{bigints, ints, run};
    use super::*;
    use crate::function::WindowFunctionArg;
    use crate::plan::{FrameBound, FrameDefinition, OffsetExpr};

    fn sliding(preceding: i64, following: i64) -> FrameDefinition {
        FrameDefinition::rows(
            FrameBound::preceding(OffsetExpr::constant(preceding)),
            FrameBound::following(OffsetExpr::constant(following)),
        )
    }

    fn aggregate(name: &str, frame: &FrameDefinition, values: Column, batch: usize) -> Vec<Value> {
        let result_type = if name == "count" { DataType::BigInt } else { values.data_type() };
        let args = [WindowFunctionArg::column(values.data_type(), 1)];
        let keys = bigints(&(0..values.len() as i64).collect::<Vec<_>>());
        run(name, &args, result_type, false, frame, vec![keys, values], vec![0], batch)
    }

    #[test]
    fn running_sum_over_default_frame() {
        let result = aggregate("sum", &FrameDefinition::default(), bigints(&[1, 2, 3, 4]), 3);
        assert_eq!(result, [1, 3, 6, 10].map(Value::Int).to_vec());
    }

    #[test]
    fn sliding_sum_clamps_to_partition() {
        let result = aggregate("sum", &sliding(1, 1), bigints(&[1, 2, 3, 4]), 2);
        assert_eq!(result, [3, 6, 9, 7].map(Value::Int).to_vec());
    }

    #[test]
    fn empty_frames_yield_null_or_zero() {
        let frame = FrameDefinition::rows(
            FrameBound::preceding(OffsetExpr::constant(5)),
            FrameBound::preceding(OffsetExpr::constant(3)),
        );
        let values = bigints(&[10, 20, 30, 40]);
        assert_eq!(
            aggregate("sum", &frame, values.clone(), 4),
            vec![Value::Null, Value::Null, Value::Null, Value::Int(10)]
        );
        assert_eq!(
            aggregate("count", &frame, values, 4),
            [0, 0, 0, 1].map(Value::Int).to_vec()
        );
    }

    #[test]
    fn nulls_are_skipped() {
        let values = ints(&[None, Some(4), None, Some(1)]);
        let whole = FrameDefinition::rows(
            FrameBound::unbounded_preceding(),
            FrameBound::unbounded_following(),
        );
        assert_eq!(aggregate("count", &whole, values.clone(), 4), vec![Value::Int(2); 4]);
        assert_eq!(aggregate("min", &whole, values.clone(), 4), vec![Value::Int(1); 4]);
        assert_eq!(aggregate("max", &whole, values.clone(), 4), vec![Value::Int(4); 4]);
        assert_eq!(
            aggregate("sum", &FrameDefinition::default(), values, 4),
            vec![Value::Null, Value::Int(4), Value::Int(4), Value::Int(5)]
        );
    }

    #[test]
    fn count_star_counts_rows() {
        let keys = bigints(&[1, 1, 2]);
        let result = run(
            "count",
            &[],
            DataType::BigInt,
            false,
            &FrameDefinition::default(),
            vec![keys],
            vec![0],
            2,
        );
        assert_eq!(result, [2, 2, 3].map(Value::Int).to_vec());
    }

    #[test]
    fn integer_sum_overflow_is_an_error() {
        let mut sum = Sum::default();
        sum.add("sum", &Value::Int(i64::MAX)).expect("first");
        let err = sum.add("sum", &Value::Int(1)).expect_err("overflow");
        assert!(matches!(err, WindowError::Overflow { .. }));
    }

    #[test]
    fn double_sum() {
        let values = Column::from_values(
            DataType::Double,
            vec![Value::Float(0.5), Value::Float(1.5)],
        )
        .expect("doubles");
        let result = aggregate("sum", &FrameDefinition::default(), values, 1);
        assert_eq!(result, vec![Value::Float(0.5), Value::Float(2.0)]);
    }
}
