//! Built-in window functions.
//!
//! ## Ranking
//!
//! - `row_number()` - Position of the row in its partition
//! - `rank()` - Position of the row's peer group, with gaps
//! - `dense_rank()` - Position of the row's peer group, without gaps
//!
//! ## Frame aggregates
//!
//! - `count()`, `count(x)` - Rows, or non-null values, in the frame
//! - `sum(x)` - Sum of non-null values in the frame
//! - `min(x)`, `max(x)` - Smallest or largest non-null value in the frame
//!
//! ## Frame values
//!
//! - `first_value(x)`, `last_value(x)` - Value at the frame start or end
//! - `nth_value(x, n)` - Value at the n-th row of the frame

mod aggregate;
mod ranking;
mod value;

use winframe_core::{Column, DataType, Value};

use super::registry::WindowFunctionRegistry;
use super::signature::{ArgumentType, FunctionSignature, ReturnType};
use super::traits::{WindowFunctionArg, WindowFunctionContext};
use crate::error::{WindowError, WindowResult};
use crate::partition::WindowPartition;

/// Registers all built-in functions with the given registry.
pub fn register_builtins(registry: &mut WindowFunctionRegistry) {
    let bigint = ReturnType::Fixed(DataType::BigInt);
    let same = ReturnType::SameAsArgument(0);

    // Ranking
    registry.register(FunctionSignature::new("row_number", bigint), ranking::row_number);
    registry.register(FunctionSignature::new("rank", bigint), ranking::rank);
    registry.register(FunctionSignature::new("dense_rank", bigint), ranking::dense_rank);

    // Frame aggregates
    registry.register(FunctionSignature::new("count", bigint), aggregate::count);
    registry.register(
        FunctionSignature::new("count", bigint).with_argument(ArgumentType::Any),
        aggregate::count,
    );
    for (input, output) in [
        (DataType::Integer, DataType::BigInt),
        (DataType::BigInt, DataType::BigInt),
        (DataType::Double, DataType::Double),
    ] {
        registry.register(
            FunctionSignature::new("sum", ReturnType::Fixed(output))
                .with_argument(ArgumentType::Exact(input)),
            aggregate::sum,
        );
    }
    registry.register(
        FunctionSignature::new("min", same).with_argument(ArgumentType::Any),
        aggregate::min,
    );
    registry.register(
        FunctionSignature::new("max", same).with_argument(ArgumentType::Any),
        aggregate::max,
    );

    // Frame values
    registry.register(
        FunctionSignature::new("first_value", same).with_argument(ArgumentType::Any),
        value::first_value,
    );
    registry.register(
        FunctionSignature::new("last_value", same).with_argument(ArgumentType::Any),
        value::last_value,
    );
    for offset in [DataType::Integer, DataType::BigInt] {
        registry.register(
            FunctionSignature::new("nth_value", same)
                .with_argument(ArgumentType::Any)
                .with_argument(ArgumentType::Exact(offset)),
            value::nth_value,
        );
    }
}

static NULL: Value = Value::Null;

/// A function argument materialized for the current partition.
#[derive(Debug, Clone)]
pub(crate) enum ArgumentValues {
    /// The same value for every row.
    Constant(Value),
    /// The argument column of the whole partition.
    Column {
        /// Input channel.
        channel: usize,
        /// Values of the current partition.
        values: Column,
    },
}

impl ArgumentValues {
    fn from_arg(arg: &WindowFunctionArg) -> Self {
        match arg {
            WindowFunctionArg::Constant { value, .. } => Self::Constant(value.clone()),
            WindowFunctionArg::Column { data_type, channel } => {
                Self::Column { channel: *channel, values: Column::new(*data_type) }
            }
        }
    }

    /// Loads the values of `partition`.
    fn load(&mut self, partition: &dyn WindowPartition) -> WindowResult<()> {
        if let Self::Column { channel, values } = self {
            values.truncate(0);
            partition.extract_column(*channel, 0, partition.num_rows(), 0, values)?;
        }
        Ok(())
    }

    /// Returns the value of partition row `row`.
    fn get(&self, row: usize) -> &Value {
        match self {
            Self::Constant(value) => value,
            Self::Column { values, .. } => values.get(row).unwrap_or(&NULL),
        }
    }
}

/// Returns argument `index` of the call, or an error naming the function.
fn argument<'a>(
    ctx: &WindowFunctionContext<'a>,
    index: usize,
) -> WindowResult<&'a WindowFunctionArg> {
    ctx.args.get(index).ok_or_else(|| WindowError::InvalidArgument {
        function: ctx.name.to_lowercase(),
        reason: format!("missing argument {index}"),
    })
}
