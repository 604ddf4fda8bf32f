//! Window function infrastructure.
//!
//! Functions are registered in a [`WindowFunctionRegistry`] under one or more
//! [`FunctionSignature`]s, each paired with a factory. The operator creates one
//! [`WindowFunction`] instance per call in the plan; the instance is told about
//! every new partition and then fed consecutive slices of its rows together
//! with their peer and frame bounds ([`WindowFrameBuffers`]).

mod builtins;
mod registry;
mod signature;
mod traits;

pub use builtins::register_builtins;
pub use registry::WindowFunctionRegistry;
pub use signature::{format_call, ArgumentType, FunctionSignature, ReturnType};
pub use traits::{
    WindowFrameBuffers, WindowFunction, WindowFunctionArg, WindowFunctionContext,
    WindowFunctionFactory,
};
