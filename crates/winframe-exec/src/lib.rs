//! `winframe` Execution
//!
//! This crate implements a vectorized SQL window operator: it partitions and
//! orders its input, resolves each function's `ROWS`/`RANGE` frame for every
//! row, and evaluates pluggable window functions over those frames one output
//! batch at a time.
//!
//! # Modules
//!
//! - [`plan`] - The window node: partition keys, sort keys, calls and frames
//! - [`partition`] - Partition source contract and an in-memory sort build
//! - [`frame`] - Frame compilation, bound resolution and validity
//! - [`function`] - Function trait, signatures, registry and built-ins
//! - [`window`] - [`WindowOp`], the batch driver
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use winframe_core::{DataType, Field, RowBatch, Schema, Value};
//! use winframe_exec::{
//!     Operator, SortKey, WindowConfig, WindowFunctionCall, WindowFunctionRegistry, WindowNode,
//!     WindowOp,
//! };
//!
//! let schema = Arc::new(Schema::new(vec![
//!     Field::new("dept", DataType::Varchar),
//!     Field::new("salary", DataType::BigInt),
//! ]));
//! let node = WindowNode::new(Arc::clone(&schema))
//!     .partition_by(vec![0])
//!     .order_by(vec![SortKey::desc(1)])
//!     .with_function(WindowFunctionCall::new("rank", vec![], DataType::BigInt, "rnk"));
//!
//! let registry = WindowFunctionRegistry::with_builtins();
//! let mut op = WindowOp::new(&node, &registry, &WindowConfig::default()).unwrap();
//! op.add_input(
//!     RowBatch::from_rows(
//!         schema,
//!         vec![
//!             vec!["IT".into(), Value::Int(90)],
//!             vec!["IT".into(), Value::Int(120)],
//!             vec!["Sales".into(), Value::Int(100)],
//!         ],
//!     )
//!     .unwrap(),
//! )
//! .unwrap();
//! op.no_more_input().unwrap();
//!
//! let batch = op.get_output().unwrap().unwrap();
//! assert_eq!(batch.num_rows(), 3);
//! assert_eq!(batch.row_values(0), Some(vec!["IT".into(), Value::Int(120), Value::Int(1)]));
//! assert!(op.get_output().unwrap().is_none());
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod frame;
pub mod function;
pub mod operator;
pub mod partition;
pub mod plan;
pub mod window;

pub use config::WindowConfig;
pub use error::{WindowError, WindowResult};
pub use frame::{FrameChannelArg, FrameSide, PeerAndFrameBuffers, SelectivityVector, WindowFrame};
pub use function::{
    ArgumentType, FunctionSignature, ReturnType, WindowFrameBuffers, WindowFunction,
    WindowFunctionArg, WindowFunctionContext, WindowFunctionRegistry,
};
pub use operator::{BoxedOperator, Operator, OperatorState};
pub use partition::{SortWindowBuild, SortedPartition, WindowBuild, WindowPartition};
pub use plan::{
    BoundKind, FrameBound, FrameDefinition, FrameMode, OffsetExpr, SortKey, WindowFunctionCall,
    WindowNode,
};
pub use window::WindowOp;
