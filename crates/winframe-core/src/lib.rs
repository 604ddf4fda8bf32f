//! `winframe` Core
//!
//! This crate provides the in-memory columnar types consumed by the
//! `winframe` execution engine.
//!
//! # Overview
//!
//! - **Values**: [`Value`] scalar enum and [`DataType`] logical types
//! - **Columns**: [`Column`], a typed vector of values writable at offsets
//! - **Batches**: [`Schema`], [`Field`] and the columnar [`RowBatch`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use winframe_core::{DataType, Field, RowBatch, Schema, Value};
//!
//! let schema = Arc::new(Schema::new(vec![
//!     Field::new("dept", DataType::Varchar),
//!     Field::new("salary", DataType::BigInt),
//! ]));
//! let batch = RowBatch::from_rows(
//!     schema,
//!     vec![vec!["IT".into(), Value::Int(90)], vec!["Sales".into(), Value::Int(100)]],
//! )
//! .unwrap();
//!
//! assert_eq!(batch.num_rows(), 2);
//! assert_eq!(batch.column(1).and_then(|c| c.get(0)), Some(&Value::Int(90)));
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod batch;
pub mod column;
pub mod error;
pub mod types;

pub use batch::{Field, RowBatch, Schema};
pub use column::Column;
pub use error::{CoreError, CoreResult};
pub use types::{compare_sql, DataType, Value};
