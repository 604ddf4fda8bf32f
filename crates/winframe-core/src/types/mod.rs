//! Core data types.

mod data_type;
mod value;

pub use data_type::DataType;
pub use value::{compare_sql, Value};
