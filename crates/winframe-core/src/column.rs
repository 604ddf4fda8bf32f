//! Columnar value storage.
//!
//! A [`Column`] is a typed, owned vector of [`Value`]s. Operators write into
//! caller-owned columns at explicit offsets, which lets one output batch be
//! assembled from several partition slices without intermediate copies.

use crate::error::{CoreError, CoreResult};
use crate::types::{DataType, Value};

/// A typed column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The declared type of every non-null value.
    data_type: DataType,
    /// The values in row order.
    values: Vec<Value>,
}

impl Column {
    /// Creates an empty column.
    #[must_use]
    pub const fn new(data_type: DataType) -> Self {
        Self { data_type, values: Vec::new() }
    }

    /// Creates a column of `len` nulls.
    #[must_use]
    pub fn nulls(data_type: DataType, len: usize) -> Self {
        Self { data_type, values: vec![Value::Null; len] }
    }

    /// Creates a column from values, checking each against `data_type`.
    pub fn from_values(data_type: DataType, values: Vec<Value>) -> CoreResult<Self> {
        if let Some(bad) = values.iter().find(|v| !v.is_compatible_with(data_type)) {
            return Err(CoreError::type_mismatch_with_value(data_type.name(), bad.type_name(), bad));
        }
        Ok(Self { data_type, values })
    }

    /// Returns the column type.
    #[inline]
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the number of values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column holds no values.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns all values.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Overwrites the value at `index`.
    pub fn set(&mut self, index: usize, value: Value) -> CoreResult<()> {
        if !value.is_compatible_with(self.data_type) {
            return Err(CoreError::type_mismatch_with_value(
                self.data_type.name(),
                value.type_name(),
                &value,
            ));
        }
        let len = self.values.len();
        let slot = self.values.get_mut(index).ok_or(CoreError::IndexOutOfBounds { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Appends a value.
    pub fn push(&mut self, value: Value) -> CoreResult<()> {
        if !value.is_compatible_with(self.data_type) {
            return Err(CoreError::type_mismatch_with_value(
                self.data_type.name(),
                value.type_name(),
                &value,
            ));
        }
        self.values.push(value);
        Ok(())
    }

    /// Grows or shrinks the column to `len`, filling new slots with null.
    pub fn resize(&mut self, len: usize) {
        self.values.resize(len, Value::Null);
    }

    /// Shortens the column to `len` values.
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    /// Copies `num_rows` values of `source` starting at `source_offset` into
    /// this column starting at `result_offset`, growing it if needed.
    pub fn copy_from(
        &mut self,
        source: &Self,
        source_offset: usize,
        num_rows: usize,
        result_offset: usize,
    ) -> CoreResult<()> {
        if source.data_type != self.data_type {
            return Err(CoreError::type_mismatch(self.data_type.name(), source.data_type.name()));
        }
        let source_end = source_offset + num_rows;
        if source_end > source.len() {
            return Err(CoreError::IndexOutOfBounds { index: source_end, len: source.len() });
        }
        if self.values.len() < result_offset + num_rows {
            self.resize(result_offset + num_rows);
        }
        self.values[result_offset..result_offset + num_rows]
            .clone_from_slice(&source.values[source_offset..source_end]);
        Ok(())
    }

    /// Consumes the column and returns its values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
