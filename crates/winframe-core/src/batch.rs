//! Schemas and columnar row batches.
//!
//! This module defines the [`RowBatch`] type used as the unit of data
//! flowing into and out of execution operators.

use std::collections::HashMap;
use std::sync::Arc;

use crate::column::Column;
use crate::error::{CoreError, CoreResult};
use crate::types::{DataType, Value};

/// A named, typed column slot in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name (shared to avoid cloning).
    name: Arc<str>,
    /// Column type.
    data_type: DataType,
}

impl Field {
    /// Creates a new field.
    #[must_use]
    pub fn new(name: impl AsRef<str>, data_type: DataType) -> Self {
        Self { name: Arc::from(name.as_ref()), data_type }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// A schema defines the column names, types and their order in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Fields in order.
    fields: Vec<Field>,
    /// Map from column name to index for fast lookup.
    name_to_index: HashMap<Arc<str>, usize>,
}

impl Schema {
    /// Creates a new schema from fields.
    #[must_use]
    pub fn new(fields: Vec<Field>) -> Self {
        let name_to_index =
            fields.iter().enumerate().map(|(i, f)| (Arc::clone(&f.name), i)).collect();
        Self { fields, name_to_index }
    }

    /// Creates an empty schema.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the fields.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the field at `index`.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Gets the index for a column name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Creates a new schema with an additional field.
    #[must_use]
    pub fn with_field(&self, field: Field) -> Self {
        let mut fields = self.fields.clone();
        fields.push(field);
        Self::new(fields)
    }

    /// Creates a projection of this schema with only the given columns.
    #[must_use]
    pub fn project(&self, indices: &[usize]) -> Self {
        Self::new(indices.iter().filter_map(|&i| self.fields.get(i).cloned()).collect())
    }
}

impl FromIterator<Field> for Schema {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A batch of rows stored column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch {
    /// The schema shared by all columns.
    schema: Arc<Schema>,
    /// One column per schema field.
    columns: Vec<Column>,
    /// Number of rows in every column.
    num_rows: usize,
}

impl RowBatch {
    /// Creates a batch, validating column count, types and lengths.
    pub fn try_new(schema: Arc<Schema>, columns: Vec<Column>) -> CoreResult<Self> {
        if columns.len() != schema.len() {
            return Err(CoreError::ColumnCountMismatch {
                expected: schema.len(),
                actual: columns.len(),
            });
        }
        let num_rows = columns.first().map_or(0, Column::len);
        for (field, column) in schema.fields().iter().zip(&columns) {
            if column.data_type() != field.data_type() {
                return Err(CoreError::type_mismatch(
                    field.data_type().name(),
                    column.data_type().name(),
                ));
            }
            if column.len() != num_rows {
                return Err(CoreError::LengthMismatch {
                    column: field.name().to_owned(),
                    expected: num_rows,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { schema, columns, num_rows })
    }

    /// Creates a batch with zero rows.
    #[must_use]
    pub fn empty(schema: Arc<Schema>) -> Self {
        let columns = schema.fields().iter().map(|f| Column::new(f.data_type())).collect();
        Self { schema, columns, num_rows: 0 }
    }

    /// Creates a batch from row-major values.
    ///
    /// Convenient for tests and small literal inputs.
    pub fn from_rows(schema: Arc<Schema>, rows: Vec<Vec<Value>>) -> CoreResult<Self> {
        let mut columns: Vec<Column> =
            schema.fields().iter().map(|f| Column::new(f.data_type())).collect();
        for row in rows {
            if row.len() != columns.len() {
                return Err(CoreError::ColumnCountMismatch {
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value)?;
            }
        }
        Self::try_new(schema, columns)
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the shared schema reference.
    #[must_use]
    pub fn schema_arc(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns true if the batch has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Returns the columns.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column at `index`.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the column with the given name.
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.schema.index_of(name).and_then(|i| self.columns.get(i))
    }

    /// Returns the values of one row, in schema order.
    #[must_use]
    pub fn row_values(&self, row: usize) -> Option<Vec<Value>> {
        if row >= self.num_rows {
            return None;
        }
        self.columns.iter().map(|c| c.get(row).cloned()).collect()
    }

    /// Shortens every column to `len` rows.
    pub fn truncate(&mut self, len: usize) {
        if len < self.num_rows {
            for column in &mut self.columns {
                column.truncate(len);
            }
            self.num_rows = len;
        }
    }

    /// Consumes the batch and returns its columns.
    #[must_use]
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}
