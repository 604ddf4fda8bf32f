//! Operator trait and base types.
//!
//! This module defines the [`Operator`] trait for blocking, batch-at-a-time
//! operators: a driver pushes input batches, signals the end of input, then
//! pulls output batches until the operator is finished.

use std::sync::Arc;

use winframe_core::{RowBatch, Schema};

use crate::error::WindowResult;

/// Result type for operator operations.
pub type OperatorResult<T> = WindowResult<T>;

/// The state of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorState {
    /// Operator is accepting input.
    Accepting,
    /// Input is complete and output is being produced.
    Producing,
    /// Operator has produced all of its output.
    Finished,
}

impl OperatorState {
    /// Returns true if the operator accepts input.
    #[must_use]
    pub const fn is_accepting(self) -> bool {
        matches!(self, Self::Accepting)
    }

    /// Returns true if the operator is producing output.
    #[must_use]
    pub const fn is_producing(self) -> bool {
        matches!(self, Self::Producing)
    }

    /// Returns true if the operator has finished.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// The operator trait for push/pull batch execution.
///
/// # Lifecycle
///
/// 1. **Accepting**: `add_input()` may be called any number of times
/// 2. **Producing**: after `no_more_input()`; `get_output()` yields batches
/// 3. **Finished**: `get_output()` has returned `None`; no more batches
///
/// # Thread Safety
///
/// The `Send` bound allows operators to be passed between threads,
/// but operators are not required to be `Sync` - they maintain mutable
/// internal state.
pub trait Operator: Send {
    /// Buffers one input batch.
    fn add_input(&mut self, input: RowBatch) -> OperatorResult<()>;

    /// Signals that no more input will arrive.
    fn no_more_input(&mut self) -> OperatorResult<()>;

    /// Returns the next output batch, or `None` if none is available.
    fn get_output(&mut self) -> OperatorResult<Option<RowBatch>>;

    /// Returns true once every output row has been produced.
    fn is_finished(&self) -> bool;

    /// Returns the output schema of this operator.
    fn output_schema(&self) -> Arc<Schema>;

    /// Returns the current state of this operator.
    fn state(&self) -> OperatorState;

    /// Returns the name of this operator type.
    fn name(&self) -> &'static str;
}

/// A boxed operator for dynamic dispatch.
pub type BoxedOperator = Box<dyn Operator>;

/// Base implementation for operators.
///
/// This struct provides common functionality that operators can use.
#[derive(Debug)]
pub struct OperatorBase {
    /// The output schema.
    schema: Arc<Schema>,
    /// The current state.
    state: OperatorState,
    /// Number of rows produced.
    rows_produced: u64,
    /// Number of batches produced.
    batches_produced: u64,
}

impl OperatorBase {
    /// Creates a new operator base with the given schema.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema, state: OperatorState::Accepting, rows_produced: 0, batches_produced: 0 }
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> OperatorState {
        self.state
    }

    /// Sets the state to producing.
    pub fn set_producing(&mut self) {
        self.state = OperatorState::Producing;
    }

    /// Sets the state to finished.
    pub fn set_finished(&mut self) {
        self.state = OperatorState::Finished;
    }

    /// Records one produced batch of `rows` rows.
    pub fn record_batch(&mut self, rows: usize) {
        self.rows_produced += rows as u64;
        self.batches_produced += 1;
    }

    /// Returns the number of rows produced.
    #[must_use]
    pub const fn rows_produced(&self) -> u64 {
        self.rows_produced
    }

    /// Returns the number of batches produced.
    #[must_use]
    pub const fn batches_produced(&self) -> u64 {
        self.batches_produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_state_transitions() {
        let mut base = OperatorBase::new(Arc::new(Schema::empty()));

        assert_eq!(base.state(), OperatorState::Accepting);
        assert!(base.state().is_accepting());

        base.set_producing();
        assert!(base.state().is_producing());

        base.set_finished();
        assert!(base.state().is_finished());
    }

    #[test]
    fn operator_base_counts_batches() {
        let mut base = OperatorBase::new(Arc::new(Schema::empty()));
        assert_eq!(base.rows_produced(), 0);

        base.record_batch(4);
        base.record_batch(2);
        assert_eq!(base.rows_produced(), 6);
        assert_eq!(base.batches_produced(), 2);
    }
}
