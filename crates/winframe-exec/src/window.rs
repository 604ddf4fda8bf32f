//! The window operator.
//!
//! [`WindowOp`] buffers its input in a [`WindowBuild`] and, once input is
//! complete, walks the resulting partitions in order. Every output batch
//! carries the input columns followed by one column per window function.
//! A partition may span several output batches and one batch may cover
//! several partitions; the partition cursor and the peer group carried over
//! between slices are kept on the operator so output can be pulled one batch
//! at a time.

use std::sync::Arc;

use tracing::{debug, trace};
use winframe_core::{Column, DataType, RowBatch, Schema};

use crate::config::WindowConfig;
use crate::error::{WindowError, WindowResult};
use crate::frame::{PeerAndFrameBuffers, WindowFrame};
use crate::function::{WindowFunction, WindowFunctionArg, WindowFunctionRegistry};
use crate::operator::{Operator, OperatorBase, OperatorResult, OperatorState};
use crate::partition::{SortWindowBuild, WindowBuild, WindowPartition};
use crate::plan::{WindowFunctionCall, WindowNode};

/// Computes window functions over partitioned, ordered input.
pub struct WindowOp {
    /// Base operator state.
    base: OperatorBase,
    /// Number of input columns passed through to the output.
    num_input_columns: usize,
    /// Source of ordered partitions.
    build: Box<dyn WindowBuild>,
    /// One instance per window function, in output order.
    functions: Vec<Box<dyn WindowFunction>>,
    /// Compiled frame of each function.
    frames: Vec<WindowFrame>,
    /// Result type of each function.
    result_types: Vec<DataType>,
    config: WindowConfig,
    /// Scratch peer and frame buffers reused across slices.
    buffers: PeerAndFrameBuffers,
    /// Partition currently being output.
    current_partition: Option<Arc<dyn WindowPartition>>,
    /// Next row of the current partition to output.
    partition_offset: usize,
    /// Peer group left off by the previous slice of the current partition.
    peer_start_row: usize,
    peer_end_row: usize,
    /// Rows received.
    num_rows: usize,
    /// Rows output.
    num_processed_rows: usize,
    /// Row budget of one output batch, fixed when input completes.
    rows_per_output: usize,
    /// Partitions started.
    partitions_processed: u64,
}

impl WindowOp {
    /// Creates an operator that sorts its input in memory.
    pub fn new(
        node: &WindowNode,
        registry: &WindowFunctionRegistry,
        config: &WindowConfig,
    ) -> WindowResult<Self> {
        let build = SortWindowBuild::new(
            Arc::clone(&node.input_schema),
            node.partition_keys.clone(),
            node.sort_keys.clone(),
        )?;
        Self::with_build(node, Box::new(build), registry, config)
    }

    /// Creates an operator reading partitions from `build`.
    ///
    /// Every function is resolved against `registry` and every frame is
    /// validated here; a plan that passes construction only fails later on
    /// bad offset values.
    pub fn with_build(
        node: &WindowNode,
        build: Box<dyn WindowBuild>,
        registry: &WindowFunctionRegistry,
        config: &WindowConfig,
    ) -> WindowResult<Self> {
        let input_schema = node.input_schema.as_ref();
        let mut functions = Vec::with_capacity(node.functions.len());
        let mut frames = Vec::with_capacity(node.functions.len());
        for call in &node.functions {
            check_arguments(call, input_schema)?;
            functions.push(registry.create(
                &call.name,
                &call.args,
                call.result_type,
                call.ignore_nulls,
                config,
            )?);
            frames.push(WindowFrame::compile(&call.frame, input_schema)?);
        }
        debug!(
            functions = functions.len(),
            partition_keys = node.partition_keys.len(),
            sort_keys = node.sort_keys.len(),
            "created window operator"
        );

        Ok(Self {
            base: OperatorBase::new(Arc::new(node.output_schema())),
            num_input_columns: input_schema.len(),
            build,
            buffers: PeerAndFrameBuffers::new(functions.len(), 0),
            functions,
            frames,
            result_types: node.functions.iter().map(|f| f.result_type).collect(),
            config: config.clone(),
            current_partition: None,
            partition_offset: 0,
            peer_start_row: 0,
            peer_end_row: 0,
            num_rows: 0,
            num_processed_rows: 0,
            rows_per_output: 0,
            partitions_processed: 0,
        })
    }

    /// Row budget of one output batch. Zero until input is complete.
    #[must_use]
    pub const fn rows_per_output(&self) -> usize {
        self.rows_per_output
    }

    /// Number of partitions started so far.
    #[must_use]
    pub const fn partitions_processed(&self) -> u64 {
        self.partitions_processed
    }

    /// Number of rows output so far.
    #[must_use]
    pub const fn rows_produced(&self) -> u64 {
        self.base.rows_produced()
    }

    /// Moves to the next partition, if any, and resets every function.
    fn call_reset_partition(&mut self) -> WindowResult<()> {
        self.partition_offset = 0;
        self.peer_start_row = 0;
        self.peer_end_row = 0;
        self.current_partition = None;
        if !self.build.has_next_partition() {
            return Ok(());
        }
        let partition = self.build.next_partition()?;
        for function in &mut self.functions {
            function.reset_partition(Arc::clone(&partition))?;
        }
        self.partitions_processed += 1;
        debug!(
            partition = self.partitions_processed,
            rows = partition.num_rows(),
            "starting window partition"
        );
        self.current_partition = Some(partition);
        Ok(())
    }

    /// Outputs partition rows `[start_row, end_row)` into `columns` at
    /// `result_offset`.
    fn call_apply_for_partition_rows(
        &mut self,
        start_row: usize,
        end_row: usize,
        result_offset: usize,
        columns: &mut [Column],
    ) -> WindowResult<()> {
        let partition = self
            .current_partition
            .clone()
            .ok_or_else(|| WindowError::InvalidState("no current partition".to_string()))?;
        let num_rows = end_row - start_row;

        let (inputs, outputs) = columns.split_at_mut(self.num_input_columns);
        for (channel, column) in inputs.iter_mut().enumerate() {
            partition.extract_column(
                channel,
                self.partition_offset,
                num_rows,
                result_offset,
                column,
            )?;
        }

        let mut peer_state = (self.peer_start_row, self.peer_end_row);
        self.buffers.compute(
            &mut self.frames,
            partition.as_ref(),
            start_row,
            end_row,
            &mut peer_state,
        )?;
        (self.peer_start_row, self.peer_end_row) = peer_state;

        for (index, (function, output)) in self.functions.iter_mut().zip(outputs).enumerate() {
            let frames = self.buffers.view(index, num_rows).ok_or_else(|| {
                WindowError::InvalidState(format!("no buffers for function {index}"))
            })?;
            function.apply(&frames, result_offset, output)?;
        }

        trace!(start_row, end_row, result_offset, "applied window functions");
        self.num_processed_rows += num_rows;
        self.partition_offset += num_rows;
        Ok(())
    }

    /// Fills up to `num_output_rows` rows of `columns`, crossing partition
    /// boundaries as needed. Returns the number of rows written.
    fn call_apply_loop(
        &mut self,
        num_output_rows: usize,
        columns: &mut [Column],
    ) -> WindowResult<usize> {
        let mut result_index = 0;
        let mut rows_left = num_output_rows;
        while rows_left > 0 {
            let Some(partition) = &self.current_partition else {
                break;
            };
            let rows_for_partition = partition.num_rows() - self.partition_offset;
            let start_row = self.partition_offset;
            if rows_for_partition <= rows_left {
                self.call_apply_for_partition_rows(
                    start_row,
                    start_row + rows_for_partition,
                    result_index,
                    columns,
                )?;
                result_index += rows_for_partition;
                rows_left -= rows_for_partition;
                self.call_reset_partition()?;
            } else {
                self.call_apply_for_partition_rows(
                    start_row,
                    start_row + rows_left,
                    result_index,
                    columns,
                )?;
                result_index += rows_left;
                rows_left = 0;
            }
        }
        Ok(result_index)
    }

    fn output_columns(&self, num_rows: usize) -> Vec<Column> {
        let schema = self.base.schema();
        let inputs = schema.fields()[..self.num_input_columns]
            .iter()
            .map(|f| Column::new(f.data_type()));
        let outputs = self.result_types.iter().map(|&t| Column::nulls(t, num_rows));
        inputs.chain(outputs).collect()
    }
}

/// Checks that column arguments exist and have their declared types.
fn check_arguments(call: &WindowFunctionCall, input_schema: &Schema) -> WindowResult<()> {
    for arg in &call.args {
        let WindowFunctionArg::Column { data_type, channel } = arg else {
            continue;
        };
        let field = input_schema.field(*channel).ok_or(WindowError::InvalidChannel {
            channel: *channel,
            num_columns: input_schema.len(),
        })?;
        if field.data_type() != *data_type {
            return Err(WindowError::InvalidArgument {
                function: call.name.clone(),
                reason: format!(
                    "column '{}' is {}, not {data_type}",
                    field.name(),
                    field.data_type()
                ),
            });
        }
    }
    Ok(())
}

impl Operator for WindowOp {
    fn add_input(&mut self, input: RowBatch) -> OperatorResult<()> {
        if input.is_empty() {
            return Ok(());
        }
        if !self.base.state().is_accepting() {
            return Err(WindowError::InvalidState("input added after no_more_input".to_string()));
        }
        let rows = input.num_rows();
        self.build.add_input(input)?;
        self.num_rows += rows;
        Ok(())
    }

    fn no_more_input(&mut self) -> OperatorResult<()> {
        if !self.base.state().is_accepting() {
            return Ok(());
        }
        self.base.set_producing();
        if self.num_rows == 0 {
            debug!("window operator received no input");
            self.base.set_finished();
            return Ok(());
        }
        self.build.no_more_input()?;
        self.rows_per_output = self.config.output_batch_rows(self.build.estimate_row_size());
        self.buffers.ensure_capacity(self.rows_per_output);
        debug!(
            rows = self.num_rows,
            rows_per_output = self.rows_per_output,
            "window input complete"
        );
        Ok(())
    }

    fn get_output(&mut self) -> OperatorResult<Option<RowBatch>> {
        if !self.base.state().is_producing() {
            return Ok(None);
        }
        let rows_left = self.num_rows - self.num_processed_rows;
        if rows_left == 0 {
            self.base.set_finished();
            return Ok(None);
        }
        if self.current_partition.is_none() {
            self.call_reset_partition()?;
            if self.current_partition.is_none() {
                return Ok(None);
            }
        }

        let num_output_rows = self.rows_per_output.min(rows_left);
        let mut columns = self.output_columns(num_output_rows);
        let produced = self.call_apply_loop(num_output_rows, &mut columns)?;
        if produced < num_output_rows {
            for column in &mut columns {
                column.truncate(produced);
            }
        }

        let batch = RowBatch::try_new(self.base.schema(), columns)?;
        self.base.record_batch(produced);
        if self.num_processed_rows == self.num_rows {
            self.base.set_finished();
        }
        Ok(Some(batch))
    }

    fn is_finished(&self) -> bool {
        self.base.state().is_finished()
    }

    fn output_schema(&self) -> Arc<Schema> {
        self.base.schema()
    }

    fn state(&self) -> OperatorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "Window"
    }
}

impl std::fmt::Debug for WindowOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowOp")
            .field("state", &self.base.state())
            .field("functions", &self.functions.len())
            .field("num_rows", &self.num_rows)
            .field("num_processed_rows", &self.num_processed_rows)
            .field("rows_per_output", &self.rows_per_output)
            .field("partition_offset", &self.partition_offset)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use winframe_core::{Field, Value};

    use super::*;
    use crate::plan::{FrameBound, FrameDefinition, SortKey};

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("p", DataType::BigInt),
            Field::new("x", DataType::BigInt),
        ]))
    }

    fn batch(rows: &[(i64, i64)]) -> RowBatch {
        RowBatch::from_rows(
            schema(),
            rows.iter().map(|&(p, x)| vec![Value::Int(p), Value::Int(x)]).collect(),
        )
        .expect("batch")
    }

    fn operator(node: &WindowNode, max_rows: usize) -> WindowOp {
        let config = WindowConfig::default().with_max_output_batch_rows(max_rows);
        WindowOp::new(node, &WindowFunctionRegistry::with_builtins(), &config).expect("operator")
    }

    fn running_sum_node() -> WindowNode {
        WindowNode::new(schema())
            .partition_by(vec![0])
            .order_by(vec![SortKey::asc(1)])
            .with_function(WindowFunctionCall::new(
                "sum",
                vec![WindowFunctionArg::column(DataType::BigInt, 1)],
                DataType::BigInt,
                "s",
            ))
    }

    fn drain(op: &mut WindowOp) -> Vec<RowBatch> {
        let mut batches = Vec::new();
        while let Some(batch) = op.get_output().expect("output") {
            batches.push(batch);
        }
        batches
    }

    #[test]
    fn partition_spanning_batches_keeps_peer_state() {
        // One partition of 10 rows; the peer group of rows 3..6 straddles
        // the first batch boundary.
        let rows: Vec<(i64, i64)> = (0..10).map(|i| (0, i / 3)).collect();
        let mut op = operator(&running_sum_node(), 4);
        op.add_input(batch(&rows)).expect("input");
        op.no_more_input().expect("no more input");
        assert_eq!(op.rows_per_output(), 4);

        let batches = drain(&mut op);
        assert_eq!(batches.iter().map(RowBatch::num_rows).collect::<Vec<_>>(), vec![4, 4, 2]);
        assert!(op.is_finished());
        assert!(op.get_output().expect("after end").is_none());

        let sums: Vec<Value> =
            batches.iter().flat_map(|b| b.columns()[2].values().to_vec()).collect();
        // Peers share the running sum of their whole group.
        let expected = [0, 0, 0, 3, 3, 3, 9, 9, 9, 12].map(Value::Int).to_vec();
        assert_eq!(sums, expected);
    }

    #[test]
    fn batches_cross_partition_boundaries() {
        let rows = [(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (3, 1), (3, 2), (3, 3), (3, 4)];
        let mut op = operator(&running_sum_node(), 4);
        op.add_input(batch(&rows)).expect("input");
        op.no_more_input().expect("no more input");

        let batches = drain(&mut op);
        assert_eq!(batches.iter().map(RowBatch::num_rows).collect::<Vec<_>>(), vec![4, 4, 1]);
        assert_eq!(op.partitions_processed(), 3);
        assert_eq!(op.rows_produced(), 9);

        let first = &batches[0];
        assert_eq!(first.row_values(3), Some(vec![Value::Int(2), Value::Int(1), Value::Int(1)]));
    }

    #[test]
    fn no_output_before_input_completes() {
        let mut op = operator(&running_sum_node(), 4);
        op.add_input(batch(&[(1, 1)])).expect("input");
        assert!(op.get_output().expect("output").is_none());
        assert_eq!(op.state(), OperatorState::Accepting);
    }

    #[test]
    fn empty_input_finishes_without_output() {
        let mut op = operator(&running_sum_node(), 4);
        op.add_input(RowBatch::empty(schema())).expect("empty input");
        op.no_more_input().expect("no more input");
        assert!(op.get_output().expect("output").is_none());
        assert!(op.is_finished());
    }

    #[test]
    fn input_after_no_more_input_is_rejected() {
        let mut op = operator(&running_sum_node(), 4);
        op.add_input(batch(&[(1, 1)])).expect("input");
        op.no_more_input().expect("no more input");
        assert!(matches!(op.add_input(batch(&[(1, 2)])), Err(WindowError::InvalidState(_))));
        op.add_input(RowBatch::empty(schema())).expect("empty input is ignored");
    }

    #[test]
    fn mistyped_batch_does_not_corrupt_later_input() {
        let mut op = operator(&running_sum_node(), 4);
        let wrong = Arc::new(Schema::new(vec![
            Field::new("p", DataType::BigInt),
            Field::new("x", DataType::Double),
        ]));
        let mistyped = RowBatch::from_rows(wrong, vec![vec![Value::Int(1), Value::Float(0.5)]])
            .expect("batch");
        assert!(matches!(op.add_input(mistyped), Err(WindowError::Core(_))));

        op.add_input(batch(&[(1, 1)])).expect("input");
        op.no_more_input().expect("no more input");
        let batches = drain(&mut op);
        assert_eq!(batches.iter().map(RowBatch::num_rows).sum::<usize>(), 1);
    }

    #[test]
    fn setup_rejects_bad_plans() {
        let registry = WindowFunctionRegistry::with_builtins();
        let config = WindowConfig::default();

        let unknown = WindowNode::new(schema())
            .with_function(WindowFunctionCall::new("median", vec![], DataType::BigInt, "m"));
        assert!(matches!(
            WindowOp::new(&unknown, &registry, &config),
            Err(WindowError::UnknownFunction(_))
        ));

        let wrong_type = WindowNode::new(schema()).with_function(WindowFunctionCall::new(
            "sum",
            vec![WindowFunctionArg::column(DataType::Double, 1)],
            DataType::Double,
            "s",
        ));
        assert!(matches!(
            WindowOp::new(&wrong_type, &registry, &config),
            Err(WindowError::InvalidArgument { .. })
        ));

        let range_k = WindowNode::new(schema()).with_function(
            WindowFunctionCall::new("row_number", vec![], DataType::BigInt, "rn").with_frame(
                FrameDefinition::range(
                    FrameBound::preceding(crate::plan::OffsetExpr::constant(1)),
                    FrameBound::current_row(),
                ),
            ),
        );
        assert!(matches!(
            WindowOp::new(&range_k, &registry, &config),
            Err(WindowError::Unsupported(_))
        ));
    }

    #[test]
    fn output_schema_appends_function_columns() {
        let op = operator(&running_sum_node(), 4);
        let schema = op.output_schema();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.index_of("s"), Some(2));
        assert_eq!(op.name(), "Window");
    }
}
