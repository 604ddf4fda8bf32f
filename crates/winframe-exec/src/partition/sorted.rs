//! In-memory sort based partition build.
//!
//! [`SortWindowBuild`] buffers every input batch, sorts the row positions by
//! (PARTITION BY keys, ORDER BY keys) once input is complete, and hands out
//! each run of equal partition keys as a [`SortedPartition`]. All partitions
//! share one sorted copy of the input; nothing is spilled.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Arc;

use tracing::debug;
use winframe_core::{compare_sql, Column, CoreError, RowBatch, Schema};

use super::{WindowBuild, WindowPartition};
use crate::error::{WindowError, WindowResult};
use crate::plan::SortKey;

/// A [`WindowBuild`] that sorts all input in memory.
#[derive(Debug)]
pub struct SortWindowBuild {
    /// Schema of the buffered input.
    input_schema: Arc<Schema>,
    /// PARTITION BY channels.
    partition_keys: Vec<usize>,
    /// ORDER BY keys.
    sort_keys: Vec<SortKey>,
    /// Buffered input, one column per input channel.
    columns: Vec<Column>,
    /// Input sorted by partition and sort keys, set by `no_more_input`.
    sorted: Option<Arc<Vec<Column>>>,
    /// Row ranges of the partitions not yet handed out.
    pending: VecDeque<Range<usize>>,
    /// Whether `no_more_input` has been called.
    input_complete: bool,
}

impl SortWindowBuild {
    /// Creates a build for input of `input_schema`.
    pub fn new(
        input_schema: Arc<Schema>,
        partition_keys: Vec<usize>,
        sort_keys: Vec<SortKey>,
    ) -> WindowResult<Self> {
        let num_columns = input_schema.len();
        let channels = partition_keys.iter().copied().chain(sort_keys.iter().map(|k| k.channel));
        for channel in channels {
            if channel >= num_columns {
                return Err(WindowError::InvalidChannel { channel, num_columns });
            }
        }
        let columns = input_schema.fields().iter().map(|f| Column::new(f.data_type())).collect();
        Ok(Self {
            input_schema,
            partition_keys,
            sort_keys,
            columns,
            sorted: None,
            pending: VecDeque::new(),
            input_complete: false,
        })
    }

    /// Returns the number of buffered rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        for &channel in &self.partition_keys {
            let column = &self.columns[channel];
            let ord = compare_values_at(column, a, b, false);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        for key in &self.sort_keys {
            let column = &self.columns[key.channel];
            let ord = compare_values_at(column, a, b, key.nulls_first);
            let ord = if key.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn compare_values_at(column: &Column, a: usize, b: usize, nulls_first: bool) -> Ordering {
    match (column.get(a), column.get(b)) {
        (Some(x), Some(y)) => compare_sql(x, y, nulls_first),
        _ => Ordering::Equal,
    }
}

fn same_keys(
    columns: &[Column],
    mut channels: impl Iterator<Item = usize>,
    a: usize,
    b: usize,
) -> bool {
    channels.all(|channel| compare_values_at(&columns[channel], a, b, false).is_eq())
}

impl WindowBuild for SortWindowBuild {
    fn add_input(&mut self, input: RowBatch) -> WindowResult<()> {
        if input.is_empty() {
            return Ok(());
        }
        if self.input_complete {
            return Err(WindowError::InvalidState("input added after no_more_input".to_string()));
        }
        if input.schema().len() != self.input_schema.len() {
            return Err(CoreError::ColumnCountMismatch {
                expected: self.input_schema.len(),
                actual: input.schema().len(),
            }
            .into());
        }
        // All columns are checked before any is appended so they stay equally long.
        for (dest, source) in self.columns.iter().zip(input.columns()) {
            if dest.data_type() != source.data_type() {
                return Err(CoreError::type_mismatch(
                    dest.data_type().name(),
                    source.data_type().name(),
                )
                .into());
            }
        }
        let num_rows = input.num_rows();
        for (dest, source) in self.columns.iter_mut().zip(input.columns()) {
            let offset = dest.len();
            dest.copy_from(source, 0, num_rows, offset)?;
        }
        Ok(())
    }

    fn no_more_input(&mut self) -> WindowResult<()> {
        if self.input_complete {
            return Ok(());
        }
        self.input_complete = true;

        let num_rows = self.num_rows();
        let mut order: Vec<usize> = (0..num_rows).collect();
        order.sort_by(|&a, &b| self.compare_rows(a, b));

        let mut sorted: Vec<Column> = Vec::with_capacity(self.columns.len());
        for column in &mut self.columns {
            let data_type = column.data_type();
            let mut values = std::mem::replace(column, Column::new(data_type)).into_values();
            let permuted = order.iter().map(|&i| std::mem::take(&mut values[i])).collect();
            sorted.push(Column::from_values(data_type, permuted)?);
        }

        let mut start = 0;
        for row in 1..=num_rows {
            if row == num_rows
                || !same_keys(&sorted, self.partition_keys.iter().copied(), row - 1, row)
            {
                self.pending.push_back(start..row);
                start = row;
            }
        }
        debug!(rows = num_rows, partitions = self.pending.len(), "sorted window input");
        self.sorted = Some(Arc::new(sorted));
        Ok(())
    }

    fn has_next_partition(&self) -> bool {
        self.input_complete && !self.pending.is_empty()
    }

    fn next_partition(&mut self) -> WindowResult<Arc<dyn WindowPartition>> {
        let (Some(sorted), Some(rows)) = (self.sorted.as_ref(), self.pending.pop_front()) else {
            return Err(WindowError::InvalidState("no partition available".to_string()));
        };
        Ok(Arc::new(SortedPartition {
            columns: Arc::clone(sorted),
            offset: rows.start,
            num_rows: rows.len(),
            sort_channels: self.sort_keys.iter().map(|k| k.channel).collect(),
        }))
    }

    fn estimate_row_size(&self) -> usize {
        self.input_schema.fields().iter().map(|f| f.data_type().fixed_width()).sum()
    }
}

/// One partition of a [`SortWindowBuild`].
#[derive(Debug)]
pub struct SortedPartition {
    /// Sorted input shared by all partitions.
    columns: Arc<Vec<Column>>,
    /// First row of this partition within `columns`.
    offset: usize,
    /// Number of rows in the partition.
    num_rows: usize,
    /// ORDER BY channels; rows equal on all of them are peers.
    sort_channels: Vec<usize>,
}

impl SortedPartition {
    /// Creates a partition over already ordered columns.
    ///
    /// Every row of `columns` belongs to the partition.
    pub fn new(columns: Vec<Column>, sort_channels: Vec<usize>) -> WindowResult<Self> {
        let num_rows = columns.first().map_or(0, Column::len);
        if let Some((index, bad)) = columns.iter().enumerate().find(|(_, c)| c.len() != num_rows) {
            return Err(CoreError::LengthMismatch {
                column: format!("#{index}"),
                expected: num_rows,
                actual: bad.len(),
            }
            .into());
        }
        if let Some(&channel) = sort_channels.iter().find(|&&c| c >= columns.len()) {
            return Err(WindowError::InvalidChannel { channel, num_columns: columns.len() });
        }
        Ok(Self { columns: Arc::new(columns), offset: 0, num_rows, sort_channels })
    }

    fn is_peer(&self, a: usize, b: usize) -> bool {
        let channels = self.sort_channels.iter().copied();
        same_keys(&self.columns, channels, self.offset + a, self.offset + b)
    }
}

impl WindowPartition for SortedPartition {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn extract_column(
        &self,
        channel: usize,
        partition_offset: usize,
        num_rows: usize,
        result_offset: usize,
        result: &mut Column,
    ) -> WindowResult<()> {
        let source = self.columns.get(channel).ok_or(WindowError::InvalidChannel {
            channel,
            num_columns: self.columns.len(),
        })?;
        if partition_offset + num_rows > self.num_rows {
            return Err(CoreError::IndexOutOfBounds {
                index: partition_offset + num_rows,
                len: self.num_rows,
            }
            .into());
        }
        result.copy_from(source, self.offset + partition_offset, num_rows, result_offset)?;
        Ok(())
    }

    fn compute_peer_buffers(
        &self,
        start_row: usize,
        end_row: usize,
        prev_peer_start: usize,
        prev_peer_end: usize,
        peer_starts: &mut [i64],
        peer_ends: &mut [i64],
    ) -> (usize, usize) {
        let mut peer_start = prev_peer_start;
        let mut peer_end = prev_peer_end;
        for (j, row) in (start_row..end_row).enumerate() {
            // Every row of a peer group shares its bounds, so they are only
            // recomputed on the first row past the previous group.
            if row == 0 || row >= peer_end {
                peer_start = row;
                peer_end = row;
                while peer_end < self.num_rows && self.is_peer(peer_start, peer_end) {
                    peer_end += 1;
                }
            }
            peer_starts[j] = peer_start as i64;
            peer_ends[j] = peer_end as i64 - 1;
        }
        (peer_start, peer_end)
    }
}

#[cfg(test)]
mod tests {
    use winframe_core::{DataType, Field, Value};

    use super::*;

    fn input() -> RowBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("dept", DataType::Varchar),
            Field::new("salary", DataType::BigInt),
        ]));
        RowBatch::from_rows(
            schema,
            vec![
                vec!["Sales".into(), Value::Int(100)],
                vec!["IT".into(), Value::Int(80)],
                vec!["Sales".into(), Value::Int(90)],
                vec!["IT".into(), Value::Int(90)],
                vec!["IT".into(), Value::Int(80)],
            ],
        )
        .expect("valid input")
    }

    fn build() -> SortWindowBuild {
        let batch = input();
        let mut build = SortWindowBuild::new(batch.schema_arc(), vec![0], vec![SortKey::asc(1)])
            .expect("build");
        build.add_input(batch).expect("add input");
        build
    }

    fn salaries(partition: &dyn WindowPartition) -> Vec<Value> {
        let mut column = Column::new(DataType::BigInt);
        partition.extract_column(1, 0, partition.num_rows(), 0, &mut column).expect("extract");
        column.into_values()
    }

    #[test]
    fn partitions_only_after_no_more_input() {
        let mut build = build();
        assert!(!build.has_next_partition());
        build.no_more_input().expect("no more input");
        assert!(build.has_next_partition());
    }

    #[test]
    fn splits_and_orders_partitions() {
        let mut build = build();
        build.no_more_input().expect("no more input");

        let it = build.next_partition().expect("IT partition");
        assert_eq!(salaries(it.as_ref()), vec![Value::Int(80), Value::Int(80), Value::Int(90)]);
        let sales = build.next_partition().expect("Sales partition");
        assert_eq!(salaries(sales.as_ref()), vec![Value::Int(90), Value::Int(100)]);

        assert!(!build.has_next_partition());
        assert!(build.next_partition().is_err());
    }

    #[test]
    fn peer_groups_follow_sort_keys() {
        let mut build = build();
        build.no_more_input().expect("no more input");
        let it = build.next_partition().expect("IT partition");

        let mut starts = vec![0; 3];
        let mut ends = vec![0; 3];
        let state = it.compute_peer_buffers(0, 3, 0, 0, &mut starts, &mut ends);
        assert_eq!(starts, vec![0, 0, 2]);
        assert_eq!(ends, vec![1, 1, 2]);
        assert_eq!(state, (2, 3));
    }

    #[test]
    fn peer_computation_resumes_from_seed() {
        let column =
            Column::from_values(DataType::BigInt, [1, 1, 1, 2, 2].map(Value::Int).to_vec())
                .expect("column");
        let partition = SortedPartition::new(vec![column], vec![0]).expect("partition");

        let mut starts = vec![0; 2];
        let mut ends = vec![0; 2];
        let state = partition.compute_peer_buffers(0, 2, 0, 0, &mut starts, &mut ends);
        assert_eq!((starts.as_slice(), ends.as_slice()), (&[0, 0][..], &[2, 2][..]));

        let mut starts = vec![0; 3];
        let mut ends = vec![0; 3];
        partition.compute_peer_buffers(2, 5, state.0, state.1, &mut starts, &mut ends);
        assert_eq!(starts, vec![0, 3, 3]);
        assert_eq!(ends, vec![2, 4, 4]);
    }

    #[test]
    fn no_sort_keys_makes_one_peer_group() {
        let column = Column::from_values(DataType::BigInt, [3, 1, 2].map(Value::Int).to_vec())
            .expect("column");
        let partition = SortedPartition::new(vec![column], vec![]).expect("partition");
        let mut starts = vec![0; 3];
        let mut ends = vec![0; 3];
        partition.compute_peer_buffers(0, 3, 0, 0, &mut starts, &mut ends);
        assert_eq!(starts, vec![0, 0, 0]);
        assert_eq!(ends, vec![2, 2, 2]);
    }

    #[test]
    fn empty_batches_are_ignored_and_late_input_rejected() {
        let mut build = build();
        let empty = RowBatch::empty(input().schema_arc());
        build.add_input(empty.clone()).expect("empty input is ignored");
        build.no_more_input().expect("no more input");
        build.add_input(empty).expect("empty input is still ignored");
        assert!(matches!(build.add_input(input()), Err(WindowError::InvalidState(_))));
    }

    #[test]
    fn mistyped_batch_leaves_buffered_input_intact() {
        let mut build = build();
        let wrong = Arc::new(Schema::new(vec![
            Field::new("dept", DataType::Varchar),
            Field::new("salary", DataType::Double),
        ]));
        let batch = RowBatch::from_rows(wrong, vec![vec!["IT".into(), Value::Float(1.5)]])
            .expect("valid batch");
        assert!(matches!(
            build.add_input(batch),
            Err(WindowError::Core(CoreError::TypeMismatch { .. }))
        ));
        assert_eq!(build.num_rows(), 5);

        build.add_input(input()).expect("add input");
        build.no_more_input().expect("no more input");
        let it = build.next_partition().expect("IT partition");
        assert_eq!(it.num_rows(), 6);
    }

    #[test]
    fn row_size_sums_type_widths() {
        let build = build();
        assert_eq!(build.estimate_row_size(), DataType::Varchar.fixed_width() + 8);
    }
}
