//! Partition source contract.
//!
//! The window operator does not build partitions itself. It pushes input
//! into a [`WindowBuild`], and once input is complete pulls ordered
//! [`WindowPartition`]s from it one at a time.
//!
//! # Modules
//!
//! - [`sorted`] - In-memory sort based [`WindowBuild`] without spilling

use std::fmt;
use std::sync::Arc;

use winframe_core::{Column, RowBatch};

use crate::error::WindowResult;

pub mod sorted;

pub use sorted::{SortWindowBuild, SortedPartition};

/// An ordered, immutable partition of rows sharing equal PARTITION BY keys.
///
/// Row indices are local to the partition and start at 0.
pub trait WindowPartition: Send + Sync + fmt::Debug {
    /// Returns the number of rows in the partition. Never zero.
    fn num_rows(&self) -> usize;

    /// Copies `num_rows` values of input column `channel`, starting at
    /// partition row `partition_offset`, into `result` starting at
    /// `result_offset`.
    fn extract_column(
        &self,
        channel: usize,
        partition_offset: usize,
        num_rows: usize,
        result_offset: usize,
        result: &mut Column,
    ) -> WindowResult<()>;

    /// Fills `peer_starts[..n]`/`peer_ends[..n]` (`n = end_row - start_row`)
    /// with the inclusive peer group bounds of every row in
    /// `[start_row, end_row)`.
    ///
    /// `prev_peer_start`/`prev_peer_end` are the values returned by the
    /// previous call for the same partition (`0, 0` for the first call);
    /// `prev_peer_end` is exclusive. Returns the new pair to pass to the next
    /// call. The same inputs always produce the same outputs.
    fn compute_peer_buffers(
        &self,
        start_row: usize,
        end_row: usize,
        prev_peer_start: usize,
        prev_peer_end: usize,
        peer_starts: &mut [i64],
        peer_ends: &mut [i64],
    ) -> (usize, usize);
}

/// Accumulates input and produces ordered partitions.
pub trait WindowBuild: Send {
    /// Buffers an input batch. Empty batches are ignored.
    fn add_input(&mut self, input: RowBatch) -> WindowResult<()>;

    /// Signals that no more input will arrive and makes partitions available.
    fn no_more_input(&mut self) -> WindowResult<()>;

    /// Returns true if [`next_partition`](Self::next_partition) will yield a
    /// partition.
    fn has_next_partition(&self) -> bool;

    /// Returns the next partition. Callers must first check
    /// [`has_next_partition`](Self::has_next_partition).
    fn next_partition(&mut self) -> WindowResult<Arc<dyn WindowPartition>>;

    /// Estimated size in bytes of one input row.
    fn estimate_row_size(&self) -> usize;
}
