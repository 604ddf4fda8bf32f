//! Reusable per-slice peer and frame buffers.

use super::bounds::update_frame_bounds;
use super::validity::{compute_valid_frames, SelectivityVector};
use super::{FrameSide, WindowFrame};
use crate::error::WindowResult;
use crate::function::WindowFrameBuffers;
use crate::partition::WindowPartition;

#[derive(Debug, Clone, Default)]
struct FunctionFrameBuffers {
    frame_starts: Vec<i64>,
    frame_ends: Vec<i64>,
    valid_frames: SelectivityVector,
}

/// Peer buffers shared by all functions plus one frame/validity set per
/// function, sized once for the largest slice and reused across slices.
#[derive(Debug, Clone, Default)]
pub struct PeerAndFrameBuffers {
    peer_starts: Vec<i64>,
    peer_ends: Vec<i64>,
    functions: Vec<FunctionFrameBuffers>,
}

impl PeerAndFrameBuffers {
    /// Allocates buffers for `num_functions` functions and slices of up to
    /// `capacity` rows.
    #[must_use]
    pub fn new(num_functions: usize, capacity: usize) -> Self {
        let mut buffers = Self {
            peer_starts: Vec::new(),
            peer_ends: Vec::new(),
            functions: vec![FunctionFrameBuffers::default(); num_functions],
        };
        buffers.ensure_capacity(capacity);
        buffers
    }

    /// Grows every buffer to hold at least `capacity` rows.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if self.peer_starts.len() >= capacity {
            return;
        }
        self.peer_starts.resize(capacity, 0);
        self.peer_ends.resize(capacity, 0);
        for function in &mut self.functions {
            function.frame_starts.resize(capacity, 0);
            function.frame_ends.resize(capacity, 0);
        }
    }

    /// Rows each buffer can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.peer_starts.len()
    }

    /// Fills the buffers for partition rows `[start_row, end_row)`.
    ///
    /// `peer_state` holds the peer group carried over from the previous slice
    /// of the same partition and is advanced past this slice.
    pub fn compute(
        &mut self,
        frames: &mut [WindowFrame],
        partition: &dyn WindowPartition,
        start_row: usize,
        end_row: usize,
        peer_state: &mut (usize, usize),
    ) -> WindowResult<()> {
        let num_rows = end_row - start_row;
        self.ensure_capacity(num_rows);
        let peer_starts = &mut self.peer_starts[..num_rows];
        let peer_ends = &mut self.peer_ends[..num_rows];
        *peer_state = partition.compute_peer_buffers(
            start_row,
            end_row,
            peer_state.0,
            peer_state.1,
            peer_starts,
            peer_ends,
        );

        let last_row = partition.num_rows() as i64 - 1;
        for (frame, buffers) in frames.iter_mut().zip(&mut self.functions) {
            let starts = &mut buffers.frame_starts[..num_rows];
            let ends = &mut buffers.frame_ends[..num_rows];
            update_frame_bounds(
                frame,
                FrameSide::Start,
                partition,
                start_row,
                peer_starts,
                peer_ends,
                starts,
            )?;
            update_frame_bounds(
                frame,
                FrameSide::End,
                partition,
                start_row,
                peer_starts,
                peer_ends,
                ends,
            )?;

            buffers.valid_frames.resize_fill(num_rows, true);
            if frame.has_offset_bound() {
                compute_valid_frames(last_row, starts, ends, &mut buffers.valid_frames);
            }
        }
        Ok(())
    }

    /// Returns the buffers of function `function_index` for the last
    /// computed slice of `num_rows` rows.
    #[must_use]
    pub fn view(&self, function_index: usize, num_rows: usize) -> Option<WindowFrameBuffers<'_>> {
        let function = self.functions.get(function_index)?;
        Some(WindowFrameBuffers {
            peer_starts: self.peer_starts.get(..num_rows)?,
            peer_ends: self.peer_ends.get(..num_rows)?,
            frame_starts: function.frame_starts.get(..num_rows)?,
            frame_ends: function.frame_ends.get(..num_rows)?,
            valid_frames: &function.valid_frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use winframe_core::{Column, DataType, Field, Schema, Value};

    use super::*;
    use crate::partition::SortedPartition;
    use crate::plan::{FrameBound, FrameDefinition, OffsetExpr};

    fn partition(keys: &[i64]) -> SortedPartition {
        let column =
            Column::from_values(DataType::BigInt, keys.iter().copied().map(Value::Int).collect())
                .expect("keys");
        SortedPartition::new(vec![column], vec![0]).expect("partition")
    }

    fn frames() -> Vec<WindowFrame> {
        let schema = Schema::new(vec![Field::new("k", DataType::BigInt)]);
        [
            FrameDefinition::default(),
            FrameDefinition::rows(
                FrameBound::preceding(OffsetExpr::constant(3)),
                FrameBound::preceding(OffsetExpr::constant(2)),
            ),
        ]
        .iter()
        .map(|d| WindowFrame::compile(d, &schema).expect("frame"))
        .collect()
    }

    #[test]
    fn computes_each_function_independently() {
        let part = partition(&[1, 1, 2, 2]);
        let mut frames = frames();
        let mut buffers = PeerAndFrameBuffers::new(2, 4);
        let mut peers = (0, 0);
        buffers.compute(&mut frames, &part, 0, 4, &mut peers).expect("compute");

        let range = buffers.view(0, 4).expect("view");
        assert_eq!(range.frame_ends, &[1, 1, 3, 3]);
        assert!(range.valid_frames.is_all_selected());

        let rows = buffers.view(1, 4).expect("view");
        assert_eq!(rows.valid_frames.iter_selected().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(&rows.frame_starts[2..], &[0, 0]);
        assert_eq!(&rows.frame_ends[2..], &[0, 1]);
        assert!(buffers.view(2, 4).is_none());
    }

    #[test]
    fn peer_state_carries_across_slices() {
        let part = partition(&[1, 1, 1, 2, 2]);
        let mut frames = frames();
        let mut buffers = PeerAndFrameBuffers::new(2, 2);
        let mut peers = (0, 0);

        let mut ends = Vec::new();
        for start in (0..5).step_by(2) {
            let end = (start + 2).min(5);
            buffers.compute(&mut frames, &part, start, end, &mut peers).expect("compute");
            ends.extend_from_slice(buffers.view(0, end - start).expect("view").frame_ends);
        }
        assert_eq!(ends, vec![2, 2, 2, 4, 4]);
    }

    #[test]
    fn grows_for_larger_slices() {
        let part = partition(&[1, 2, 3]);
        let mut frames = frames();
        let mut buffers = PeerAndFrameBuffers::new(2, 1);
        buffers.compute(&mut frames, &part, 0, 3, &mut (0, 0)).expect("compute");
        assert_eq!(buffers.capacity(), 3);
    }
}
