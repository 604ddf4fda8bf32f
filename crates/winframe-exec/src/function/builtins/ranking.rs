//! Ranking functions. They read peer groups and ignore the frame.

use std::sync::Arc;

use winframe_core::{Column, Value};

use crate::error::WindowResult;
use crate::function::traits::{WindowFrameBuffers, WindowFunction, WindowFunctionContext};
use crate::partition::WindowPartition;

/// `row_number()`
#[derive(Debug, Default)]
pub struct RowNumber {
    next: i64,
}

impl WindowFunction for RowNumber {
    fn reset_partition(&mut self, _partition: Arc<dyn WindowPartition>) -> WindowResult<()> {
        self.next = 1;
        Ok(())
    }

    fn apply(
        &mut self,
        frames: &WindowFrameBuffers<'_>,
        result_offset: usize,
        result: &mut Column,
    ) -> WindowResult<()> {
        for i in 0..frames.num_rows() {
            result.set(result_offset + i, Value::Int(self.next))?;
            self.next += 1;
        }
        Ok(())
    }
}

/// `rank()`
#[derive(Debug, Default)]
pub struct Rank;

impl WindowFunction for Rank {
    fn reset_partition(&mut self, _partition: Arc<dyn WindowPartition>) -> WindowResult<()> {
        Ok(())
    }

    fn apply(
        &mut self,
        frames: &WindowFrameBuffers<'_>,
        result_offset: usize,
        result: &mut Column,
    ) -> WindowResult<()> {
        for (i, peer_start) in frames.peer_starts.iter().enumerate() {
            result.set(result_offset + i, Value::Int(peer_start + 1))?;
        }
        Ok(())
    }
}

/// `dense_rank()`
#[derive(Debug)]
pub struct DenseRank {
    rank: i64,
    current_peer_start: i64,
}

impl Default for DenseRank {
    fn default() -> Self {
        Self { rank: 0, current_peer_start: -1 }
    }
}

impl WindowFunction for DenseRank {
    fn reset_partition(&mut self, _partition: Arc<dyn WindowPartition>) -> WindowResult<()> {
        *self = Self::default();
        Ok(())
    }

    fn apply(
        &mut self,
        frames: &WindowFrameBuffers<'_>,
        result_offset: usize,
        result: &mut Column,
    ) -> WindowResult<()> {
        for (i, &peer_start) in frames.peer_starts.iter().enumerate() {
            if peer_start != self.current_peer_start {
                self.current_peer_start = peer_start;
                self.rank += 1;
            }
            result.set(result_offset + i, Value::Int(self.rank))?;
        }
        Ok(())
    }
}

pub(super) fn row_number(
    _ctx: &WindowFunctionContext<'_>,
) -> WindowResult<Box<dyn WindowFunction>> {
    Ok(Box::new(RowNumber::default()))
}

pub(super) fn rank(_ctx: &WindowFunctionContext<'_>) -> WindowResult<Box<dyn WindowFunction>> {
    Ok(Box::new(Rank))
}

pub(super) fn dense_rank(
    _ctx: &WindowFunctionContext<'_>,
) -> WindowResult<Box<dyn WindowFunction>> {
    Ok(Box::new(DenseRank::default()))
}

#[cfg(test)]
mod tests {
    use winframe_core::DataType;

    use super::super::test_support::{bigints, run};
    use crate::plan::{FrameBound, FrameDefinition, OffsetExpr};

    use super::*;

    fn ranks(name: &str, keys: &[i64], batch: usize) -> Vec<Value> {
        run(
            name,
            &[],
            DataType::BigInt,
            false,
            &FrameDefinition::default(),
            vec![bigints(keys)],
            vec![0],
            batch,
        )
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn row_number_counts_across_slices() {
        assert_eq!(ranks("row_number", &[5, 5, 6, 7, 7], 2), ints(&[1, 2, 3, 4, 5]));
    }

    #[test]
    fn rank_has_gaps_and_dense_rank_does_not() {
        let keys = [1, 1, 2, 3, 3, 3, 4];
        assert_eq!(ranks("rank", &keys, 3), ints(&[1, 1, 3, 4, 4, 4, 7]));
        assert_eq!(ranks("dense_rank", &keys, 3), ints(&[1, 1, 2, 3, 3, 3, 4]));
    }

    #[test]
    fn ranking_ignores_out_of_partition_frames() {
        let frame = FrameDefinition::rows(
            FrameBound::following(OffsetExpr::constant(10)),
            FrameBound::following(OffsetExpr::constant(12)),
        );
        let result = run(
            "rank",
            &[],
            DataType::BigInt,
            false,
            &frame,
            vec![bigints(&[1, 2, 2])],
            vec![0],
            8,
        );
        assert_eq!(result, ints(&[1, 2, 2]));
    }

    #[test]
    fn ranking_ignores_frames_before_the_partition() {
        let frame = FrameDefinition::rows(
            FrameBound::preceding(OffsetExpr::constant(5)),
            FrameBound::preceding(OffsetExpr::constant(3)),
        );
        let keys = [1, 1, 2, 3, 3, 3, 4];
        for (name, expected) in [
            ("row_number", ints(&[1, 2, 3, 4, 5, 6, 7])),
            ("rank", ints(&[1, 1, 3, 4, 4, 4, 7])),
            ("dense_rank", ints(&[1, 1, 2, 3, 3, 3, 4])),
        ] {
            let result = run(
                name,
                &[],
                DataType::BigInt,
                false,
                &frame,
                vec![bigints(&keys)],
                vec![0],
                3,
            );
            assert_eq!(result, expected, "{name}");
            assert_eq!(result, ranks(name, &keys, 3), "{name}");
        }
    }
}
