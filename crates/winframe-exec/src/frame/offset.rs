//! K PRECEDING / K FOLLOWING offset resolution for ROWS frames.

use winframe_core::{CoreError, Value};

use super::FrameChannelArg;
use crate::error::{WindowError, WindowResult};
use crate::partition::WindowPartition;

/// Fills `bounds` with `row ± offset` for every row of the slice starting at
/// partition row `start_row`.
///
/// Preceding offsets are subtracted, following offsets added. Column offsets
/// are extracted once for the whole slice and validated before any bound is
/// written: a null or negative offset fails the slice.
pub fn update_k_rows_frame_bounds(
    is_preceding: bool,
    arg: &mut FrameChannelArg,
    partition: &dyn WindowPartition,
    start_row: usize,
    bounds: &mut [i64],
) -> WindowResult<()> {
    let num_rows = bounds.len();
    let start = start_row as i64;
    match arg {
        FrameChannelArg::Constant(offset) => {
            let first = if is_preceding {
                start.saturating_sub(*offset)
            } else {
                start.saturating_add(*offset)
            };
            for (i, bound) in bounds.iter_mut().enumerate() {
                *bound = first.saturating_add(i as i64);
            }
        }
        FrameChannelArg::Column { channel, scratch } => {
            partition.extract_column(*channel, start_row, num_rows, 0, scratch)?;
            let offsets = &scratch.values()[..num_rows];
            for value in offsets {
                match value {
                    Value::Null => return Err(WindowError::NullFrameOffset),
                    Value::Int(v) if *v < 0 => {
                        return Err(WindowError::NegativeFrameOffset { value: *v })
                    }
                    Value::Int(_) => {}
                    other => {
                        return Err(CoreError::type_mismatch_with_value(
                            scratch.data_type().name(),
                            other.type_name(),
                            other,
                        )
                        .into())
                    }
                }
            }
            for (i, (bound, value)) in bounds.iter_mut().zip(offsets).enumerate() {
                let offset = value.as_int().unwrap_or_default();
                let row = start + i as i64;
                *bound = if is_preceding {
                    row.saturating_sub(offset)
                } else {
                    row.saturating_add(offset)
                };
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use winframe_core::{Column, DataType};

    use super::*;
    use crate::partition::SortedPartition;

    fn partition(offsets: Vec<Value>) -> SortedPartition {
        let column = Column::from_values(DataType::BigInt, offsets).expect("offsets");
        SortedPartition::new(vec![column], vec![]).expect("partition")
    }

    fn column_arg() -> FrameChannelArg {
        FrameChannelArg::Column { channel: 0, scratch: Column::new(DataType::BigInt) }
    }

    #[test]
    fn constant_preceding_is_a_shifted_progression() {
        let part = partition(vec![Value::Int(0); 5]);
        let mut bounds = vec![0; 5];
        update_k_rows_frame_bounds(true, &mut FrameChannelArg::Constant(2), &part, 0, &mut bounds)
            .expect("bounds");
        assert_eq!(bounds, vec![-2, -1, 0, 1, 2]);
    }

    #[test]
    fn constant_following_starts_at_slice_offset() {
        let part = partition(vec![Value::Int(0); 8]);
        let mut bounds = vec![0; 3];
        update_k_rows_frame_bounds(false, &mut FrameChannelArg::Constant(3), &part, 4, &mut bounds)
            .expect("bounds");
        assert_eq!(bounds, vec![7, 8, 9]);
    }

    #[test]
    fn column_offsets_are_applied_per_row() {
        let part = partition([0, 1, 2, 0, 5].map(Value::Int).to_vec());
        let mut arg = column_arg();

        let mut bounds = vec![0; 3];
        update_k_rows_frame_bounds(true, &mut arg, &part, 2, &mut bounds).expect("bounds");
        assert_eq!(bounds, vec![0, 3, -1]);

        let mut bounds = vec![0; 2];
        update_k_rows_frame_bounds(false, &mut arg, &part, 0, &mut bounds).expect("bounds");
        assert_eq!(bounds, vec![0, 2]);
    }

    #[test]
    fn null_offset_fails_before_writing() {
        let part = partition(vec![Value::Int(1), Value::Int(1), Value::Null]);
        let mut bounds = vec![42; 3];
        let err = update_k_rows_frame_bounds(true, &mut column_arg(), &part, 0, &mut bounds)
            .expect_err("null offset");
        assert!(matches!(err, WindowError::NullFrameOffset));
        assert_eq!(bounds, vec![42, 42, 42]);
    }

    #[test]
    fn negative_offset_is_reported_with_value() {
        let part = partition(vec![Value::Int(1), Value::Int(-4)]);
        let mut bounds = vec![0; 2];
        let err = update_k_rows_frame_bounds(false, &mut column_arg(), &part, 0, &mut bounds)
            .expect_err("negative offset");
        assert_eq!(err.to_string(), "Window frame -4 offset must not be negative");
    }

    #[test]
    fn huge_offsets_saturate() {
        let part = partition(vec![Value::Int(i64::MAX); 2]);
        let mut bounds = vec![0; 2];
        update_k_rows_frame_bounds(false, &mut column_arg(), &part, 0, &mut bounds)
            .expect("bounds");
        assert_eq!(bounds, vec![i64::MAX, i64::MAX]);
    }
}
