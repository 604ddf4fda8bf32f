//! Absolute frame bounds for one side of a frame.

use super::offset::update_k_rows_frame_bounds;
use super::{FrameSide, WindowFrame};
use crate::error::{WindowError, WindowResult};
use crate::partition::WindowPartition;
use crate::plan::{BoundKind, FrameMode};

/// Writes the `side` bound of every row of the slice starting at partition
/// row `start_row` into `bounds`.
///
/// `peer_starts`/`peer_ends` must already hold the peer groups of the slice.
/// K bounds are written unclamped and may fall outside the partition.
pub fn update_frame_bounds(
    frame: &mut WindowFrame,
    side: FrameSide,
    partition: &dyn WindowPartition,
    start_row: usize,
    peer_starts: &[i64],
    peer_ends: &[i64],
    bounds: &mut [i64],
) -> WindowResult<()> {
    let mode = frame.mode();
    match frame.kind(side) {
        BoundKind::UnboundedPreceding => bounds.fill(0),
        BoundKind::UnboundedFollowing => bounds.fill(partition.num_rows() as i64 - 1),
        BoundKind::CurrentRow => match mode {
            FrameMode::Range => {
                let peers = if side == FrameSide::Start { peer_starts } else { peer_ends };
                bounds.copy_from_slice(&peers[..bounds.len()]);
            }
            FrameMode::Rows => {
                for (i, bound) in bounds.iter_mut().enumerate() {
                    *bound = (start_row + i) as i64;
                }
            }
        },
        kind @ (BoundKind::Preceding | BoundKind::Following) => {
            if mode == FrameMode::Range {
                return Err(WindowError::Unsupported(
                    "k frame bounds are only supported in ROWS mode".to_string(),
                ));
            }
            let arg = frame.offset_mut(side).ok_or_else(|| {
                WindowError::InvalidState(format!("{kind:?} bound has no offset"))
            })?;
            update_k_rows_frame_bounds(
                kind == BoundKind::Preceding,
                arg,
                partition,
                start_row,
                bounds,
            )?;
        }
    }
    Ok(())
}
