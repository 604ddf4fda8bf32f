//! Frame compilation and per-slice frame resolution.
//!
//! # Modules
//!
//! - [`offset`] - K PRECEDING/FOLLOWING offsets, constant or per row
//! - [`bounds`] - Absolute frame bound indices for one side of a frame
//! - [`validity`] - Clamping and the validity selector for malformed frames
//! - [`buffers`] - Reusable peer, frame and validity scratch buffers

use winframe_core::{Column, Schema, Value};

use crate::error::{WindowError, WindowResult};
use crate::plan::{BoundKind, FrameBound, FrameDefinition, FrameMode, OffsetExpr};

pub mod bounds;
pub mod buffers;
pub mod offset;
pub mod validity;

pub use buffers::PeerAndFrameBuffers;
pub use validity::SelectivityVector;

/// Which side of a frame is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSide {
    /// The frame start.
    Start,
    /// The frame end.
    End,
}

/// A K PRECEDING/FOLLOWING offset, resolved once at setup.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameChannelArg {
    /// A validated non-negative literal.
    Constant(i64),
    /// An input column read per slice into a reusable scratch column.
    Column {
        /// Input channel of the offsets.
        channel: usize,
        /// Scratch buffer receiving the offsets of the current slice.
        scratch: Column,
    },
}

/// The compiled frame of one window function.
///
/// Invariant: `start`/`end` is present iff the matching bound kind is
/// K PRECEDING or K FOLLOWING, and K bounds only appear in ROWS mode.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    mode: FrameMode,
    start_kind: BoundKind,
    end_kind: BoundKind,
    start: Option<FrameChannelArg>,
    end: Option<FrameChannelArg>,
}

impl WindowFrame {
    /// Validates `definition` against the input schema and compiles it.
    pub fn compile(definition: &FrameDefinition, input_schema: &Schema) -> WindowResult<Self> {
        check_offset_presence(&definition.start, "start")?;
        check_offset_presence(&definition.end, "end")?;

        if definition.start.kind == BoundKind::UnboundedFollowing {
            return Err(WindowError::InvalidFrame(
                "frame start cannot be UNBOUNDED FOLLOWING".to_string(),
            ));
        }
        if definition.end.kind == BoundKind::UnboundedPreceding {
            return Err(WindowError::InvalidFrame(
                "frame end cannot be UNBOUNDED PRECEDING".to_string(),
            ));
        }

        if definition.mode == FrameMode::Range {
            for bound in [&definition.start, &definition.end] {
                match bound.kind {
                    BoundKind::Preceding => {
                        return Err(WindowError::Unsupported(
                            "k preceding frame is only supported in ROWS mode".to_string(),
                        ))
                    }
                    BoundKind::Following => {
                        return Err(WindowError::Unsupported(
                            "k following frame is only supported in ROWS mode".to_string(),
                        ))
                    }
                    _ => {}
                }
            }
        }

        Ok(Self {
            mode: definition.mode,
            start_kind: definition.start.kind,
            end_kind: definition.end.kind,
            start: compile_offset(definition.start.value.as_ref(), input_schema)?,
            end: compile_offset(definition.end.value.as_ref(), input_schema)?,
        })
    }

    /// Returns the framing mode.
    #[must_use]
    pub const fn mode(&self) -> FrameMode {
        self.mode
    }

    /// Returns the bound kind of `side`.
    #[must_use]
    pub const fn kind(&self, side: FrameSide) -> BoundKind {
        match side {
            FrameSide::Start => self.start_kind,
            FrameSide::End => self.end_kind,
        }
    }

    /// Returns the offset argument of `side`, if it is a K bound.
    #[must_use]
    pub const fn offset(&self, side: FrameSide) -> Option<&FrameChannelArg> {
        match side {
            FrameSide::Start => self.start.as_ref(),
            FrameSide::End => self.end.as_ref(),
        }
    }

    pub(crate) fn offset_mut(&mut self, side: FrameSide) -> Option<&mut FrameChannelArg> {
        match side {
            FrameSide::Start => self.start.as_mut(),
            FrameSide::End => self.end.as_mut(),
        }
    }

    /// Returns true if either side is K PRECEDING/FOLLOWING, the only frames
    /// that can fall outside the partition or invert.
    #[must_use]
    pub const fn has_offset_bound(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

fn check_offset_presence(bound: &FrameBound, side: &str) -> WindowResult<()> {
    match (bound.kind.has_offset(), bound.value.is_some()) {
        (true, false) => Err(WindowError::InvalidFrame(format!(
            "frame {side} bound {:?} requires an offset",
            bound.kind
        ))),
        (false, true) => Err(WindowError::InvalidFrame(format!(
            "frame {side} bound {:?} does not take an offset",
            bound.kind
        ))),
        _ => Ok(()),
    }
}

fn compile_offset(
    offset: Option<&OffsetExpr>,
    input_schema: &Schema,
) -> WindowResult<Option<FrameChannelArg>> {
    let Some(offset) = offset else {
        return Ok(None);
    };
    if !offset.data_type().is_integral() {
        return Err(WindowError::InvalidFrame(
            "k frame bound must be INTEGER or BIGINT type".to_string(),
        ));
    }
    match offset {
        OffsetExpr::Constant { value, .. } => match value {
            Value::Null => Err(WindowError::NullFrameOffset),
            Value::Int(v) if *v < 0 => Err(WindowError::NegativeFrameOffset { value: *v }),
            Value::Int(v) => Ok(Some(FrameChannelArg::Constant(*v))),
            other => Err(WindowError::InvalidFrame(format!(
                "k frame bound must be INTEGER or BIGINT type, got {}",
                other.type_name()
            ))),
        },
        OffsetExpr::Column { channel, .. } => {
            let field = input_schema.field(*channel).ok_or(WindowError::InvalidChannel {
                channel: *channel,
                num_columns: input_schema.len(),
            })?;
            if !field.data_type().is_integral() {
                return Err(WindowError::InvalidFrame(format!(
                    "k frame bound must be INTEGER or BIGINT type, column '{}' is {}",
                    field.name(),
                    field.data_type()
                )));
            }
            Ok(Some(FrameChannelArg::Column {
                channel: *channel,
                scratch: Column::new(field.data_type()),
            }))
        }
    }
}
