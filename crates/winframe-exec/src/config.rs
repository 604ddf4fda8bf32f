//! Window operator configuration.

use serde::{Deserialize, Serialize};

/// Default target size of one output batch, in bytes.
const DEFAULT_OUTPUT_BATCH_BYTES: usize = 10 << 20;
/// Default output batch row count when no row size estimate is available.
const DEFAULT_OUTPUT_BATCH_ROWS: usize = 1024;
/// Default upper bound on output batch rows.
const DEFAULT_MAX_OUTPUT_BATCH_ROWS: usize = 10_000;

/// Configuration parameters for the window operator.
///
/// # Parameters
///
/// * `preferred_output_batch_bytes` - Target byte size of an output batch.
///   Divided by the estimated row size to obtain the row budget.
///
/// * `preferred_output_batch_rows` - Row budget used when the row size
///   estimate is zero.
///
/// * `max_output_batch_rows` - Upper bound on the row budget. Peer, frame
///   and validity scratch buffers are sized to the resulting budget once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Target size of one output batch in bytes.
    pub preferred_output_batch_bytes: usize,
    /// Output batch rows when the row size is unknown.
    pub preferred_output_batch_rows: usize,
    /// Maximum output batch rows.
    pub max_output_batch_rows: usize,
}

impl WindowConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preferred output batch size in bytes.
    #[must_use]
    pub const fn with_preferred_output_batch_bytes(mut self, bytes: usize) -> Self {
        self.preferred_output_batch_bytes = bytes;
        self
    }

    /// Set the preferred output batch row count.
    #[must_use]
    pub const fn with_preferred_output_batch_rows(mut self, rows: usize) -> Self {
        self.preferred_output_batch_rows = rows;
        self
    }

    /// Set the maximum output batch row count.
    #[must_use]
    pub const fn with_max_output_batch_rows(mut self, rows: usize) -> Self {
        self.max_output_batch_rows = rows;
        self
    }

    /// Returns the number of rows per output batch for rows of `row_size`
    /// estimated bytes. Always at least 1.
    #[must_use]
    pub fn output_batch_rows(&self, row_size: usize) -> usize {
        let max = self.max_output_batch_rows.max(1);
        if row_size == 0 {
            return self.preferred_output_batch_rows.clamp(1, max);
        }
        (self.preferred_output_batch_bytes / row_size).clamp(1, max)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            preferred_output_batch_bytes: DEFAULT_OUTPUT_BATCH_BYTES,
            preferred_output_batch_rows: DEFAULT_OUTPUT_BATCH_ROWS,
            max_output_batch_rows: DEFAULT_MAX_OUTPUT_BATCH_ROWS,
        }
    }
}
