//! Frame validity tracking.
//!
//! K PRECEDING/FOLLOWING frames can invert or fall entirely outside the
//! partition. Such rows are flagged in a [`SelectivityVector`] so functions
//! can emit their empty-frame result; every other frame is clamped to the
//! partition.

/// A per-row selection over `[0, size)` with a cached selected range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectivityVector {
    bits: Vec<bool>,
    begin: usize,
    end: usize,
}

impl SelectivityVector {
    /// Creates a vector of `size` rows, all selected.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let mut vector = Self::default();
        vector.resize_fill(size, true);
        vector
    }

    /// Resizes to `size` rows and sets every row to `value`.
    pub fn resize_fill(&mut self, size: usize, value: bool) {
        self.bits.clear();
        self.bits.resize(size, value);
        self.update_bounds();
    }

    /// Selects or deselects one row. Call [`update_bounds`](Self::update_bounds)
    /// after a series of changes.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    pub fn set_valid(&mut self, row: usize, valid: bool) {
        self.bits[row] = valid;
    }

    /// Returns true if `row` is selected. Rows out of range are not.
    #[must_use]
    pub fn is_valid(&self, row: usize) -> bool {
        self.bits.get(row).copied().unwrap_or(false)
    }

    /// Recomputes the cached selected range.
    pub fn update_bounds(&mut self) {
        self.begin = self.bits.iter().position(|&b| b).unwrap_or(0);
        self.end = self.bits.iter().rposition(|&b| b).map_or(0, |last| last + 1);
    }

    /// First selected row, or 0 if none.
    #[must_use]
    pub const fn begin(&self) -> usize {
        self.begin
    }

    /// One past the last selected row, or 0 if none.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of rows covered, selected or not.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    /// Number of selected rows.
    #[must_use]
    pub fn count_selected(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Returns true if every row is selected.
    #[must_use]
    pub fn is_all_selected(&self) -> bool {
        self.bits.iter().all(|&b| b)
    }

    /// Iterates the selected row indices in order.
    pub fn iter_selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits[self.begin..self.end.max(self.begin)]
            .iter()
            .enumerate()
            .filter_map(move |(i, &b)| b.then_some(self.begin + i))
    }
}

/// Clamps the frames of one slice to `[0, last_row]` and flags the rows whose
/// frame is empty.
///
/// A frame is kept iff `start <= end`, `end >= 0` and `start <= last_row`;
/// kept frames get `start = max(start, 0)` and `end = min(end, last_row)`.
/// Other rows are deselected in `valid` and their bounds left untouched.
/// `valid` must already cover the slice with every row selected.
pub fn compute_valid_frames(
    last_row: i64,
    frame_starts: &mut [i64],
    frame_ends: &mut [i64],
    valid: &mut SelectivityVector,
) {
    for (row, (start, end)) in frame_starts.iter_mut().zip(frame_ends.iter_mut()).enumerate() {
        if *start <= *end && *end >= 0 && *start <= last_row {
            *start = (*start).max(0);
            *end = (*end).min(last_row);
        } else {
            valid.set_valid(row, false);
        }
    }
    valid.update_bounds();
}
