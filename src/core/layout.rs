//! Purpose: Fixed-stride table geometry and the address arithmetic built on it.
//! Exports: `TableLayout`, `TERMINATOR`.
//! Role: Pure layer shared by the scanner (producer), packer and accessors (consumers).
//! Invariants: `column_slot_starts` has `column_count + 1` entries, non-decreasing, last == `row_stride`.
//! Invariants: Each slot reserves one trailing terminator byte beyond its width.
//! Invariants: `row_stride * row_count + 1` fits in `usize` for every constructed layout.
use std::ops::Range;

use crate::core::error::{Error, ErrorKind};

/// Byte written after every value in the packed buffer.
pub const TERMINATOR: u8 = 0;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TableLayout {
    column_count: usize,
    row_count: usize,
    column_slot_starts: Vec<usize>,
    row_stride: usize,
    max_column_slot_width: usize,
}

impl TableLayout {
    /// Builds the layout from the longest value seen in each column.
    ///
    /// Slot `c` starts where slot `c - 1` ends plus its terminator, so the
    /// start of every column is the largest offset any row can reach at that
    /// boundary and a single stride serves all rows.
    pub fn from_column_widths(widths: &[usize], row_count: usize) -> Result<Self, Error> {
        let mut starts = Vec::new();
        starts
            .try_reserve_exact(widths.len() + 1)
            .map_err(|err| {
                Error::new(ErrorKind::Alloc)
                    .with_message("failed to allocate column slot starts")
                    .with_source(err)
            })?;
        starts.push(0);

        let mut cursor = 0usize;
        let mut max_width = 0usize;
        for &width in widths {
            cursor = cursor
                .checked_add(width)
                .and_then(|end| end.checked_add(1))
                .ok_or_else(too_large)?;
            starts.push(cursor);
            max_width = max_width.max(width);
        }

        cursor
            .checked_mul(row_count)
            .and_then(|len| len.checked_add(1))
            .ok_or_else(too_large)?;

        Ok(Self {
            column_count: widths.len(),
            row_count,
            column_slot_starts: starts,
            row_stride: cursor,
            max_column_slot_width: max_width,
        })
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_slot_starts(&self) -> &[usize] {
        &self.column_slot_starts
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn max_column_slot_width(&self) -> usize {
        self.max_column_slot_width
    }

    /// Size of the packed buffer: every row plus one final terminator.
    pub fn packed_len(&self) -> usize {
        self.row_stride * self.row_count + 1
    }

    pub fn slot_width(&self, column: usize) -> Result<usize, Error> {
        self.check_column(column)?;
        Ok(self.slot_width_unchecked(column))
    }

    pub fn slot_widths(&self) -> impl Iterator<Item = usize> + '_ {
        self.column_slot_starts
            .windows(2)
            .map(|pair| pair[1] - pair[0] - 1)
    }

    /// Value bytes of `column` relative to the start of a row, terminator excluded.
    pub fn slot_range(&self, column: usize) -> Result<Range<usize>, Error> {
        self.check_column(column)?;
        Ok(self.slot_range_unchecked(column))
    }

    pub fn row_range(&self, row: usize) -> Result<Range<usize>, Error> {
        self.check_row(row)?;
        let base = self.row_base(row);
        Ok(base..base + self.row_stride)
    }

    pub fn cell_range(&self, row: usize, column: usize) -> Result<Range<usize>, Error> {
        self.check_row(row)?;
        self.check_column(column)?;
        let base = self.row_base(row);
        let slot = self.slot_range_unchecked(column);
        Ok(base + slot.start..base + slot.end)
    }

    pub(crate) fn row_base(&self, row: usize) -> usize {
        self.row_stride * row
    }

    pub(crate) fn slot_width_unchecked(&self, column: usize) -> usize {
        self.column_slot_starts[column + 1] - self.column_slot_starts[column] - 1
    }

    pub(crate) fn slot_range_unchecked(&self, column: usize) -> Range<usize> {
        let start = self.column_slot_starts[column];
        start..start + self.slot_width_unchecked(column)
    }

    pub(crate) fn check_row(&self, row: usize) -> Result<(), Error> {
        if row >= self.row_count {
            return Err(Error::new(ErrorKind::IndexOutOfRange)
                .with_message(format!("row out of range (rows: {})", self.row_count))
                .with_row(row));
        }
        Ok(())
    }

    pub(crate) fn check_column(&self, column: usize) -> Result<(), Error> {
        if column >= self.column_count {
            return Err(Error::new(ErrorKind::IndexOutOfRange)
                .with_message(format!("column out of range (columns: {})", self.column_count))
                .with_column(column));
        }
        Ok(())
    }
}

fn too_large() -> Error {
    Error::new(ErrorKind::Alloc).with_message("table layout exceeds addressable size")
}
