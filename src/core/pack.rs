//! Purpose: Second pass over a source; packs values into slots or hands them to a handler.
//! Exports: `pack_rows`, `dispatch_cells`.
//! Role: Consumer of a finished `TableLayout`; exactly one output mode per call.
//! Invariants: Every write lands inside the slot reserved for its (row, column).
//! Invariants: Cells missing from short rows are emitted as empty values.
//! Invariants: A source that disagrees with the layout fails with `Read`, never writes out of bounds.
use std::io::Read;

use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::handler::{CellHandler, CellRef};
use crate::core::layout::{TERMINATOR, TableLayout};
use crate::core::options::ParseOptions;
use crate::core::source;
use crate::core::token::{Token, Tokenizer};

/// Packs every value of `reader` into `buffer`, which must be
/// `layout.packed_len()` bytes long.
pub fn pack_rows<R: Read>(
    reader: R,
    layout: &TableLayout,
    options: &ParseOptions,
    buffer: &mut [u8],
) -> Result<(), Error> {
    if buffer.len() != layout.packed_len() {
        return Err(Error::new(ErrorKind::Internal).with_message(format!(
            "packed buffer is {} bytes, layout needs {}",
            buffer.len(),
            layout.packed_len()
        )));
    }
    let mut sink = PackSink { layout, buffer };
    walk(reader, layout, options, &mut sink)?;
    let end = layout.row_stride() * layout.row_count();
    sink.buffer[end] = TERMINATOR;
    Ok(())
}

/// Invokes `handler` once per cell, `row_count * column_count` times in total.
pub fn dispatch_cells<R: Read>(
    reader: R,
    layout: &TableLayout,
    options: &ParseOptions,
    handler: &mut dyn CellHandler,
) -> Result<(), Error> {
    let mut scratch = Vec::new();
    scratch
        .try_reserve_exact(layout.max_column_slot_width() + 1)
        .map_err(|err| {
            Error::new(ErrorKind::Alloc)
                .with_message("failed to allocate cell scratch buffer")
                .with_source(err)
        })?;
    handler.begin(layout).map_err(|err| handler_failure(err, None))?;
    let mut sink = HandlerSink {
        layout,
        handler,
        scratch,
    };
    walk(reader, layout, options, &mut sink)
}

trait CellSink {
    fn push_byte(&mut self, row: usize, column: usize, index: usize, byte: u8);
    fn finish_cell(&mut self, row: usize, column: usize, len: usize) -> Result<(), Error>;
}

struct PackSink<'a> {
    layout: &'a TableLayout,
    buffer: &'a mut [u8],
}

impl CellSink for PackSink<'_> {
    fn push_byte(&mut self, row: usize, column: usize, index: usize, byte: u8) {
        let at = self.layout.row_base(row) + self.layout.column_slot_starts()[column] + index;
        self.buffer[at] = byte;
    }

    fn finish_cell(&mut self, row: usize, column: usize, len: usize) -> Result<(), Error> {
        let at = self.layout.row_base(row) + self.layout.column_slot_starts()[column] + len;
        self.buffer[at] = TERMINATOR;
        Ok(())
    }
}

struct HandlerSink<'a> {
    layout: &'a TableLayout,
    handler: &'a mut dyn CellHandler,
    scratch: Vec<u8>,
}

impl CellSink for HandlerSink<'_> {
    fn push_byte(&mut self, _row: usize, _column: usize, _index: usize, byte: u8) {
        self.scratch.push(byte);
    }

    fn finish_cell(&mut self, row: usize, column: usize, len: usize) -> Result<(), Error> {
        let cell = CellRef {
            row,
            column,
            bytes: &self.scratch[..len],
        };
        self.handler
            .handle_cell(self.layout, cell)
            .map_err(|err| handler_failure(err, Some((row, column))))?;
        self.scratch.clear();
        Ok(())
    }
}

fn handler_failure(err: Error, at: Option<(usize, usize)>) -> Error {
    let mut out = if err.kind() == ErrorKind::Handler {
        err
    } else {
        Error::new(ErrorKind::Handler)
            .with_message("cell handler failed")
            .with_source(err)
    };
    if let Some((row, column)) = at {
        out = out.with_row(row).with_column(column);
    }
    out
}

fn walk<R: Read, S: CellSink>(
    reader: R,
    layout: &TableLayout,
    options: &ParseOptions,
    sink: &mut S,
) -> Result<(), Error> {
    let mut tokenizer = Tokenizer::new(options.quoted_newlines);
    let mut cursor = Cursor::new(layout, options.progress_interval);

    source::for_each_byte(reader, |byte| match tokenizer.feed(byte) {
        Some(token) => cursor.apply(token, tokenizer.offset(), sink),
        None => Ok(()),
    })?;
    if let Some(token) = tokenizer.finish() {
        cursor.apply(token, tokenizer.offset(), sink)?;
    }
    if cursor.row != layout.row_count() {
        return Err(source_changed(tokenizer.offset())
            .with_message(format!(
                "source changed between passes (rows: {} then {})",
                layout.row_count(),
                cursor.row
            )));
    }
    debug!(rows = cursor.row, "pack pass finished");
    Ok(())
}

struct Cursor<'a> {
    layout: &'a TableLayout,
    progress_interval: usize,
    row: usize,
    column: usize,
    field_len: usize,
}

impl<'a> Cursor<'a> {
    fn new(layout: &'a TableLayout, progress_interval: usize) -> Self {
        Self {
            layout,
            progress_interval,
            row: 0,
            column: 0,
            field_len: 0,
        }
    }

    fn apply<S: CellSink>(&mut self, token: Token, offset: u64, sink: &mut S) -> Result<(), Error> {
        match token {
            Token::Value(byte) => {
                self.check_cell(offset)?;
                if self.field_len >= self.layout.slot_width_unchecked(self.column) {
                    return Err(source_changed(offset).with_row(self.row).with_column(self.column));
                }
                sink.push_byte(self.row, self.column, self.field_len, byte);
                self.field_len += 1;
            }
            Token::FieldEnd => {
                self.close_cell(offset, sink)?;
                self.column += 1;
            }
            Token::RowEnd => {
                self.close_cell(offset, sink)?;
                for column in self.column + 1..self.layout.column_count() {
                    sink.finish_cell(self.row, column, 0)?;
                }
                self.row += 1;
                self.column = 0;
                if self.progress_interval > 0 && self.row % self.progress_interval == 0 {
                    debug!(
                        rows = self.row,
                        total = self.layout.row_count(),
                        "packing progress"
                    );
                }
            }
        }
        Ok(())
    }

    fn close_cell<S: CellSink>(&mut self, offset: u64, sink: &mut S) -> Result<(), Error> {
        self.check_cell(offset)?;
        sink.finish_cell(self.row, self.column, self.field_len)?;
        self.field_len = 0;
        Ok(())
    }

    fn check_cell(&self, offset: u64) -> Result<(), Error> {
        if self.row >= self.layout.row_count() || self.column >= self.layout.column_count() {
            return Err(source_changed(offset).with_row(self.row).with_column(self.column));
        }
        Ok(())
    }
}

fn source_changed(offset: u64) -> Error {
    Error::new(ErrorKind::Read)
        .with_message("source changed between passes")
        .with_offset(offset)
        .with_hint("Re-run the parse once the source is no longer being written.")
}
