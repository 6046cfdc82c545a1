//! Purpose: First pass over a source; derives the fixed-stride table layout.
//! Exports: `scan_layout`.
//! Role: Producer of `TableLayout`; must complete before any packing starts.
//! Invariants: Consumes the whole source exactly once; holds O(columns) state.
//! Invariants: Every column's slot fits the longest value observed in it, in any row.
//! Invariants: The final unterminated record counts as a row; a trailing terminator adds none.
use std::io::Read;

use tracing::{debug, warn};

use crate::core::error::{Error, ErrorKind};
use crate::core::layout::TableLayout;
use crate::core::options::ParseOptions;
use crate::core::source;
use crate::core::token::{Token, Tokenizer};

pub fn scan_layout<R: Read>(reader: R, options: &ParseOptions) -> Result<TableLayout, Error> {
    let mut state = ScanState::default();
    let mut tokenizer = Tokenizer::new(options.quoted_newlines);

    source::for_each_byte(reader, |byte| match tokenizer.feed(byte) {
        Some(token) => state.apply(token),
        None => Ok(()),
    })?;
    if let Some(token) = tokenizer.finish() {
        state.apply(token)?;
    }
    if tokenizer.in_quotes() {
        warn!(
            offset = tokenizer.offset(),
            "source ended inside a quoted field"
        );
    }

    let layout = TableLayout::from_column_widths(&state.widths, state.rows)?;
    debug!(
        rows = layout.row_count(),
        columns = layout.column_count(),
        row_stride = layout.row_stride(),
        longest_row = state.longest_row,
        "size scan finished"
    );
    Ok(layout)
}

#[derive(Debug, Default)]
struct ScanState {
    widths: Vec<usize>,
    column: usize,
    field_len: usize,
    row_len: usize,
    longest_row: usize,
    rows: usize,
}

impl ScanState {
    fn apply(&mut self, token: Token) -> Result<(), Error> {
        match token {
            Token::Value(_) => {
                self.field_len += 1;
                self.row_len += 1;
            }
            Token::FieldEnd => {
                self.close_field()?;
                self.column += 1;
                self.row_len += 1;
            }
            Token::RowEnd => {
                self.close_field()?;
                self.longest_row = self.longest_row.max(self.row_len + 1);
                self.rows += 1;
                self.column = 0;
                self.row_len = 0;
            }
        }
        Ok(())
    }

    fn close_field(&mut self) -> Result<(), Error> {
        if self.column == self.widths.len() {
            self.widths.try_reserve(1).map_err(|err| {
                Error::new(ErrorKind::Alloc)
                    .with_message("failed to grow column widths")
                    .with_column(self.column)
                    .with_source(err)
            })?;
            self.widths.push(0);
        }
        let width = &mut self.widths[self.column];
        *width = (*width).max(self.field_len);
        self.field_len = 0;
        Ok(())
    }
}
