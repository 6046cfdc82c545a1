//! Purpose: Typed per-cell capability used by custom-handler parsing.
//! Exports: `CellHandler`, `CellRef`.
//! Role: Lets callers populate their own structures instead of the packed buffer.
//! Invariants: Cell bytes are borrowed from engine scratch space and valid only for one call.
//! Invariants: A handler error aborts the parse; the engine never retries a cell.
use bstr::{BStr, ByteSlice};

use crate::core::error::Error;
use crate::core::layout::TableLayout;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellRef<'a> {
    pub row: usize,
    pub column: usize,
    pub bytes: &'a [u8],
}

impl<'a> CellRef<'a> {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bstr(&self) -> &'a BStr {
        self.bytes.as_bstr()
    }
}

/// Receives every cell of a parse in row-major, left-to-right order.
///
/// Implemented for any `FnMut(&TableLayout, CellRef<'_>) -> Result<(), Error>`.
pub trait CellHandler {
    /// Called once, after sizing and before the first cell.
    fn begin(&mut self, _layout: &TableLayout) -> Result<(), Error> {
        Ok(())
    }

    fn handle_cell(&mut self, layout: &TableLayout, cell: CellRef<'_>) -> Result<(), Error>;
}

impl<F> CellHandler for F
where
    F: FnMut(&TableLayout, CellRef<'_>) -> Result<(), Error>,
{
    fn handle_cell(&mut self, layout: &TableLayout, cell: CellRef<'_>) -> Result<(), Error> {
        self(layout, cell)
    }
}
