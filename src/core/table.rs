//! Purpose: Table lifecycle (init, size, parse, deinit) and O(1) cell/row accessors.
//! Exports: `Table`, `RowView`.
//! Role: Owner of the layout and the packed byte arena; entry point for callers.
//! Invariants: Accessors never allocate or perform I/O; they return bounds-checked sub-slices.
//! Invariants: A table holds a packed buffer or was dispatched to a handler, never both.
//! Invariants: Re-sizing or re-parsing releases previously owned buffers first.
use std::fmt;
use std::io::Read;
use std::path::Path;

use bstr::ByteSlice;
use tracing::{debug, info};

use crate::core::encoding::Encoding;
use crate::core::error::{Error, ErrorKind};
use crate::core::handler::CellHandler;
use crate::core::layout::{TERMINATOR, TableLayout};
use crate::core::options::{ParseOptions, SourceMode};
use crate::core::pack::{dispatch_cells, pack_rows};
use crate::core::scan::scan_layout;
use crate::core::source;

enum Storage {
    Empty,
    Packed(Vec<u8>),
    Dispatched,
}

pub struct Table {
    encoding: Encoding,
    options: ParseOptions,
    layout: Option<TableLayout>,
    storage: Storage,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(Encoding::default())
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = match &self.storage {
            Storage::Empty => "empty".to_string(),
            Storage::Packed(buffer) => format!("packed({} bytes)", buffer.len()),
            Storage::Dispatched => "dispatched".to_string(),
        };
        f.debug_struct("Table")
            .field("encoding", &self.encoding)
            .field("options", &self.options)
            .field("layout", &self.layout)
            .field("storage", &storage)
            .finish()
    }
}

impl Table {
    pub fn new(encoding: Encoding) -> Self {
        Self::with_options(encoding, ParseOptions::default())
    }

    pub fn with_options(encoding: Encoding, options: ParseOptions) -> Self {
        Self {
            encoding,
            options,
            layout: None,
            storage: Storage::Empty,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn unit_width(&self) -> usize {
        self.encoding.unit_width()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn layout(&self) -> Option<&TableLayout> {
        self.layout.as_ref()
    }

    pub fn column_count(&self) -> usize {
        self.layout.as_ref().map_or(0, TableLayout::column_count)
    }

    pub fn row_count(&self) -> usize {
        self.layout.as_ref().map_or(0, TableLayout::row_count)
    }

    pub fn row_stride(&self) -> usize {
        self.layout.as_ref().map_or(0, TableLayout::row_stride)
    }

    pub fn max_column_slot_width(&self) -> usize {
        self.layout
            .as_ref()
            .map_or(0, TableLayout::max_column_slot_width)
    }

    pub fn column_slot_starts(&self) -> &[usize] {
        self.layout
            .as_ref()
            .map(TableLayout::column_slot_starts)
            .unwrap_or(&[])
    }

    pub fn slot_width(&self, column: usize) -> Result<usize, Error> {
        self.sized()?.slot_width(column)
    }

    pub fn is_packed(&self) -> bool {
        matches!(self.storage, Storage::Packed(_))
    }

    pub fn packed_buffer(&self) -> Option<&[u8]> {
        match &self.storage {
            Storage::Packed(buffer) => Some(buffer.as_slice()),
            _ => None,
        }
    }

    /// Runs the size scan over the file at `path`. Must precede `parse`.
    pub fn compute_sizes(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let result = match self.options.source {
            SourceMode::Reopen => {
                let file = source::open(path)?;
                self.compute_sizes_from(file)
            }
            SourceMode::Mapped => {
                let mapped = source::map(path)?;
                self.compute_sizes_from(mapped.bytes())
            }
        };
        result.map_err(|err| err.with_path(path))
    }

    pub fn compute_sizes_from<R: Read>(&mut self, reader: R) -> Result<(), Error> {
        self.deinit();
        debug!(encoding = self.encoding.as_str(), "size scan started");
        self.layout = Some(scan_layout(reader, &self.options)?);
        Ok(())
    }

    /// Runs the packing pass over the file at `path`. With a handler every
    /// cell goes to it and no packed buffer is kept; without one the values
    /// are packed and the accessors become usable.
    pub fn parse(
        &mut self,
        path: impl AsRef<Path>,
        handler: Option<&mut dyn CellHandler>,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        self.sized()?;
        let result = match self.options.source {
            SourceMode::Reopen => {
                let file = source::open(path)?;
                self.parse_from(file, handler)
            }
            SourceMode::Mapped => {
                let mapped = source::map(path)?;
                self.parse_from(mapped.bytes(), handler)
            }
        };
        result.map_err(|err| err.with_path(path))
    }

    pub fn parse_from<R: Read>(
        &mut self,
        reader: R,
        handler: Option<&mut dyn CellHandler>,
    ) -> Result<(), Error> {
        let Some(layout) = self.layout.as_ref() else {
            return Err(not_sized());
        };
        self.storage = Storage::Empty;

        let result = match handler {
            Some(handler) => dispatch_cells(reader, layout, &self.options, handler)
                .map(|()| Storage::Dispatched),
            None => allocate_packed(layout.packed_len()).and_then(|mut buffer| {
                pack_rows(reader, layout, &self.options, &mut buffer)
                    .map(|()| Storage::Packed(buffer))
            }),
        };

        let storage = result?;
        info!(
            rows = layout.row_count(),
            columns = layout.column_count(),
            packed = matches!(storage, Storage::Packed(_)),
            "parse finished"
        );
        self.storage = storage;
        Ok(())
    }

    /// Sizes and packs the file at `path` with no handler.
    pub fn parse_default(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        match self.options.source {
            SourceMode::Reopen => {
                self.compute_sizes(path)?;
                self.parse(path, None)
            }
            SourceMode::Mapped => {
                let mapped = source::map(path)?;
                self.parse_default_bytes(mapped.bytes())
                    .map_err(|err| err.with_path(path))
            }
        }
    }

    pub fn parse_default_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.compute_sizes_from(bytes)?;
        self.parse_from(bytes, None)
    }

    pub fn get_cell(&self, row: usize, column: usize) -> Result<&[u8], Error> {
        let (layout, buffer) = self.packed()?;
        let range = layout.cell_range(row, column)?;
        Ok(trim_value(&buffer[range]))
    }

    pub fn get_row(&self, row: usize) -> Result<RowView<'_>, Error> {
        let (layout, buffer) = self.packed()?;
        let range = layout.row_range(row)?;
        Ok(RowView {
            index: row,
            layout,
            bytes: &buffer[range],
        })
    }

    pub fn get_row_cell<'a>(&self, row: &RowView<'a>, column: usize) -> Result<&'a [u8], Error> {
        self.sized()?
            .check_column(column)
            .map_err(|err| err.with_row(row.index))?;
        row.cell(column)
    }

    /// Releases the layout and any packed buffer. The table can be sized again.
    pub fn deinit(&mut self) {
        self.layout = None;
        self.storage = Storage::Empty;
    }

    fn sized(&self) -> Result<&TableLayout, Error> {
        self.layout.as_ref().ok_or_else(not_sized)
    }

    fn packed(&self) -> Result<(&TableLayout, &[u8]), Error> {
        match (&self.layout, &self.storage) {
            (Some(layout), Storage::Packed(buffer)) => Ok((layout, buffer.as_slice())),
            (_, Storage::Dispatched) => Err(Error::new(ErrorKind::Usage)
                .with_message("table was parsed with a cell handler and has no packed buffer")),
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message("table has not been parsed")
                .with_hint("Call parse_default, or compute_sizes then parse without a handler.")),
        }
    }
}

/// One row of a packed table at fixed stride.
#[derive(Clone, Copy, Debug)]
pub struct RowView<'a> {
    index: usize,
    layout: &'a TableLayout,
    bytes: &'a [u8],
}

impl<'a> RowView<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn column_count(&self) -> usize {
        self.layout.column_count()
    }

    pub fn cell(&self, column: usize) -> Result<&'a [u8], Error> {
        let range = self
            .layout
            .slot_range(column)
            .map_err(|err| err.with_row(self.index))?;
        Ok(trim_value(&self.bytes[range]))
    }

    pub fn cells(self) -> impl Iterator<Item = &'a [u8]> {
        let RowView { layout, bytes, .. } = self;
        (0..layout.column_count()).map(move |column| {
            trim_value(&bytes[layout.slot_range_unchecked(column)])
        })
    }
}

fn trim_value(slot: &[u8]) -> &[u8] {
    match slot.find_byte(TERMINATOR) {
        Some(end) => &slot[..end],
        None => slot,
    }
}

fn allocate_packed(len: usize) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|err| {
        Error::new(ErrorKind::Alloc)
            .with_message(format!("failed to allocate {len} byte packed buffer"))
            .with_source(err)
    })?;
    buffer.resize(len, TERMINATOR);
    Ok(buffer)
}

fn not_sized() -> Error {
    Error::new(ErrorKind::Usage)
        .with_message("table has not been sized")
        .with_hint("Call compute_sizes before parse.")
}
