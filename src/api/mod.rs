//! Purpose: Define the stable public Rust API boundary for slotcsv.
//! Exports: Table lifecycle, accessors, handler capability, options and errors.
//! Role: Public, additive-only surface used by the CLI and integration tests.
//! Invariants: Tokenizer and source plumbing stay internal to `core`.

pub use crate::core::encoding::Encoding;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::handler::{CellHandler, CellRef};
pub use crate::core::layout::{TERMINATOR, TableLayout};
pub use crate::core::options::{DEFAULT_PROGRESS_INTERVAL, ParseOptions, QuotedNewlines, SourceMode};
pub use crate::core::pack::{dispatch_cells, pack_rows};
pub use crate::core::scan::scan_layout;
pub use crate::core::table::{RowView, Table};
pub use crate::core::token::{DELIMITER, QUOTE, ROW_TERMINATOR};
