//! Purpose: Parse-time configuration for the two-pass engine.
//! Exports: `ParseOptions`, `QuotedNewlines`, `SourceMode`, `DEFAULT_PROGRESS_INTERVAL`.
//! Role: Explicit inputs handed to the scanner and packer; no hidden global state.
//! Invariants: Both passes of one parse see the same options.
//! Invariants: Delimiter, quote and row terminator are fixed and not configurable here.
use serde::Serialize;

pub const DEFAULT_PROGRESS_INTERVAL: usize = 100_000;

/// How a line feed inside a quoted field is treated.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuotedNewlines {
    /// The line feed is part of the value.
    #[default]
    Content,
    /// The line feed ends the row even inside quotes. The quoted state is
    /// carried over into the next row unchanged.
    EndRow,
}

/// How the source file is read across the two passes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMode {
    /// Open and read the file once per pass.
    #[default]
    Reopen,
    /// Map the file once and scan the mapping in both passes.
    Mapped,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ParseOptions {
    pub quoted_newlines: QuotedNewlines,
    pub source: SourceMode,
    pub progress_interval: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            quoted_newlines: QuotedNewlines::default(),
            source: SourceMode::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quoted_newlines(mut self, quoted_newlines: QuotedNewlines) -> Self {
        self.quoted_newlines = quoted_newlines;
        self
    }

    pub fn with_source(mut self, source: SourceMode) -> Self {
        self.source = source;
        self
    }

    /// Rows between progress events during packing; `0` disables them.
    pub fn with_progress_interval(mut self, rows: usize) -> Self {
        self.progress_interval = rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PROGRESS_INTERVAL, ParseOptions, QuotedNewlines, SourceMode};

    #[test]
    fn defaults_are_corrected_quoting_and_reopen() {
        let options = ParseOptions::default();
        assert_eq!(options.quoted_newlines, QuotedNewlines::Content);
        assert_eq!(options.source, SourceMode::Reopen);
        assert_eq!(options.progress_interval, DEFAULT_PROGRESS_INTERVAL);
    }

    #[test]
    fn options_serialize_with_stable_names() {
        let options = ParseOptions::new()
            .with_quoted_newlines(QuotedNewlines::EndRow)
            .with_source(SourceMode::Mapped)
            .with_progress_interval(0);
        let value = serde_json::to_value(options).expect("serialize");
        assert_eq!(value["quoted_newlines"], "end-row");
        assert_eq!(value["source"], "mapped");
        assert_eq!(value["progress_interval"], 0);
    }
}
