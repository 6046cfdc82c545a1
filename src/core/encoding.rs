//! Purpose: Closed set of source encodings and their nominal unit widths.
//! Exports: `Encoding`.
//! Role: Metadata recorded on a `Table` at construction time.
//! Invariants: The width mapping is a pure function; there is no mutable registry.
//! Invariants: Scanning is single-byte for every encoding; `unit_width` never drives it.
use serde::Serialize;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Ascii,
    Utf8,
    Utf16,
}

impl Encoding {
    /// Nominal width of one logical character. Descriptive only: both passes
    /// treat the source as a stream of single bytes.
    pub const fn unit_width(self) -> usize {
        match self {
            Encoding::Ascii => 1,
            Encoding::Utf8 => 8,
            Encoding::Utf16 => 16,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::Utf8 => "utf8",
            Encoding::Utf16 => "utf16",
        }
    }

    pub fn parse(input: &str) -> Result<Self, Error> {
        match input.trim().to_ascii_lowercase().as_str() {
            "ascii" => Ok(Self::Ascii),
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "utf16" | "utf-16" => Ok(Self::Utf16),
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unknown encoding {input:?}"))
                .with_hint("Use one of: ascii, utf8, utf16.")),
        }
    }
}
