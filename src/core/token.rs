// Byte-level tokenizer shared by the size scanner and the packer.
use crate::core::options::QuotedNewlines;

pub const DELIMITER: u8 = b',';
pub const QUOTE: u8 = b'"';
pub const ROW_TERMINATOR: u8 = b'\n';

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Token {
    Value(u8),
    FieldEnd,
    RowEnd,
}

#[derive(Debug)]
pub(crate) struct Tokenizer {
    quoted_newlines: QuotedNewlines,
    quoted: bool,
    row_open: bool,
    offset: u64,
}

impl Tokenizer {
    pub(crate) fn new(quoted_newlines: QuotedNewlines) -> Self {
        Self {
            quoted_newlines,
            quoted: false,
            row_open: false,
            offset: 0,
        }
    }

    /// Quote bytes toggle the quoted state and produce no token.
    pub(crate) fn feed(&mut self, byte: u8) -> Option<Token> {
        self.offset += 1;
        self.row_open = true;
        match byte {
            QUOTE => {
                self.quoted = !self.quoted;
                None
            }
            DELIMITER if !self.quoted => Some(Token::FieldEnd),
            ROW_TERMINATOR
                if !self.quoted || self.quoted_newlines == QuotedNewlines::EndRow =>
            {
                self.row_open = false;
                Some(Token::RowEnd)
            }
            _ => Some(Token::Value(byte)),
        }
    }

    /// Closes a final row that was not followed by a terminator.
    pub(crate) fn finish(&mut self) -> Option<Token> {
        if self.row_open {
            self.row_open = false;
            Some(Token::RowEnd)
        } else {
            None
        }
    }

    pub(crate) fn in_quotes(&self) -> bool {
        self.quoted
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }
}
