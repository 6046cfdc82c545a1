//! Purpose: Per-column statistics gathered through the cell-handler path.
//! Exports: `ColumnStats`, `ColumnSummary`.
//! Role: Backs `slotcsv stats`; populates a typed structure without a packed buffer.
//! Invariants: One summary per layout column, sized in `begin`.

use bstr::ByteSlice;
use serde_json::{Value, json};
use slotcsv::api::{CellHandler, CellRef, Error, ErrorKind, TableLayout};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct ColumnSummary {
    pub non_empty: usize,
    pub longest: usize,
    pub integers: usize,
}

#[derive(Debug, Default)]
pub(crate) struct ColumnStats {
    columns: Vec<ColumnSummary>,
    cells: usize,
}

impl ColumnStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn columns(&self) -> &[ColumnSummary] {
        &self.columns
    }

    pub(crate) fn to_json(&self) -> Value {
        let columns = self
            .columns()
            .iter()
            .enumerate()
            .map(|(index, summary)| {
                json!({
                    "column": index,
                    "non_empty": summary.non_empty,
                    "longest": summary.longest,
                    "integers": summary.integers,
                })
            })
            .collect::<Vec<_>>();
        json!({ "cells": self.cells, "columns": columns })
    }
}

impl CellHandler for ColumnStats {
    fn begin(&mut self, layout: &TableLayout) -> Result<(), Error> {
        self.columns = vec![ColumnSummary::default(); layout.column_count()];
        self.cells = 0;
        Ok(())
    }

    fn handle_cell(&mut self, _layout: &TableLayout, cell: CellRef<'_>) -> Result<(), Error> {
        let Some(summary) = self.columns.get_mut(cell.column) else {
            return Err(Error::new(ErrorKind::Internal)
                .with_message("cell column outside layout")
                .with_column(cell.column));
        };
        self.cells += 1;
        if !cell.is_empty() {
            summary.non_empty += 1;
        }
        summary.longest = summary.longest.max(cell.len());
        if parse_integer(cell.bytes).is_some() {
            summary.integers += 1;
        }
        Ok(())
    }
}

fn parse_integer(bytes: &[u8]) -> Option<i64> {
    bytes.trim().to_str().ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{ColumnStats, ColumnSummary, parse_integer};
    use slotcsv::api::{Encoding, Table};

    #[test]
    fn integers_are_detected_after_trimming() {
        assert_eq!(parse_integer(b" 42 "), Some(42));
        assert_eq!(parse_integer(b"-7"), Some(-7));
        assert_eq!(parse_integer(b""), None);
        assert_eq!(parse_integer(b"4x"), None);
    }

    #[test]
    fn stats_cover_every_column() {
        let input = b"id,name,age\n1,ada,36\n2,,x\n3,grace\n";
        let mut table = Table::new(Encoding::Ascii);
        table.compute_sizes_from(&input[..]).expect("size");
        let mut stats = ColumnStats::new();
        table
            .parse_from(&input[..], Some(&mut stats))
            .expect("parse");

        assert_eq!(stats.columns().len(), 3);
        assert_eq!(
            stats.columns()[0],
            ColumnSummary {
                non_empty: 4,
                longest: 2,
                integers: 3,
            }
        );
        assert_eq!(stats.columns()[1].non_empty, 3);
        assert_eq!(stats.columns()[1].longest, 5);
        assert_eq!(stats.columns()[2].non_empty, 3);
        assert_eq!(stats.columns()[2].integers, 1);
        assert_eq!(stats.to_json()["cells"], 12);
    }
}
