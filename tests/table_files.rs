// File-backed table tests: both source modes, typed handlers, randomized layouts.
use std::fs;
use std::path::{Path, PathBuf};

use slotcsv::api::{
    CellRef, Encoding, Error, ErrorKind, ParseOptions, SourceMode, Table, TableLayout,
};

fn write_csv(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write csv");
    path
}

fn new_table(source: SourceMode) -> Table {
    Table::with_options(Encoding::Ascii, ParseOptions::new().with_source(source))
}

#[test]
fn reopen_and_mapped_sources_pack_identically() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_csv(
        temp.path(),
        "people.csv",
        b"name,city,age\n\"Lovelace, Ada\",London,36\nHopper,,85\n",
    );

    let mut reopen = new_table(SourceMode::Reopen);
    reopen.parse_default(&path).expect("reopen parse");
    let mut mapped = new_table(SourceMode::Mapped);
    mapped.parse_default(&path).expect("mapped parse");

    assert_eq!(reopen.layout(), mapped.layout());
    assert_eq!(reopen.packed_buffer(), mapped.packed_buffer());
    assert_eq!(reopen.get_cell(1, 0).expect("cell"), b"Lovelace, Ada");
    assert_eq!(mapped.get_cell(2, 1).expect("cell"), b"");
    assert_eq!(mapped.get_cell(2, 2).expect("cell"), b"85");
}

#[test]
fn two_pass_calls_work_separately() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_csv(temp.path(), "grid.csv", b"a,bb\nccc,d");

    let mut table = new_table(SourceMode::Reopen);
    table.compute_sizes(&path).expect("size");
    assert_eq!(table.row_count(), 2);
    assert!(!table.is_packed());
    table.parse(&path, None).expect("parse");
    assert!(table.is_packed());

    let row = table.get_row(1).expect("row");
    assert_eq!(table.get_row_cell(&row, 0).expect("cell"), b"ccc");
    assert_eq!(table.get_row_cell(&row, 1).expect("cell"), b"d");
}

#[test]
fn missing_file_fails_to_open() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("absent.csv");

    for source in [SourceMode::Reopen, SourceMode::Mapped] {
        let mut table = new_table(source);
        let err = table.compute_sizes(&path).expect_err("missing file");
        assert_eq!(err.kind(), ErrorKind::Open);
        assert_eq!(err.path(), Some(path.as_path()));
        assert!(table.layout().is_none());
    }
}

#[test]
fn empty_file_parses_to_empty_table() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_csv(temp.path(), "empty.csv", b"");

    for source in [SourceMode::Reopen, SourceMode::Mapped] {
        let mut table = new_table(source);
        table.parse_default(&path).expect("parse");
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
        let err = table.get_cell(0, 0).expect_err("no cells");
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
    }
}

#[derive(Debug, Default, PartialEq)]
struct Reading {
    station: String,
    hour: u32,
    millimetres: i64,
}

fn parse_number<T: std::str::FromStr>(cell: CellRef<'_>) -> Result<T, Error> {
    let text = std::str::from_utf8(cell.bytes)
        .map_err(|err| Error::new(ErrorKind::Handler).with_source(err))?;
    text.trim().parse().map_err(|_| {
        Error::new(ErrorKind::Handler).with_message(format!("expected a number, found {text:?}"))
    })
}

#[test]
fn handler_populates_typed_records() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_csv(
        temp.path(),
        "rain.csv",
        b"north,0,12\nnorth,1,0\n\"south, upper\",0,-3\n",
    );

    let mut table = new_table(SourceMode::Reopen);
    table.compute_sizes(&path).expect("size");
    let mut readings: Vec<Reading> = Vec::new();
    let mut handler = |_layout: &TableLayout, cell: CellRef<'_>| -> Result<(), Error> {
        if cell.column == 0 {
            readings.push(Reading::default());
        }
        let Some(reading) = readings.last_mut() else {
            return Err(Error::new(ErrorKind::Internal).with_message("cell before row start"));
        };
        match cell.column {
            0 => reading.station = String::from_utf8_lossy(cell.bytes).into_owned(),
            1 => reading.hour = parse_number(cell)?,
            _ => reading.millimetres = parse_number(cell)?,
        }
        Ok(())
    };
    table.parse(&path, Some(&mut handler)).expect("parse");

    assert_eq!(readings.len(), 3);
    assert_eq!(
        readings[2],
        Reading {
            station: "south, upper".to_string(),
            hour: 0,
            millimetres: -3,
        }
    );
    assert!(!table.is_packed());
    let err = table.get_cell(0, 0).expect_err("no buffer in handler mode");
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[test]
fn handler_error_reports_failing_cell() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_csv(temp.path(), "rain.csv", b"north,0,12\nnorth,1,lots\n");

    let mut table = new_table(SourceMode::Mapped);
    table.compute_sizes(&path).expect("size");
    let mut handler = |_layout: &TableLayout, cell: CellRef<'_>| -> Result<(), Error> {
        if cell.column > 0 {
            parse_number::<i64>(cell)?;
        }
        Ok(())
    };
    let err = table
        .parse(&path, Some(&mut handler))
        .expect_err("bad number");
    assert_eq!(err.kind(), ErrorKind::Handler);
    assert_eq!(err.row(), Some(1));
    assert_eq!(err.column(), Some(2));
    assert_eq!(err.path(), Some(path.as_path()));
}

#[test]
fn handler_sees_every_cell_of_ragged_rows() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_csv(temp.path(), "ragged.csv", b"a\nb,c,d\ne,f\n");

    let mut table = new_table(SourceMode::Reopen);
    table.compute_sizes(&path).expect("size");
    let mut seen = Vec::new();
    let mut handler = |_layout: &TableLayout, cell: CellRef<'_>| -> Result<(), Error> {
        seen.push((cell.row, cell.column, cell.bytes.to_vec()));
        Ok(())
    };
    table.parse(&path, Some(&mut handler)).expect("parse");

    assert_eq!(seen.len(), table.row_count() * table.column_count());
    assert_eq!(seen[1], (0, 1, Vec::new()));
    assert_eq!(seen[5], (1, 2, b"d".to_vec()));
    assert_eq!(seen[8], (2, 2, Vec::new()));
}

struct XorShift64(u64);

impl XorShift64 {
    fn next(&mut self, max: usize) -> usize {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % max as u64) as usize
    }
}

fn random_field(rng: &mut XorShift64) -> Vec<u8> {
    const ALPHABET: &[u8] = b"abcXYZ019 ;-,\n";
    let len = rng.next(12);
    (0..len)
        .map(|_| ALPHABET[rng.next(ALPHABET.len())])
        .collect()
}

fn encode_field(field: &[u8], out: &mut Vec<u8>) {
    if field.contains(&b',') || field.contains(&b'\n') {
        out.push(b'"');
        out.extend_from_slice(field);
        out.push(b'"');
    } else {
        out.extend_from_slice(field);
    }
}

#[test]
fn prop_packed_cells_match_source_values() {
    let temp = tempfile::tempdir().expect("tempdir");
    for (round, seed) in [5u64, 17, 257, 9001].into_iter().enumerate() {
        let mut rng = XorShift64(seed);
        let rows = 1 + rng.next(40);
        let mut expected: Vec<Vec<Vec<u8>>> = Vec::new();
        let mut input = Vec::new();
        for _ in 0..rows {
            let columns = 1 + rng.next(7);
            let mut row = Vec::new();
            for column in 0..columns {
                let field = random_field(&mut rng);
                encode_field(&field, &mut input);
                if column + 1 < columns {
                    input.push(b',');
                }
                row.push(field);
            }
            input.push(b'\n');
            expected.push(row);
        }
        let path = write_csv(temp.path(), &format!("random-{seed}.csv"), &input);
        let source = if round % 2 == 0 {
            SourceMode::Mapped
        } else {
            SourceMode::Reopen
        };

        let mut table = new_table(source);
        table.parse_default(&path).expect("parse");
        let widest = expected.iter().map(Vec::len).max().unwrap_or(0);
        assert_eq!(table.row_count(), rows, "seed {seed}");
        assert_eq!(table.column_count(), widest, "seed {seed}");

        for (row_index, row) in expected.iter().enumerate() {
            let view = table.get_row(row_index).expect("row");
            for column in 0..widest {
                let want = row.get(column).map(Vec::as_slice).unwrap_or(b"");
                let direct = table.get_cell(row_index, column).expect("cell");
                let via_row = table.get_row_cell(&view, column).expect("row cell");
                assert_eq!(direct, want, "seed {seed} row {row_index} col {column}");
                assert_eq!(via_row, direct);
                assert!(direct.len() <= table.slot_width(column).expect("width"));
            }
        }
    }
}
