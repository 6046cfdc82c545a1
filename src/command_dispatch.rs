//! Purpose: Hold top-level CLI command dispatch for `slotcsv`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command builds its own `Table`; nothing is cached between commands.
//! Invariants: Output envelopes are built by helpers in `main.rs` and `layout_json.rs`.

use std::io::Write;

use clap::CommandFactory;
use slotcsv::api::Table;

use super::*;
use crate::column_stats::ColumnStats;
use crate::layout_json::layout_json;

pub(super) fn dispatch_command(
    command: Command,
    encoding: Encoding,
    options: ParseOptions,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "slotcsv", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Info { file } => {
            let mut table = Table::with_options(encoding, options);
            table.compute_sizes(&file)?;
            emit_json(layout_json(&file, &table));
            Ok(RunOutcome::ok())
        }
        Command::Cell {
            file,
            row,
            column,
            raw,
        } => {
            let mut table = Table::with_options(encoding, options);
            table.parse_default(&file)?;
            let value = table.get_cell(row, column)?;
            if raw {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(value)
                    .and_then(|()| stdout.flush())
                    .map_err(|err| {
                        Error::new(ErrorKind::Internal)
                            .with_message("failed to write cell")
                            .with_source(err)
                    })?;
            } else {
                emit_json(cell_json(value));
            }
            Ok(RunOutcome::ok())
        }
        Command::Row { file, row } => {
            let mut table = Table::with_options(encoding, options);
            table.parse_default(&file)?;
            let view = table.get_row(row)?;
            let cells = view.cells().map(cell_json).collect::<Vec<_>>();
            emit_json(Value::Array(cells));
            Ok(RunOutcome::ok())
        }
        Command::Head { file, rows } => {
            let mut table = Table::with_options(encoding, options);
            table.parse_default(&file)?;
            for index in 0..rows.min(table.row_count()) {
                let view = table.get_row(index)?;
                let mut cells = Vec::with_capacity(view.column_count());
                for column in 0..view.column_count() {
                    cells.push(cell_json(table.get_row_cell(&view, column)?));
                }
                emit_json_line(&Value::Array(cells));
            }
            Ok(RunOutcome::ok())
        }
        Command::Stats { file } => {
            let mut table = Table::with_options(encoding, options);
            table.compute_sizes(&file)?;
            let mut stats = ColumnStats::new();
            table.parse(&file, Some(&mut stats))?;
            let mut value = stats.to_json();
            if let Value::Object(map) = &mut value {
                map.insert("rows".to_string(), json!(table.row_count()));
                map.insert("path".to_string(), json!(file.display().to_string()));
            }
            emit_json(value);
            Ok(RunOutcome::ok())
        }
    }
}
