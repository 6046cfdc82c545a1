//! Purpose: `slotcsv` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit JSON on stdout, except `cell --raw` and `completion`.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Logs go to stderr and never mix with command output.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use bstr::ByteSlice;
use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod column_stats;
mod command_dispatch;
mod layout_json;

use slotcsv::api::{
    DEFAULT_PROGRESS_INTERVAL, Encoding, Error, ErrorKind, ParseOptions, QuotedNewlines,
    SourceMode, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Internal)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint("Try `slotcsv --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();

    let color_mode = cli.color;
    let encoding = Encoding::from(cli.encoding);
    let options = ParseOptions::new()
        .with_quoted_newlines(cli.quoted_newlines.into())
        .with_source(cli.source.into())
        .with_progress_interval(cli.progress_interval);

    command_dispatch::dispatch_command(cli.command, encoding, options)
        .map_err(add_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "slotcsv",
    version,
    about = "Two-pass CSV loader with fixed-stride cell storage",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Each file is read twice: once to size every column, once to pack the values.

Mental model:
  - `info` runs only the size scan
  - `cell`, `row`, `head` pack the file and read it back
  - `stats` streams every cell through a handler; nothing is packed
"#,
    after_help = r#"EXAMPLES
  $ slotcsv info people.csv
  $ slotcsv cell people.csv 2 1
  $ slotcsv head -n 5 people.csv
  $ slotcsv --source mapped stats people.csv

LOGGING
  RUST_LOG=debug slotcsv head people.csv   # scan and packing progress on stderr"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "ascii",
        value_enum,
        help = "Character encoding tag recorded on the table"
    )]
    encoding: EncodingArg,
    #[arg(
        long,
        global = true,
        default_value = "content",
        value_enum,
        help = "Line feeds inside quotes: keep as content, or end the row"
    )]
    quoted_newlines: QuotedNewlinesArg,
    #[arg(
        long,
        global = true,
        default_value = "reopen",
        value_enum,
        help = "Read the file once per pass, or map it once"
    )]
    source: SourceArg,
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_PROGRESS_INTERVAL,
        help = "Rows between debug progress events while packing (0 disables)"
    )]
    progress_interval: usize,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EncodingArg {
    Ascii,
    Utf8,
    Utf16,
}

impl From<EncodingArg> for Encoding {
    fn from(value: EncodingArg) -> Self {
        match value {
            EncodingArg::Ascii => Encoding::Ascii,
            EncodingArg::Utf8 => Encoding::Utf8,
            EncodingArg::Utf16 => Encoding::Utf16,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum QuotedNewlinesArg {
    Content,
    EndRow,
}

impl From<QuotedNewlinesArg> for QuotedNewlines {
    fn from(value: QuotedNewlinesArg) -> Self {
        match value {
            QuotedNewlinesArg::Content => QuotedNewlines::Content,
            QuotedNewlinesArg::EndRow => QuotedNewlines::EndRow,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SourceArg {
    Reopen,
    Mapped,
}

impl From<SourceArg> for SourceMode {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Reopen => SourceMode::Reopen,
            SourceArg::Mapped => SourceMode::Mapped,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Size a file and print its layout",
        long_about = "Run only the size scan and print the computed layout as JSON.",
        after_help = r#"EXAMPLES
  $ slotcsv info people.csv
  $ slotcsv --quoted-newlines end-row info notes.csv"#
    )]
    Info {
        #[arg(help = "CSV file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(
        about = "Print one cell",
        after_help = r#"EXAMPLES
  $ slotcsv cell people.csv 0 0
  $ slotcsv cell --raw people.csv 3 2 > value.bin"#
    )]
    Cell {
        #[arg(help = "CSV file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(help = "Zero-based row index")]
        row: usize,
        #[arg(help = "Zero-based column index")]
        column: usize,
        #[arg(long, help = "Write the value bytes as-is instead of a JSON string")]
        raw: bool,
    },
    #[command(about = "Print one row as a JSON array")]
    Row {
        #[arg(help = "CSV file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(help = "Zero-based row index")]
        row: usize,
    },
    #[command(
        about = "Print the first rows as JSON Lines",
        after_help = r#"EXAMPLES
  $ slotcsv head people.csv
  $ slotcsv head -n 100 people.csv | jq -c '.[0]'"#
    )]
    Head {
        #[arg(help = "CSV file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(short = 'n', long, default_value_t = 10, help = "Rows to print")]
        rows: usize,
    },
    #[command(
        about = "Summarize columns without packing",
        long_about = "Stream every cell through a handler and print per-column counts. No packed buffer is allocated."
    )]
    Stats {
        #[arg(help = "CSV file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn cell_json(bytes: &[u8]) -> Value {
    json!(bytes.to_str_lossy())
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_json_line(value: &Value) {
    let json = serde_json::to_string(value)
        .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn add_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::IndexOutOfRange => {
            err.with_hint("Indices are zero-based. Use `slotcsv info <file>` to see rows and columns.")
        }
        ErrorKind::Alloc => err.with_hint("The packed table does not fit in memory. Try `slotcsv stats`, which does not pack."),
        ErrorKind::Internal => err.with_hint(
            "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
        ),
        _ => err,
    }
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Open => "failed to open source".to_string(),
        ErrorKind::Read => "failed to read source".to_string(),
        ErrorKind::Alloc => "allocation failed".to_string(),
        ErrorKind::IndexOutOfRange => "index out of range".to_string(),
        ErrorKind::Handler => "cell handler failed".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(row) = err.row() {
        inner.insert("row".to_string(), json!(row));
    }
    if let Some(column) = err.column() {
        inner.insert("column".to_string(), json!(column));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    let label = |name: &str| colorize_label(name, use_color, AnsiColor::Yellow);
    if let Some(hint) = err.hint() {
        lines.push(format!("{} {hint}", label("hint:")));
    }
    if let Some(path) = err.path() {
        lines.push(format!("{} {}", label("path:"), path.display()));
    }
    if let Some(row) = err.row() {
        lines.push(format!("{} {row}", label("row:")));
    }
    if let Some(column) = err.column() {
        lines.push(format!("{} {column}", label("column:")));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!("{} {offset}", label("offset:")));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!("{} {cause}", label("caused by:")));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
