//! cellpatch CLI - read and patch .xlsx workbooks from the shell
//!
//! Every command prints one JSON document on stdout. Failures print
//! `{"error": "..."}` and exit non-zero.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use cellpatch_core::FormatSpec;
use cellpatch_xlsx::{WriteInput, XlsxSession};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "cellpatch")]
#[command(author, version, about = "Read and patch .xlsx workbooks in place")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Workbook file (.xlsx)
    input: PathBuf,

    /// Range such as A1 or B2:D5
    #[arg(short, long)]
    range: String,

    /// Sheet name (default: first sheet)
    #[arg(short, long)]
    sheet: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List sheet names in workbook order
    Sheets {
        /// Workbook file (.xlsx)
        input: PathBuf,
    },

    /// Print the values of a range as a JSON array of rows
    Read {
        #[command(flatten)]
        target: Target,
    },

    /// Print the non-default formatting of the cells in a range
    Formats {
        #[command(flatten)]
        target: Target,
    },

    /// Write JSON values (scalar, list or list of lists) into a range
    Write {
        #[command(flatten)]
        target: Target,

        /// Values as JSON, e.g. '[["x", 1], [true, null]]'
        #[arg(long = "value")]
        values: String,

        /// Save to this file instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge a JSON format spec onto every cell in a range
    Format {
        #[command(flatten)]
        target: Target,

        /// Format spec as JSON, e.g. '{"bold": true, "backgroundColor": "#ffff00"}'
        #[arg(long)]
        spec: String,

        /// Save to this file instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", json!({ "error": format!("{:#}", e) }));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<Value> {
    match command {
        Commands::Sheets { input } => {
            let session = open(&input)?;
            Ok(json!({ "sheets": session.sheet_names() }))
        }
        Commands::Read { target } => {
            let (mut session, sheet) = open_target(&target)?;
            let values = session
                .read_values(&sheet, &target.range)
                .with_context(|| format!("Failed to read {}!{}", sheet, target.range))?;
            Ok(json!({ "sheet": sheet, "range": target.range, "values": values }))
        }
        Commands::Formats { target } => {
            let (mut session, sheet) = open_target(&target)?;
            let formats = session
                .read_formats(&sheet, &target.range)
                .with_context(|| format!("Failed to read formats of {}!{}", sheet, target.range))?;
            Ok(json!({ "sheet": sheet, "range": target.range, "formats": formats }))
        }
        Commands::Write {
            target,
            values,
            output,
        } => {
            let parsed: Value =
                serde_json::from_str(&values).context("Values are not valid JSON")?;
            let input = WriteInput::from_json(&parsed);
            let (mut session, sheet) = open_target(&target)?;
            session
                .write_values(&sheet, &target.range, &input)
                .with_context(|| format!("Failed to write {}!{}", sheet, target.range))?;
            let saved = save(&mut session, output.as_deref())?;
            Ok(json!({ "ok": true, "sheet": sheet, "range": target.range, "saved": saved }))
        }
        Commands::Format {
            target,
            spec,
            output,
        } => {
            let spec = FormatSpec::from_json_str(&spec).context("Invalid format spec")?;
            let (mut session, sheet) = open_target(&target)?;
            session
                .apply_format(&sheet, &target.range, &spec)
                .with_context(|| format!("Failed to format {}!{}", sheet, target.range))?;
            let saved = save(&mut session, output.as_deref())?;
            Ok(json!({ "ok": true, "sheet": sheet, "range": target.range, "saved": saved }))
        }
    }
}

fn open(input: &Path) -> Result<XlsxSession> {
    XlsxSession::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

/// Open the workbook and settle on a sheet name
fn open_target(target: &Target) -> Result<(XlsxSession, String)> {
    let session = open(&target.input)?;
    let sheet = match &target.sheet {
        Some(name) => name.clone(),
        None => session
            .sheet_names()
            .into_iter()
            .next()
            .context("Workbook has no sheets")?,
    };
    Ok((session, sheet))
}

fn save(session: &mut XlsxSession, output: Option<&Path>) -> Result<String> {
    match output {
        Some(path) => session
            .save_as(path)
            .with_context(|| format!("Failed to write '{}'", path.display()))?,
        None => session
            .save()
            .with_context(|| format!("Failed to save '{}'", session.path().display()))?,
    }
    Ok(session.path().display().to_string())
}
