use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rainlang_core::{
    CompileError, MetaStore, ParseOptions, Problem, RainDocument, compose, line_col,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Check a Rainlang document and flatten its entrypoints into one program.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Document to read (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the composite program (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Meta store root holding <hash>.words.json, <hash>.ctx.json and <hash>.rain files"
    )]
    store: Option<PathBuf>,

    #[arg(
        short,
        long = "entrypoint",
        value_name = "NAME",
        help = "Binding to compose; repeat for several. Without any, only checks the document"
    )]
    entrypoints: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[arg(long, help = "Accept opcodes that are not in the imported words")]
    ignore_unknown_opcodes: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RAINLANG_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let text = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let store = match &cli.store {
        Some(root) => MetaStore::from_dir(root)
            .with_context(|| format!("failed to load meta store {}", root.display()))?,
        None => MetaStore::new(),
    };
    let options = ParseOptions {
        ignore_unknown_opcodes: cli.ignore_unknown_opcodes,
        ..ParseOptions::default()
    };
    let document = RainDocument::create_with_options(&text, &store, options);

    if cli.entrypoints.is_empty() {
        let problems = document.all_problems();
        debug!(problems = problems.len(), "checked document");
        if problems.is_empty() {
            return write_output(cli.output.as_ref(), b"");
        }
        report(&text, &problems, cli.format)?;
        bail!("document has {} problem(s)", problems.len());
    }

    match compose(&document, cli.entrypoints.as_slice()) {
        Ok(composition) => {
            let rendered = match cli.format {
                Format::Text => format!("{}\n", composition.text),
                Format::Json => {
                    let value = serde_json::json!({
                        "text": composition.text,
                        "constants": composition.constants,
                        "entrypoints": composition.entrypoints,
                    });
                    format!("{}\n", serde_json::to_string_pretty(&value)?)
                }
            };
            write_output(cli.output.as_ref(), rendered.as_bytes())
        }
        Err(CompileError::Problems(problems)) => {
            report(&text, &problems, cli.format)?;
            bail!("document has {} problem(s)", problems.len());
        }
        Err(err) => Err(err).context("failed to compose entrypoints"),
    }
}

/// Print problems to stdout as JSON, or to stderr as `line:col` text.
fn report(text: &str, problems: &[Problem], format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, problems)?;
            writeln!(stdout)?;
        }
        Format::Text => {
            let mut stderr = io::stderr().lock();
            for problem in problems {
                let (line, column) = line_col(text, problem.position.start);
                writeln!(
                    stderr,
                    "{}:{}: {}: {}",
                    line + 1,
                    column + 1,
                    problem.code,
                    problem.message
                )?;
            }
        }
    }
    Ok(())
}

fn write_output(path: Option<&PathBuf>, bytes: &[u8]) -> Result<()> {
    let Some(path) = path else {
        io::stdout().write_all(bytes)?;
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
