//! Blotter CLI binary.
//!
//! Reads a trading blotter, runs the six-stage pipeline and writes one row per
//! fund book and day.

mod cli;
mod error;

use blotter_io::{BlotterReader, BlotterWriter, RunSummary};
use clap::Parser;
use cli::Cli;
use error::CliError;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.default_log_level());

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// `RUST_LOG` wins over the command-line verbosity flags.
fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let input = cli.input_path()?;
    let output = cli.output_path()?;
    let config = cli.pipeline_config();
    config.validate()?;

    let data = BlotterReader::new(cli.reader_config()?).read_path(&input)?;
    let (result, report) = blotter::run(data, &config)?;
    BlotterWriter::new(cli.writer_config()?).write_path(&output, &result)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        mode = %report.mode,
        rows_in = report.rows_in(),
        rows_out = report.rows_out(),
        elapsed_ms = report.elapsed_ms(),
        "Blotter written"
    );

    if let Some(path) = &cli.report {
        RunSummary::new(&input, &output, report).write(path)?;
    }
    Ok(())
}
