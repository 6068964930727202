//! Command-line arguments and their mapping onto pipeline options.

use crate::error::CliError;
use blotter::{ExecutionMode, PipelineConfig};
use blotter_io::{IoError, ReaderConfig, WriterConfig};
use clap::Parser;
use std::path::PathBuf;

/// File name used when `--output` is not given.
pub(crate) const DEFAULT_OUTPUT: &str = "blotter-new.csv";

#[derive(Debug, Parser)]
#[command(name = "blottercli")]
#[command(about = "Compute open liquidity and fund returns from a trading blotter", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    /// Input blotter (delimited text with a header row)
    pub(crate) input: Option<PathBuf>,

    /// Output path [default: ./blotter-new.csv]
    #[arg(short, long)]
    pub(crate) output: Option<PathBuf>,

    /// Run stages on copies of the dataset instead of in place
    #[arg(long, visible_alias = "copy")]
    pub(crate) disable_eager: bool,

    /// Log stage progress
    #[arg(long)]
    pub(crate) info: bool,

    /// Log partition details
    #[arg(short = 'v', long = "debug")]
    pub(crate) debug: bool,

    /// Field delimiter for input and output
    #[arg(long, default_value_t = ',')]
    pub(crate) delimiter: char,

    /// Significant digits kept when parsing pal and exposure
    #[arg(long, default_value_t = 28, value_parser = clap::value_parser!(u32).range(1..=28))]
    pub(crate) precision: u32,

    /// Evaluate partitions on a thread pool
    #[arg(long)]
    pub(crate) parallel: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub(crate) report: Option<PathBuf>,
}

impl Cli {
    /// The input path, which must name an existing file.
    pub(crate) fn input_path(&self) -> Result<PathBuf, CliError> {
        let Some(input) = &self.input else {
            return Err(CliError::InputValidation(
                "no input blotter given".to_string(),
            ));
        };
        if !input.is_file() {
            return Err(CliError::InputValidation(format!(
                "{} is not an existing file",
                input.display()
            )));
        }
        Ok(input.clone())
    }

    pub(crate) fn output_path(&self) -> Result<PathBuf, CliError> {
        match &self.output {
            Some(path) => Ok(path.clone()),
            None => {
                let cwd = std::env::current_dir().map_err(IoError::from)?;
                Ok(cwd.join(DEFAULT_OUTPUT))
            }
        }
    }

    pub(crate) const fn mode(&self) -> ExecutionMode {
        if self.disable_eager {
            ExecutionMode::Copy
        } else {
            ExecutionMode::InPlace
        }
    }

    pub(crate) const fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            mode: self.mode(),
            precision: self.precision,
            parallel: self.parallel,
        }
    }

    fn delimiter_byte(&self) -> Result<u8, CliError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                CliError::InputValidation(format!(
                    "delimiter {:?} is not a single ASCII character",
                    self.delimiter
                ))
            })
    }

    pub(crate) fn reader_config(&self) -> Result<ReaderConfig, CliError> {
        Ok(ReaderConfig {
            delimiter: self.delimiter_byte()?,
        })
    }

    pub(crate) fn writer_config(&self) -> Result<WriterConfig, CliError> {
        Ok(WriterConfig {
            delimiter: self.delimiter_byte()?,
            ..Default::default()
        })
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub(crate) const fn default_log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.info {
            "info"
        } else {
            "warn"
        }
    }
}
