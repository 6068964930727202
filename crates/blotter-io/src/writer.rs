//! Delimited blotter output.

use crate::error::{IoError, Result};
use blotter::{Dataset, OUTPUT_COLUMNS, PipelineError, Position, Return};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Field delimiter
    pub delimiter: u8,
    /// Digits after the decimal point for pal, exposure and return
    pub fractional_digits: u32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            fractional_digits: 16,
        }
    }
}

/// Format a decimal with exactly `digits` fractional digits, rounding half to even.
pub fn format_decimal(value: Decimal, digits: u32) -> String {
    let rounded = value.round_dp_with_strategy(digits, RoundingStrategy::MidpointNearestEven);
    // no "-0.000"
    let rounded = if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    };
    format!("{:.*}", digits as usize, rounded)
}

fn format_return(ret: Return, digits: u32) -> String {
    match ret {
        Return::Value(value) => format_decimal(value, digits),
        Return::NaN => "NaN".to_string(),
    }
}

/// Writes aggregated rows as `lkid,date,analyst,sector,pal,exposure,return`.
#[derive(Debug, Clone, Default)]
pub struct BlotterWriter {
    config: WriterConfig,
}

impl BlotterWriter {
    /// Create a writer with the given options.
    pub const fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    /// Write the dataset to `path`.
    ///
    /// Rows go to a temporary file next to `path` that is renamed into place
    /// once every row has been written. On failure the temporary file is
    /// removed and `path` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a row is not in output shape or the file cannot be
    /// written.
    pub fn write_path(&self, path: &Path, data: &Dataset) -> Result<()> {
        let tmp = temp_path(path);
        let written = File::create(&tmp)
            .map_err(IoError::from)
            .and_then(|file| self.write(file, data));

        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                warn!(path = %tmp.display(), error = %cleanup, "Could not remove temporary output");
            }
            return Err(err);
        }

        fs::rename(&tmp, path)?;
        info!(path = %path.display(), rows = data.len(), "Wrote blotter");
        Ok(())
    }

    /// Write header and rows to any writer.
    ///
    /// # Errors
    ///
    /// Returns an error if a row is missing a typed value or its return.
    pub fn write<W: Write>(&self, out: W, data: &Dataset) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.config.delimiter)
            .from_writer(out);

        wtr.write_record(OUTPUT_COLUMNS)?;
        for row in data {
            wtr.write_record(&self.record(row)?)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn record(&self, row: &Position) -> Result<[String; 7]> {
        let digits = self.config.fractional_digits;
        let ret = row.ret.ok_or(PipelineError::NotNormalized {
            row: row.index()?,
            column: "return",
        })?;

        Ok([
            row.lkid.clone(),
            row.date()?.format("%Y-%m-%d").to_string(),
            row.analyst.clone(),
            row.sector.clone(),
            format_decimal(row.pal()?, digits),
            format_decimal(row.exposure()?, digits),
            format_return(ret, digits),
        ])
    }
}

/// Hidden sibling of `path` used while writing.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "blotter".to_string(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}
