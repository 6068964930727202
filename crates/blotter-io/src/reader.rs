//! Delimited blotter input.
//!
//! Cells are read as text and trimmed. Type conversion happens later in the
//! pipeline's normalization stage, so a malformed number or date surfaces as
//! a pipeline error that names the row and column.

use crate::error::{IoError, Result};
use blotter::{Dataset, Position};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Columns every input file must carry. `ticker` is optional.
pub const REQUIRED_COLUMNS: [&str; 6] = ["date", "lkid", "analyst", "sector", "pal", "exposure"];

/// Input format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// One input record before normalization.
#[derive(Debug, Deserialize)]
struct RawPosition {
    date: String,
    lkid: String,
    #[serde(default)]
    ticker: Option<String>,
    analyst: String,
    sector: String,
    pal: String,
    exposure: String,
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        Self::raw(
            raw.date,
            raw.lkid,
            raw.ticker.filter(|t| !t.is_empty()),
            raw.analyst,
            raw.sector,
            raw.pal,
            raw.exposure,
        )
    }
}

/// Reads a blotter file into a raw [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct BlotterReader {
    config: ReaderConfig,
}

impl BlotterReader {
    /// Create a reader with the given options.
    pub const fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, a required column is
    /// missing or a record is malformed.
    pub fn read_path(&self, path: &Path) -> Result<Dataset> {
        let file = File::open(path)?;
        let data = self.read(file)?;
        info!(path = %path.display(), rows = data.len(), "Read blotter");
        Ok(data)
    }

    /// Read delimited text from any reader.
    ///
    /// # Errors
    ///
    /// Returns an error if a required column is missing or a record is
    /// malformed.
    pub fn read<R: Read>(&self, input: R) -> Result<Dataset> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers = rdr.headers()?.clone();
        if let Some(missing) = REQUIRED_COLUMNS
            .into_iter()
            .find(|col| !headers.iter().any(|h| h == *col))
        {
            return Err(IoError::MissingColumn(missing));
        }
        let has_ticker = headers.iter().any(|h| h == "ticker");
        debug!(columns = headers.len(), has_ticker, "Input header");

        rdr.deserialize::<RawPosition>()
            .map(|record| Ok(Position::from(record?)))
            .collect::<Result<Vec<_>>>()
            .map(Dataset::new)
    }
}
