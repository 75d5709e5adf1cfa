//! Single-row CSV export of the displayed quote.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{MarketView, Symbol, UtcDateTime};

const FILE_PREFIX: &str = "export_";
const MAX_NAME_ATTEMPTS: u32 = 1_000;

/// Export failures. Always surfaced to the user.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: no market view is displayed")]
    NoView,

    #[error("nothing to export: market data for {symbol} failed to load")]
    NoData { symbol: Symbol },

    #[error("cannot write export to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot serialize export record: {0}")]
    Csv(#[from] csv::Error),
}

/// Flat record written by an export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Change")]
    pub change: f64,
    #[serde(rename = "Change %")]
    pub change_percent: String,
    #[serde(rename = "Bid")]
    pub bid: String,
    #[serde(rename = "Ask")]
    pub ask: String,
    #[serde(rename = "Last Close")]
    pub last_close: String,
}

impl ExportRecord {
    pub fn from_view(view: &MarketView) -> Self {
        let quote = &view.quote;
        Self {
            symbol: view.symbol.to_string(),
            price: quote.price(),
            change: quote.change(),
            change_percent: format!("{:.2}%", quote.change_percent()),
            bid: quote.bid().to_string(),
            ask: quote.ask().to_string(),
            last_close: quote.previous_close().to_string(),
        }
    }

    /// Header line plus the data row.
    pub fn to_csv(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(self)?;
        writer
            .into_inner()
            .map_err(|error| ExportError::Csv(csv::Error::from(error.into_error())))
    }
}

/// Writes each export to a fresh, timestamped file.
#[derive(Debug, Clone)]
pub struct Exporter {
    directory: PathBuf,
}

impl Exporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Export the view's quote and return the path written.
    ///
    /// The name is `export_<YYYYmmdd_HHMMSS>.csv`; if that file already exists a
    /// numeric suffix is appended. An existing file is never overwritten.
    pub fn export(&self, view: &MarketView) -> Result<PathBuf, ExportError> {
        let payload = ExportRecord::from_view(view).to_csv()?;
        let stamp = UtcDateTime::now().file_stamp();

        let (path, mut file) = self.create_unique(&stamp)?;
        file.write_all(&payload)
            .and_then(|()| file.sync_all())
            .map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), symbol = %view.symbol, "quote exported");
        Ok(path)
    }

    fn create_unique(&self, stamp: &str) -> Result<(PathBuf, fs::File), ExportError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{FILE_PREFIX}{stamp}.csv")
            } else {
                format!("{FILE_PREFIX}{stamp}_{attempt}.csv")
            };
            let path = self.directory.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(ExportError::Io { path, source }),
            }
        }

        Err(ExportError::Io {
            path: self.directory.clone(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free export file name for stamp {stamp}"),
            ),
        })
    }
}
