//! Ordered, duplicate-free set of tracked symbols and its CSV persistence.
//!
//! The on-disk format is a one-column CSV:
//!
//! ```text
//! Symbol
//! AAPL
//! MSFT
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::Symbol;

pub const WATCHLIST_HEADER: &str = "Symbol";
pub const DEFAULT_SYMBOL: &str = "AAPL";

/// Errors raised while reading or writing the persisted watchlist.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("watchlist file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("watchlist file {path} is not valid CSV: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("watchlist file {path} has no '{WATCHLIST_HEADER}' column")]
    MissingHeader { path: PathBuf },

    #[error("watchlist file {path} lists no symbols")]
    Empty { path: PathBuf },
}

/// Ordered set of unique symbols, insertion order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist(Vec<Symbol>);

impl Watchlist {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Single-symbol list used when nothing usable is persisted.
    pub fn with_default(symbol: Symbol) -> Self {
        Self(vec![symbol])
    }

    /// Append `symbol` unless already present. Returns whether it was added.
    pub fn add(&mut self, symbol: Symbol) -> bool {
        if self.contains(&symbol) {
            return false;
        }
        self.0.push(symbol);
        true
    }

    /// Remove `symbol` if present. Returns whether it was removed.
    ///
    /// Removing the last entry leaves an empty list; that is a valid
    /// in-memory state.
    pub fn remove(&mut self, symbol: &Symbol) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != symbol);
        self.0.len() != before
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.0.contains(symbol)
    }

    pub fn first(&self) -> Option<&Symbol> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }
}

impl FromIterator<Symbol> for Watchlist {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut watchlist = Self::new();
        for symbol in iter {
            watchlist.add(symbol);
        }
        watchlist
    }
}

impl<'a> IntoIterator for &'a Watchlist {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Serialize)]
struct WatchlistRow<'a> {
    #[serde(rename = "Symbol")]
    symbol: &'a str,
}

/// Reads and writes the watchlist CSV.
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
    default_symbol: Symbol,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_symbol: Symbol::from_trusted(DEFAULT_SYMBOL),
        }
    }

    pub fn with_default_symbol(mut self, symbol: Symbol) -> Self {
        self.default_symbol = symbol;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_symbol(&self) -> &Symbol {
        &self.default_symbol
    }

    /// Load the persisted list, never failing.
    ///
    /// Invalid rows are skipped. Any other problem (missing file, bad CSV,
    /// no usable rows) yields the single-symbol default list.
    pub fn load(&self) -> Watchlist {
        match self.try_load() {
            Ok(watchlist) => {
                debug!(path = %self.path.display(), count = watchlist.len(), "watchlist loaded");
                watchlist
            }
            Err(PersistenceError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no watchlist file, using default");
                Watchlist::with_default(self.default_symbol.clone())
            }
            Err(error) => {
                warn!(error = %error, default = %self.default_symbol, "watchlist unreadable, using default");
                Watchlist::with_default(self.default_symbol.clone())
            }
        }
    }

    /// Load used by [`WatchlistStore::load`]. Duplicate rows collapse and rows
    /// that are not valid symbols are logged and skipped.
    pub fn try_load(&self) -> Result<Watchlist, PersistenceError> {
        let file = fs::File::open(&self.path).map_err(|source| self.io_error(source))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|source| self.csv_error(source))?
            .clone();
        let column = headers
            .iter()
            .position(|header| header.trim_start_matches('\u{feff}') == WATCHLIST_HEADER)
            .ok_or_else(|| PersistenceError::MissingHeader {
                path: self.path.clone(),
            })?;

        let mut watchlist = Watchlist::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|source| self.csv_error(source))?;
            let raw = record.get(column).unwrap_or_default();
            match Symbol::parse(raw) {
                Ok(symbol) => {
                    watchlist.add(symbol);
                }
                Err(error) => {
                    warn!(
                        path = %self.path.display(),
                        row = index + 1,
                        value = raw,
                        error = %error,
                        "skipping invalid watchlist row"
                    );
                }
            }
        }

        if watchlist.is_empty() {
            return Err(PersistenceError::Empty {
                path: self.path.clone(),
            });
        }

        Ok(watchlist)
    }

    /// Replace the persisted list atomically (temp file + rename).
    pub fn save(&self, watchlist: &Watchlist) -> Result<(), PersistenceError> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&directory).map_err(|source| self.io_error(source))?;

        let temp = NamedTempFile::new_in(&directory).map_err(|source| self.io_error(source))?;
        {
            let mut writer = csv::Writer::from_writer(temp.as_file());
            if watchlist.is_empty() {
                writer
                    .write_record([WATCHLIST_HEADER])
                    .map_err(|source| self.csv_error(source))?;
            }
            for symbol in watchlist {
                writer
                    .serialize(WatchlistRow {
                        symbol: symbol.as_str(),
                    })
                    .map_err(|source| self.csv_error(source))?;
            }
            writer.flush().map_err(|source| self.io_error(source))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|source| self.io_error(source))?;
        temp.persist(&self.path)
            .map_err(|error| self.io_error(error.error))?;

        info!(path = %self.path.display(), count = watchlist.len(), "watchlist saved");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> PersistenceError {
        PersistenceError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}
