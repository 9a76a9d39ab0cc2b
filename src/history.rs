//! Append-only history of already-published URLs.
//!
//! The store is a plain text file, one URL per line, no header, no
//! checksum. It is read in full at the start of a run and appended to when
//! entries are committed. Once a URL lands in the file it must never be
//! republished by a later run.
//!
//! Single-writer, single-reader, one process at a time: there is no file
//! locking, so the caller's scheduler is responsible for preventing
//! concurrent invocations.

use crate::error::BotError;
use crate::models::Entry;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Handle on the save file holding previously-published URLs.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> BotError {
        BotError::History {
            path: self.path.clone(),
            source,
        }
    }

    /// Load the set of previously-published URLs.
    ///
    /// Creates the file first if it does not exist (idempotent bootstrap),
    /// then reads it line by line. Blank lines are skipped.
    #[instrument(level = "info", skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<HashSet<String>, BotError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        let seen: HashSet<String> = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        info!(count = seen.len(), "Loaded published-URL history");
        Ok(seen)
    }

    /// Append the URLs of `entries` to the file, one per line, in order.
    ///
    /// An empty slice is a no-op with no I/O. Lines are never rewritten or
    /// deduplicated at write time.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = entries.len()))]
    pub async fn commit(&self, entries: &[Entry]) -> Result<(), BotError> {
        if entries.is_empty() {
            debug!("Nothing to commit");
            return Ok(());
        }

        let mut data = String::new();
        for entry in entries {
            data.push_str(&entry.url);
            data.push('\n');
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_err(e))?;
        file.write_all(data.as_bytes())
            .await
            .map_err(|e| self.io_err(e))?;
        file.flush().await.map_err(|e| self.io_err(e))?;

        info!(count = entries.len(), "Committed URLs to history");
        Ok(())
    }
}
