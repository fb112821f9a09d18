//! Writing font files and the rewritten stylesheet to disk.
//!
//! All writes honor two switches:
//! - `simulate`: nothing is created or written, the intended outcome is
//!   reported instead;
//! - `overwrite`: when off, an existing target is left untouched and the
//!   write is reported as skipped (not an error).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::config::Config;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The output directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("IO error writing to {path}: {source}")]
    Write {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Overwrite and dry-run switches for a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace existing files.
    pub overwrite: bool,
    /// Do not touch the filesystem.
    pub simulate: bool,
}

impl From<&Config> for WriteOptions {
    fn from(config: &Config) -> Self {
        Self {
            overwrite: config.overwrite,
            simulate: config.simulate,
        }
    }
}

/// What happened (or, when simulating, would happen) to a target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was written.
    Written,
    /// The file exists and overwriting is disabled.
    SkippedExisting,
    /// Dry run: the file would have been written.
    Simulated,
}

impl WriteOutcome {
    /// Returns true if the target file now holds the new content.
    #[must_use]
    pub fn is_written(self) -> bool {
        self == Self::Written
    }
}

/// Creates `path` and its parents. Succeeds if it already exists.
///
/// Does nothing when simulating.
///
/// # Errors
///
/// Returns [`StorageError::CreateDir`] if the directory cannot be created.
#[instrument(skip(options), fields(path = %path.display()))]
pub async fn ensure_dir(path: &Path, options: WriteOptions) -> Result<(), StorageError> {
    if options.simulate {
        debug!("simulate: not creating output directory");
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| StorageError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

/// Predicts the outcome of writing `path` without touching it.
pub async fn planned_outcome(path: &Path, options: WriteOptions) -> WriteOutcome {
    if !options.overwrite && tokio::fs::try_exists(path).await.unwrap_or(false) {
        WriteOutcome::SkippedExisting
    } else if options.simulate {
        WriteOutcome::Simulated
    } else {
        WriteOutcome::Written
    }
}

/// Writes downloaded font bytes.
///
/// # Errors
///
/// Returns [`StorageError::Write`] if the file cannot be written.
pub async fn write_font(
    path: &Path,
    bytes: &[u8],
    options: WriteOptions,
) -> Result<WriteOutcome, StorageError> {
    write_file(path, bytes, options).await
}

/// Writes the rewritten stylesheet as UTF-8.
///
/// # Errors
///
/// Returns [`StorageError::Write`] if the file cannot be written.
pub async fn write_css(
    path: &Path,
    text: &str,
    options: WriteOptions,
) -> Result<WriteOutcome, StorageError> {
    write_file(path, text.as_bytes(), options).await
}

#[instrument(skip(bytes, options), fields(path = %path.display(), bytes = bytes.len()))]
async fn write_file(
    path: &Path,
    bytes: &[u8],
    options: WriteOptions,
) -> Result<WriteOutcome, StorageError> {
    if options.simulate {
        let outcome = planned_outcome(path, options).await;
        debug!(?outcome, "simulate: not writing");
        return Ok(outcome);
    }

    let mut open = OpenOptions::new();
    open.write(true);
    if options.overwrite {
        open.create(true).truncate(true);
    } else {
        // create_new fails atomically if the target exists
        open.create_new(true);
    }

    let mut file = match open.open(path).await {
        Ok(file) => file,
        Err(e) if !options.overwrite && e.kind() == ErrorKind::AlreadyExists => {
            debug!("target exists and overwriting is disabled, skipping");
            return Ok(WriteOutcome::SkippedExisting);
        }
        Err(e) => return Err(StorageError::write(path, e)),
    };

    let result = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = result {
        debug!("cleaning up partial file after error");
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
        return Err(StorageError::write(path, e));
    }

    debug!("file written");
    Ok(WriteOutcome::Written)
}
