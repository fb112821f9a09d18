//! Crate-level error type for a font download run.

use thiserror::Error;

use crate::download::DownloadError;
use crate::storage::StorageError;

/// Errors that abort a font download run.
///
/// Input errors are returned before any network or filesystem access.
/// Everything else aborts the remaining pipeline stages.
#[derive(Debug, Error)]
pub enum Error {
    /// The input could not be turned into a stylesheet URL.
    #[error("invalid input '{input}': {reason}")]
    InvalidInput {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The stylesheet URL does not use http or https.
    #[error("unsupported protocol '{scheme}' in {url}\n  Suggestion: Use an http:// or https:// stylesheet URL")]
    UnsupportedProtocol {
        /// The rejected URL.
        url: String,
        /// Its scheme.
        scheme: String,
    },

    /// Fetching the stylesheet or a font asset failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Creating the output directory or writing a file failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Two different font sources rendered to the same output filename.
    #[error(
        "duplicate output filename '{filename}' for {first_url} and {second_url} (template '{template}')\n  Suggestion: Include {{i}} in the filename template"
    )]
    DuplicateFilename {
        /// The colliding filename.
        filename: String,
        /// Source that claimed the filename first.
        first_url: String,
        /// Source that collided with it.
        second_url: String,
        /// Template that produced the collision.
        template: String,
    },
}

impl Error {
    /// Creates an `InvalidInput` error.
    pub fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `UnsupportedProtocol` error.
    pub fn unsupported_protocol(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::UnsupportedProtocol {
            url: url.into(),
            scheme: scheme.into(),
        }
    }
}
