//! Fontgrab Core Library
//!
//! Downloads the font files referenced by a Google-Fonts-style stylesheet,
//! rewrites the stylesheet to point at the local copies (or inlines them as
//! base64 data URIs) and saves everything to an output directory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`query`] - Stylesheet URL repair and Google Fonts URL construction
//! - [`download`] - HTTP fetching with retry support
//! - [`css`] - `@font-face` scanning and index-based rewriting
//! - [`template`] - Filename templates such as `{_family}-{weight}{i}.{ext}`
//! - [`allocator`] - Output filename allocation and collision detection
//! - [`storage`] - Writes with overwrite and simulate semantics
//! - [`pipeline`] - The [`FontDownloader`] tying the stages together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod allocator;
pub mod config;
pub mod css;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod storage;
pub mod template;
pub mod user_agent;

// Re-export commonly used types
pub use allocator::{FilenameAllocator, FontEntry};
pub use config::Config;
pub use download::{DownloadError, HttpClient, RetryPolicy};
pub use error::Error;
pub use pipeline::{AssetOutcome, DownloadReport, FontDownloader, FontReport};
pub use query::{FamilySpec, FontInput, construct_url, parse_family_query, repair_url};
pub use storage::{StorageError, WriteOptions, WriteOutcome};
pub use template::Template;
