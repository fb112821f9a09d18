//! HTTP fetching of the stylesheet and font assets.
//!
//! # Features
//!
//! - One reusable client per run (connection pooling)
//! - Configurable User-Agent, TLS strictness and timeouts
//! - Bounded retry with exponential backoff for transient failures
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use fontgrab_core::Config;
//! use fontgrab_core::download::HttpClient;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&Config::default())?;
//! let url = Url::parse("https://fonts.googleapis.com/css?family=Lato")?;
//! let css = client.fetch_text(url.as_str()).await?;
//! println!("{} bytes of CSS from {}", css.body.len(), css.url);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod retry;

pub use client::{FetchedAsset, FetchedText, HttpClient};
pub use error::DownloadError;
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
