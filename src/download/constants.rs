//! Constants for the download module (timeouts, retry backoff, defaults).

use std::time::Duration;

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout (30 seconds) for the stylesheet and each font.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of retries after the first attempt for transient failures.
pub const DEFAULT_RETRIES: u32 = 2;

/// Base delay before the first retry.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound for a single retry delay.
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(8);

/// MIME type assumed for a font response without `Content-Type`.
pub const DEFAULT_FONT_MIME: &str = "font/woff2";
