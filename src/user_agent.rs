//! Default User-Agent for stylesheet and font requests.
//!
//! Google Fonts picks the font formats it serves (woff2, woff, ttf, eot) by
//! sniffing the User-Agent, so the default identifies as a desktop browser
//! that supports woff2.

/// Desktop Chrome User-Agent, answered with woff2 sources.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/57.0.2987.133 Safari/537.36";

/// Returns the User-Agent used when none is configured.
#[must_use]
pub fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}
