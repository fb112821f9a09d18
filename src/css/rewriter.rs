//! Index-based substitution of `url(...)` tokens.
//!
//! Replacements are keyed by the byte range recorded at parse time, so two
//! sources with byte-identical `url(...)` text are each replaced exactly once
//! and independently of the order in which they are supplied.

use std::ops::Range;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

/// One planned substitution against the original stylesheet text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Byte range of the original `url(...)` token.
    pub span: Range<usize>,
    /// Text to put in its place.
    pub text: String,
}

impl Replacement {
    /// Creates a replacement for `span`.
    #[must_use]
    pub fn new(span: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }
}

/// Builds `url('<prefix><filename>')`.
#[must_use]
pub fn relative_reference(path_prefix: &str, filename: &str) -> String {
    format!("url('{path_prefix}{filename}')")
}

/// Builds `url('data:<mime>;base64,<body>')`.
#[must_use]
pub fn data_uri_reference(mime: &str, bytes: &[u8]) -> String {
    format!("url('data:{mime};base64,{}')", BASE64.encode(bytes))
}

/// Applies all replacements to `css` in a single pass.
///
/// Replacements are sorted by position first. A replacement whose range is
/// out of bounds, not on a character boundary, or overlapping an earlier one
/// is skipped with a warning; the stylesheet text it covers is kept as is.
#[must_use]
pub fn rewrite(css: &str, replacements: &[Replacement]) -> String {
    let mut ordered: Vec<&Replacement> = replacements.iter().collect();
    ordered.sort_by_key(|r| (r.span.start, r.span.end));

    let mut out = String::with_capacity(css.len());
    let mut cursor = 0;
    let mut applied = 0usize;

    for replacement in ordered {
        let Range { start, end } = replacement.span;
        if start < cursor
            || end < start
            || end > css.len()
            || !css.is_char_boundary(start)
            || !css.is_char_boundary(end)
        {
            warn!(start, end, cursor, "skipping invalid or overlapping replacement");
            continue;
        }
        out.push_str(&css[cursor..start]);
        out.push_str(&replacement.text);
        cursor = end;
        applied += 1;
    }
    out.push_str(&css[cursor..]);

    debug!(applied, total = replacements.len(), "stylesheet rewritten");
    out
}
