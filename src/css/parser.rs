//! `@font-face` block extraction.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

/// An optional leading comment followed by one flat `@font-face` rule.
/// Group 1 is the comment text, group 2 the rule itself.
#[allow(clippy::expect_used)]
static FACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:/\*\s*(.*?)\s*\*/)?[^@]*?(@font-face\s*\{[^}]*?\})\s*")
        .expect("font-face regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static FAMILY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)font-family\s*:\s*['"]?([^;}]*?)['"]?\s*(?:;|\})"#)
        .expect("font-family regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static WEIGHT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)font-weight\s*:\s*([^;}]*?)\s*(?:;|\})")
        .expect("font-weight regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)url\s*\(\s*['"]?\s*(.*?)\s*['"]?\s*\)"#)
        .expect("url() regex is valid") // Static pattern, safe to panic
});

/// One `url(...)` token inside a font face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// The URL as written, quotes and surrounding whitespace removed.
    pub url: String,
    /// Byte range of the whole `url(...)` token in the parsed stylesheet.
    pub span: Range<usize>,
    /// The verbatim `url(...)` token text.
    pub input_text: String,
}

/// One parsed `@font-face { ... }` rule and its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFaceBlock {
    /// Byte range of the `@font-face { ... }` rule in the parsed stylesheet.
    pub span: Range<usize>,
    /// Text of the comment directly preceding the rule, if any.
    pub comment: Option<String>,
    /// `font-family` value with quotes stripped, empty when absent.
    pub family: String,
    /// `font-weight` value, empty when absent.
    pub weight: String,
    /// Every `url(...)` in the rule, in document order.
    pub sources: Vec<SourceRef>,
}

impl FontFaceBlock {
    /// Returns the comment text, or an empty string.
    #[must_use]
    pub fn comment_or_empty(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }
}

/// Extracts every `@font-face` block from a stylesheet, in document order.
///
/// Blocks without `font-family` / `font-weight` get empty strings; blocks
/// without any `url(...)` are still returned, with no sources.
///
/// # Examples
///
/// ```
/// use fontgrab_core::css::parse;
///
/// let blocks = parse("/* latin */ @font-face { font-family: 'Lato'; src: url(lato.woff2); }");
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].family, "Lato");
/// assert_eq!(blocks[0].comment.as_deref(), Some("latin"));
/// assert_eq!(blocks[0].sources[0].url, "lato.woff2");
/// ```
#[tracing::instrument(skip(css), fields(css_len = css.len()))]
#[must_use]
pub fn parse(css: &str) -> Vec<FontFaceBlock> {
    let mut blocks = Vec::new();

    for captures in FACE_PATTERN.captures_iter(css) {
        let Some(rule) = captures.get(2) else {
            continue;
        };
        let comment = captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .filter(|c| !c.is_empty());
        let body = rule.as_str();

        let family = first_capture(&FAMILY_PATTERN, body);
        let weight = first_capture(&WEIGHT_PATTERN, body);

        let sources: Vec<SourceRef> = URL_PATTERN
            .captures_iter(body)
            .filter_map(|url_captures| {
                let token = url_captures.get(0)?;
                let url = url_captures.get(1)?.as_str().trim().to_string();
                let start = rule.start() + token.start();
                let end = rule.start() + token.end();
                trace!(url = %url, start, end, "found url() token");
                Some(SourceRef {
                    url,
                    span: start..end,
                    input_text: token.as_str().to_string(),
                })
            })
            .collect();

        debug!(
            family = %family,
            weight = %weight,
            comment = comment.as_deref().unwrap_or(""),
            sources = sources.len(),
            "parsed @font-face block"
        );

        blocks.push(FontFaceBlock {
            span: rule.range(),
            comment,
            family,
            weight,
            sources,
        });
    }

    blocks
}

fn first_capture(pattern: &Regex, haystack: &str) -> String {
    pattern
        .captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
