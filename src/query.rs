//! Stylesheet input normalization.
//!
//! A run starts either from a stylesheet URL (possibly copied out of an HTML
//! `<link>` tag, with `&amp;` entities) or from a list of families that is
//! turned into a Google Fonts `css?family=...&subset=...` URL.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

use crate::error::Error;

/// Base URL of the Google Fonts CSS API.
pub const GOOGLE_FONTS_CSS_URL: &str = "https://fonts.googleapis.com/css";

#[allow(clippy::expect_used)]
static WEIGHT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{3}i?$").expect("weight regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static SUBSET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z-]+$").expect("subset regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static FAMILY_DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9+_-]").expect("family regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static SCHEME_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("scheme regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").expect("whitespace regex is valid") // Static pattern, safe to panic
});

/// A requested family and its weights, e.g. `Roboto:400,700i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySpec {
    /// Family name as given (sanitized when the URL is built).
    pub name: String,
    /// Weight tokens as given (filtered when the URL is built).
    pub weights: Vec<String>,
}

impl FamilySpec {
    /// Creates a family request.
    pub fn new<I, S>(name: impl Into<String>, weights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            weights: weights.into_iter().map(Into::into).collect(),
        }
    }
}

impl FromStr for FamilySpec {
    type Err = String;

    /// Parses `Name` or `Name:w1,w2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, weights) = match s.split_once(':') {
            Some((name, weights)) => (name, weights.split(',').collect::<Vec<_>>()),
            None => (s, Vec::new()),
        };
        if name.trim().is_empty() {
            return Err(format!("missing family name in '{s}'"));
        }
        Ok(Self::new(name, weights.into_iter().filter(|w| !w.trim().is_empty())))
    }
}

impl fmt::Display for FamilySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weights.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.name, self.weights.join(","))
        }
    }
}

/// Where a run gets its stylesheet from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontInput {
    /// A stylesheet URL, repaired with [`repair_url`].
    Url(String),
    /// Families and subsets, turned into a Google Fonts URL.
    Families {
        /// Requested families.
        families: Vec<FamilySpec>,
        /// Requested subsets.
        subsets: Vec<String>,
    },
}

impl FontInput {
    /// Resolves the input to a validated stylesheet URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] or [`Error::UnsupportedProtocol`].
    pub fn resolve(&self) -> Result<Url, Error> {
        match self {
            Self::Url(raw) => repair_url(raw),
            Self::Families { families, subsets } => {
                let constructed = construct_url(families, subsets);
                if !constructed.contains("family=") {
                    return Err(Error::invalid_input(
                        constructed,
                        "no valid font family was given",
                    ));
                }
                repair_url(&constructed)
            }
        }
    }
}

/// Normalizes a stylesheet URL.
///
/// Decodes the HTML entities `&amp; &lt; &gt; &quot; &#039;`, trims,
/// replaces whitespace runs with `+`, assumes `https://` when no scheme is
/// given and validates the result.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for empty or malformed input and
/// [`Error::UnsupportedProtocol`] for schemes other than http and https.
#[instrument]
pub fn repair_url(input: &str) -> Result<Url, Error> {
    let decoded = decode_entities(input);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input(input, "empty URL"));
    }
    let collapsed = WHITESPACE.replace_all(trimmed, "+");

    let candidate = if collapsed.starts_with("//") {
        format!("https:{collapsed}")
    } else if SCHEME_PREFIX.is_match(&collapsed) {
        collapsed.into_owned()
    } else {
        format!("https://{collapsed}")
    };

    let url = Url::parse(&candidate).map_err(|e| Error::invalid_input(input, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::unsupported_protocol(input, scheme)),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_input(input, "URL has no host"));
    }

    debug!(url = %url, "stylesheet URL repaired");
    Ok(url)
}

fn decode_entities(input: &str) -> String {
    const ENTITIES: &[(&str, &str)] = &[
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#039;", "'"),
    ];
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    'scan: while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        for (entity, replacement) in ENTITIES {
            if rest.len() >= entity.len()
                && rest.is_char_boundary(entity.len())
                && rest[..entity.len()].eq_ignore_ascii_case(entity)
            {
                out.push_str(replacement);
                rest = &rest[entity.len()..];
                continue 'scan;
            }
        }
        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

/// Builds a Google Fonts stylesheet URL.
///
/// Family names are trimmed, whitespace becomes `+` and anything outside
/// `[A-Za-z0-9+_-]` is dropped. Weights must look like `400` or `400i`.
/// Families that sanitize to the same name are merged, keeping the union of
/// their weights in first-seen order. Subsets are lower-cased and kept when
/// they match `[a-z-]+`.
///
/// # Examples
///
/// ```
/// use fontgrab_core::query::{FamilySpec, construct_url};
///
/// let url = construct_url(
///     &[FamilySpec::new("Alegreya Sans SC", ["700", "700i"])],
///     &["greek"],
/// );
/// assert_eq!(
///     url,
///     "https://fonts.googleapis.com/css?family=Alegreya+Sans+SC:700,700i&subset=greek"
/// );
/// ```
#[must_use]
pub fn construct_url<S: AsRef<str>>(families: &[FamilySpec], subsets: &[S]) -> String {
    let mut merged: Vec<(String, Vec<String>)> = Vec::new();

    for spec in families {
        let name = sanitize_family(&spec.name);
        if name.is_empty() {
            debug!(family = %spec.name, "dropping family with no usable characters");
            continue;
        }
        let weights = spec
            .weights
            .iter()
            .map(|w| w.trim())
            .filter(|w| WEIGHT_PATTERN.is_match(w));

        let slot = match merged.iter().position(|(existing, _)| *existing == name) {
            Some(index) => index,
            None => {
                merged.push((name, Vec::new()));
                merged.len() - 1
            }
        };
        for weight in weights {
            if !merged[slot].1.iter().any(|w| w == weight) {
                merged[slot].1.push(weight.to_string());
            }
        }
    }

    let family_param = merged
        .iter()
        .map(|(name, weights)| {
            if weights.is_empty() {
                name.clone()
            } else {
                format!("{name}:{}", weights.join(","))
            }
        })
        .collect::<Vec<_>>()
        .join("|");

    let mut subset_list: Vec<String> = Vec::new();
    for subset in subsets {
        let subset = subset.as_ref().trim().to_lowercase();
        if SUBSET_PATTERN.is_match(&subset) && !subset_list.contains(&subset) {
            subset_list.push(subset);
        }
    }

    let mut params = Vec::new();
    if !family_param.is_empty() {
        params.push(format!("family={family_param}"));
    }
    if !subset_list.is_empty() {
        params.push(format!("subset={}", subset_list.join(",")));
    }

    if params.is_empty() {
        GOOGLE_FONTS_CSS_URL.to_string()
    } else {
        format!("{GOOGLE_FONTS_CSS_URL}?{}", params.join("&"))
    }
}

/// Splits a Google Fonts URL back into its families and subsets.
///
/// Family names keep their `+` separators, so feeding the result back into
/// [`construct_url`] reproduces the same URL.
#[must_use]
pub fn parse_family_query(url: &str) -> (Vec<FamilySpec>, Vec<String>) {
    let query = url.split_once('?').map_or("", |(_, q)| q);
    let mut families = Vec::new();
    let mut subsets = Vec::new();

    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("family", value)) => {
                families.extend(value.split('|').filter_map(|f| f.parse::<FamilySpec>().ok()));
            }
            Some(("subset", value)) => {
                subsets.extend(value.split(',').filter(|s| !s.is_empty()).map(str::to_string));
            }
            _ => {}
        }
    }

    (families, subsets)
}

fn sanitize_family(name: &str) -> String {
    let joined = WHITESPACE.replace_all(name.trim(), "+");
    FAMILY_DISALLOWED.replace_all(&joined, "").into_owned()
}
