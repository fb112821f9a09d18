//! Filename templates with `{name}` placeholders.
//!
//! A template such as `{_family}-{weight}-{comment}{i}.{ext}` is rendered
//! once per font source. Placeholder names are made of ASCII letters,
//! digits, `_` and `-`. Doubled braces (`{{`, `}}`) produce a literal brace.
//!
//! Rendering rules:
//! - a placeholder with a supplied variable is replaced by its value (which
//!   may be empty);
//! - a placeholder without a supplied variable is kept verbatim;
//! - a lone brace that does not start a valid placeholder is kept verbatim.

use std::collections::HashMap;
use std::hash::BuildHasher;

/// Variables supplied for every font source.
pub const FONT_VARIABLES: &[&str] = &["family", "_family", "weight", "comment", "ext", "filename", "i"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed filename template.
///
/// Parsing never fails: anything that is not a well-formed placeholder is
/// treated as literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a template string into literal and placeholder segments.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(ch) = rest.chars().next() {
            if let Some(after) = rest.strip_prefix("{{") {
                literal.push('{');
                rest = after;
                continue;
            }
            if let Some(after) = rest.strip_prefix("}}") {
                literal.push('}');
                rest = after;
                continue;
            }
            if ch == '{'
                && let Some((name, after)) = split_placeholder(&rest[1..])
            {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(name.to_string()));
                rest = after;
                continue;
            }
            literal.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    /// Returns true if the template contains the placeholder `{name}`.
    #[must_use]
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Placeholder(p) if p == name))
    }

    /// Iterates over placeholder names in template order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Renders the template with the given variables.
    #[must_use]
    pub fn render<S: BuildHasher>(&self, vars: &HashMap<&str, String, S>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match vars.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }

    /// Renders a filename, dropping one trailing `.` left behind by an
    /// empty `{ext}`.
    #[must_use]
    pub fn render_filename<S: BuildHasher>(&self, vars: &HashMap<&str, String, S>) -> String {
        let mut rendered = self.render(vars);
        if rendered.ends_with('.') {
            rendered.pop();
        }
        rendered
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Renders `template` with `vars` in one call.
#[must_use]
pub fn render<S: BuildHasher>(template: &str, vars: &HashMap<&str, String, S>) -> String {
    Template::parse(template).render(vars)
}

/// Splits `name}rest` into `(name, rest)` when `name` is a valid placeholder name.
fn split_placeholder(input: &str) -> Option<(&str, &str)> {
    let end = input.find('}')?;
    let name = &input[..end];
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| (name, &input[end + 1..]))
}
