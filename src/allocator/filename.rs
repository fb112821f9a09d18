//! Path-derived naming variables and filesystem-safe filenames.

use std::path::{Component, Path};

use tracing::debug;
use url::Url;

/// Basename and extension of a font URL's last path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteName {
    /// Basename without extension.
    pub stem: String,
    /// Extension without the leading dot.
    pub ext: String,
}

/// Splits the URL's last path segment into stem and extension.
///
/// Returns `None` when the segment has no usable extension (nothing after
/// the last dot, or no dot at all), since no sensible filename can be built.
pub(crate) fn remote_name(url: &Url) -> Option<RemoteName> {
    let last = url.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(
            segment = %last,
            error = %e,
            "URL decoding failed, using raw segment"
        );
        last.into()
    });
    let path = Path::new(decoded.as_ref());
    let ext = path.extension()?.to_string_lossy().to_string();
    if ext.is_empty() {
        return None;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    Some(RemoteName { stem, ext })
}

/// Sanitizes a rendered filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters with `_`, and refuses
/// names that would resolve to `.`, `..` or a root.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
