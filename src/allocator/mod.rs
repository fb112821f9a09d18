//! Output filename allocation for parsed font sources.
//!
//! The allocator walks the parsed blocks in document order, resolves each
//! `url(...)` against the stylesheet URL, renders the filename template and
//! turns every usable source into a [`FontEntry`].
//!
//! # Collision policy
//!
//! The `{i}` counter is an explicit sequence owned by the allocator. It starts
//! at 1 and advances once per accepted source across the whole stylesheet,
//! so a template containing `{i}` never collides.
//!
//! When a template without `{i}` renders the same filename for two *different*
//! source URLs, allocation fails with [`Error::DuplicateFilename`]. Sources
//! naming the *same* resolved URL may share a filename: they become separate
//! entries (each CSS reference is rewritten) backed by one download.
//!
//! Inlined fonts never reach the filesystem, so
//! [`FilenameAllocator::without_collision_check`] turns the check off for
//! base64 runs.

mod filename;

use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, trace};
use url::Url;

use crate::css::{FontFaceBlock, relative_reference};
use crate::error::Error;
use crate::template::Template;

use filename::{remote_name, sanitize_filename};

/// One font asset reference with its allocated output filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    /// Absolute source URL, resolved against the stylesheet URL.
    pub url: Url,
    /// The verbatim `url(...)` token this entry replaces.
    pub input_text: String,
    /// Byte range of `input_text` in the original stylesheet.
    pub span: Range<usize>,
    /// Allocated output filename.
    pub filename: String,
    /// Family of the owning face.
    pub family: String,
    /// Weight of the owning face.
    pub weight: String,
    /// Comment preceding the owning face.
    pub comment: String,
    /// Value of `{i}` used for this entry.
    pub index: u32,
}

impl FontEntry {
    /// Returns the `url('<prefix><filename>')` reference for this entry.
    #[must_use]
    pub fn output_text(&self, path_prefix: &str) -> String {
        relative_reference(path_prefix, &self.filename)
    }
}

/// Assigns output filenames from a template.
#[derive(Debug)]
pub struct FilenameAllocator {
    template: Template,
    next_index: u32,
    claimed: HashMap<String, Url>,
    check_collisions: bool,
}

impl FilenameAllocator {
    /// Creates an allocator whose `{i}` sequence starts at 1.
    #[must_use]
    pub fn new(template: Template) -> Self {
        Self {
            template,
            next_index: 1,
            claimed: HashMap::new(),
            check_collisions: true,
        }
    }

    /// Lets different URLs share a filename, for runs that write no font files.
    #[must_use]
    pub fn without_collision_check(mut self) -> Self {
        self.check_collisions = false;
        self
    }

    /// Returns the value the next accepted source will get for `{i}`.
    #[must_use]
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Allocates filenames for every usable source in `blocks`.
    ///
    /// Sources are skipped (not an error) when they cannot be resolved
    /// against `base`, are not http(s), or have no file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFilename`] when two different URLs render to
    /// the same filename, unless the collision check is off.
    pub fn allocate(
        &mut self,
        base: &Url,
        blocks: &[FontFaceBlock],
    ) -> Result<Vec<FontEntry>, Error> {
        let mut entries = Vec::new();

        for block in blocks {
            for source in &block.sources {
                let url = match base.join(&source.url) {
                    Ok(url) => url,
                    Err(e) => {
                        debug!(url = %source.url, error = %e, "skipping unresolvable font URL");
                        continue;
                    }
                };
                if !matches!(url.scheme(), "http" | "https") {
                    trace!(scheme = url.scheme(), "skipping non-http font source");
                    continue;
                }
                let Some(name) = remote_name(&url) else {
                    debug!(url = %url, "skipping font URL without file extension");
                    continue;
                };

                let index = self.next_index;
                let comment = block.comment_or_empty().to_string();
                let vars: HashMap<&str, String> = HashMap::from([
                    ("comment", comment.clone()),
                    ("family", block.family.clone()),
                    ("_family", underscore_whitespace(&block.family)),
                    ("weight", block.weight.clone()),
                    ("filename", name.stem),
                    ("ext", name.ext),
                    ("i", index.to_string()),
                ]);
                let filename = sanitize_filename(&self.template.render_filename(&vars));
                if self.check_collisions {
                    self.claim(&filename, &url)?;
                }
                self.next_index += 1;

                trace!(url = %url, filename = %filename, index, "allocated filename");
                entries.push(FontEntry {
                    url,
                    input_text: source.input_text.clone(),
                    span: source.span.clone(),
                    filename,
                    family: block.family.clone(),
                    weight: block.weight.clone(),
                    comment,
                    index,
                });
            }
        }

        debug!(entries = entries.len(), template = %self.template, "allocation complete");
        Ok(entries)
    }

    fn claim(&mut self, filename: &str, url: &Url) -> Result<(), Error> {
        match self.claimed.get(filename) {
            Some(existing) if existing == url => {
                debug!(filename, url = %url, "source reused, sharing output file");
                Ok(())
            }
            Some(existing) => Err(Error::DuplicateFilename {
                filename: filename.to_string(),
                first_url: existing.to_string(),
                second_url: url.to_string(),
                template: self.template.to_string(),
            }),
            None => {
                self.claimed.insert(filename.to_string(), url.clone());
                Ok(())
            }
        }
    }
}

fn underscore_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("_")
}
