//! Run configuration.
//!
//! [`Config`] is an immutable record handed to the pipeline. Every field has
//! a default; partial configuration from JSON is merged leniently: unknown
//! keys and values of the wrong type are dropped and the default is kept.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::download::constants::{DEFAULT_RETRIES, REQUEST_TIMEOUT_SECS};
use crate::user_agent;

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "./fonts";

/// Default prefix placed before every rewritten font reference.
pub const DEFAULT_PATH_PREFIX: &str = "./";

/// Default filename template.
pub const DEFAULT_TEMPLATE: &str = "{_family}-{weight}-{comment}{i}.{ext}";

/// Default stylesheet filename.
pub const DEFAULT_CSS_FILE: &str = "fonts.css";

/// Default number of font fetches in flight.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for one font download run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory receiving the stylesheet and font files.
    pub output_dir: PathBuf,
    /// String prepended to every rewritten font filename in the CSS.
    pub path_prefix: String,
    /// Filename template, see [`crate::template`].
    pub template: String,
    /// Filename of the rewritten stylesheet inside `output_dir`.
    pub css_file: String,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Inline fonts into the CSS as base64 data URIs instead of saving files.
    pub base64: bool,
    /// Replace existing files.
    pub overwrite: bool,
    /// Reject invalid TLS certificates.
    pub strict_tls: bool,
    /// Report progress at info level.
    pub verbose: bool,
    /// Dry run: fetch and plan, but write nothing.
    pub simulate: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    pub retries: u32,
    /// Font fetches in flight at once.
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            css_file: DEFAULT_CSS_FILE.to_string(),
            user_agent: user_agent::default_user_agent(),
            base64: false,
            overwrite: false,
            strict_tls: true,
            verbose: false,
            simulate: false,
            timeout_secs: REQUEST_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Config {
    /// Builds a config from defaults plus the recognized keys of `value`.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let mut config = Self::default();
        config.merge_json(value);
        config
    }

    /// Overlays the recognized, well-typed keys of `value` onto `self`.
    ///
    /// Keys may be snake_case field names or the camelCase names used by
    /// older configuration files (`outputDir`, `path`, `cssFile`,
    /// `userAgent`, `overwriting`, `strictSSL`). Returns the keys that were
    /// dropped.
    pub fn merge_json(&mut self, value: &Value) -> Vec<String> {
        let Some(map) = value.as_object() else {
            warn!("configuration is not a JSON object, ignoring it");
            return Vec::new();
        };

        let mut dropped = Vec::new();
        for (key, value) in map {
            let applied = match key.as_str() {
                "output_dir" | "outputDir" => set(&mut self.output_dir, value),
                "path_prefix" | "path" => set(&mut self.path_prefix, value),
                "template" => set(&mut self.template, value),
                "css_file" | "cssFile" => set(&mut self.css_file, value),
                "user_agent" | "userAgent" => set(&mut self.user_agent, value),
                "base64" => set(&mut self.base64, value),
                "overwrite" | "overwriting" => set(&mut self.overwrite, value),
                "strict_tls" | "strictSSL" => set(&mut self.strict_tls, value),
                "verbose" => set(&mut self.verbose, value),
                "simulate" => set(&mut self.simulate, value),
                "timeout_secs" => set(&mut self.timeout_secs, value),
                "retries" => set(&mut self.retries, value),
                "concurrency" => set(&mut self.concurrency, value),
                _ => false,
            };
            if !applied {
                debug!(key = %key, "dropping unknown or mistyped config key");
                dropped.push(key.clone());
            }
        }
        dropped
    }

    /// Path of the rewritten stylesheet.
    #[must_use]
    pub fn css_path(&self) -> PathBuf {
        self.output_dir.join(&self.css_file)
    }
}

fn set<T: DeserializeOwned>(slot: &mut T, value: &Value) -> bool {
    match T::deserialize(value) {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(_) => false,
    }
}
