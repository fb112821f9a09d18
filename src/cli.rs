//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use fontgrab_core::{Config, FamilySpec, FontInput};

/// Download Google Fonts for self-hosting.
///
/// Fetches a font stylesheet, saves every font it references and writes a
/// copy of the stylesheet pointing at the local files.
#[derive(Parser, Debug)]
#[command(name = "fontgrab")]
#[command(author, version, about)]
pub struct Args {
    /// Stylesheet URL, e.g. "https://fonts.googleapis.com/css?family=Roboto:400,700"
    #[arg(short, long, conflicts_with = "family")]
    pub input: Option<String>,

    /// Font family to request, as NAME or NAME:WEIGHT,WEIGHT (repeatable)
    #[arg(long = "family", value_name = "NAME[:W,W]")]
    pub family: Vec<FamilySpec>,

    /// Character subset to request with --family (repeatable)
    #[arg(long = "subset", value_name = "SUBSET", requires = "family")]
    pub subset: Vec<String>,

    /// Output directory for fonts and stylesheet
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Prefix placed before font filenames in the rewritten stylesheet
    #[arg(short, long)]
    pub path: Option<String>,

    /// Filename of the rewritten stylesheet
    #[arg(short, long)]
    pub css: Option<String>,

    /// Font filename template (variables: {family} {_family} {weight} {comment} {filename} {ext} {i})
    #[arg(short, long)]
    pub template: Option<String>,

    /// User-Agent sent with every request
    #[arg(short = 'u', long = "useragent")]
    pub user_agent: Option<String>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Inline fonts into the stylesheet as base64 data URIs
    #[arg(short, long)]
    pub base64: bool,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub non_strict_ssl: bool,

    /// Replace existing files
    #[arg(short = 'w', long)]
    pub overwriting: bool,

    /// Fetch and report without writing anything
    #[arg(short, long)]
    pub simulate: bool,

    /// JSON file with default options
    #[arg(long, value_name = "FILE.json")]
    pub config: Option<PathBuf>,

    /// Print the resolved options as JSON and exit
    #[arg(long)]
    pub print_options: bool,

    /// Retries for transient network failures (0-10)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub retries: Option<u32>,

    /// Per-request timeout in seconds (1-600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout: Option<u64>,

    /// Font downloads in flight at once (1-32)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub concurrency: Option<u8>,
}

impl Args {
    /// Applies the flags that were given on top of `config`.
    ///
    /// Progress output is on unless `--quiet` is given.
    #[must_use]
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(output) = &self.output {
            config.output_dir.clone_from(output);
        }
        if let Some(path) = &self.path {
            config.path_prefix.clone_from(path);
        }
        if let Some(css) = &self.css {
            config.css_file.clone_from(css);
        }
        if let Some(template) = &self.template {
            config.template.clone_from(template);
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent.clone_from(user_agent);
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = usize::from(concurrency);
        }
        config.base64 |= self.base64;
        config.overwrite |= self.overwriting;
        config.simulate |= self.simulate;
        if self.non_strict_ssl {
            config.strict_tls = false;
        }
        if self.quiet {
            config.verbose = false;
        }
        config
    }

    /// Returns the stylesheet source, if one was given.
    #[must_use]
    pub fn font_input(&self) -> Option<FontInput> {
        if let Some(input) = &self.input {
            return Some(FontInput::Url(input.clone()));
        }
        if self.family.is_empty() {
            return None;
        }
        Some(FontInput::Families {
            families: self.family.clone(),
            subsets: self.subset.clone(),
        })
    }
}
