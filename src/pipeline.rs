//! Run orchestration: stylesheet in, font files and rewritten stylesheet out.
//!
//! A run moves through these stages in order and stops at the first error:
//!
//! ```text
//! Idle -> FetchingCss -> Parsing -> Allocating -> Rewriting -> FetchingFonts -> Persisting -> Done
//! ```
//!
//! Nothing is written until every font has been fetched, so a failed run
//! never leaves a stylesheet pointing at files that were not saved. A
//! simulated run fetches the same fonts as a real one and only skips the
//! writes.
//!
//! # Example
//!
//! ```no_run
//! use fontgrab_core::{Config, FontDownloader, FontInput};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = FontDownloader::new(Config::default())?;
//! let input = FontInput::Url("https://fonts.googleapis.com/css?family=Lato".to_string());
//! let report = downloader.download(&input).await?;
//! println!("{} fonts, css at {}", report.fonts.len(), report.css_path.display());
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::allocator::{FilenameAllocator, FontEntry};
use crate::config::Config;
use crate::css::{self, Replacement, data_uri_reference};
use crate::download::{FetchedAsset, HttpClient};
use crate::error::Error;
use crate::query::FontInput;
use crate::storage::{self, WriteOptions, WriteOutcome};
use crate::template::{FONT_VARIABLES, Template};

/// Logs at info level in verbose mode, debug otherwise.
macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Pipeline stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    /// Not started.
    Idle,
    /// Fetching the stylesheet.
    FetchingCss,
    /// Scanning `@font-face` blocks.
    Parsing,
    /// Rendering output filenames.
    Allocating,
    /// Planning the stylesheet rewrite.
    Rewriting,
    /// Fetching font assets.
    FetchingFonts,
    /// Writing files.
    Persisting,
    /// Finished successfully.
    Done,
    /// Stopped on an error.
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FetchingCss => "fetching-css",
            Self::Parsing => "parsing",
            Self::Allocating => "allocating",
            Self::Rewriting => "rewriting",
            Self::FetchingFonts => "fetching-fonts",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What happened to one font asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    /// Saved (or skipped, or simulated) as a file.
    File(WriteOutcome),
    /// Embedded into the stylesheet as a data URI.
    Inlined {
        /// MIME type used in the data URI.
        mime: String,
        /// Size of the decoded font.
        bytes: usize,
    },
}

/// One distinct font asset of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontReport {
    /// Allocated output filename.
    pub filename: String,
    /// Source URL.
    pub url: Url,
    /// Number of stylesheet references rewritten to this asset.
    pub references: usize,
    /// What happened to it.
    pub outcome: AssetOutcome,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    /// Stylesheet URL after redirects.
    pub stylesheet_url: Url,
    /// Where the stylesheet was (or would be) written.
    pub css_path: PathBuf,
    /// What happened to the stylesheet file.
    pub css_outcome: WriteOutcome,
    /// The rewritten stylesheet.
    pub css: String,
    /// Distinct font assets in document order.
    pub fonts: Vec<FontReport>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl DownloadReport {
    /// Number of font references found in the stylesheet.
    #[must_use]
    pub fn references(&self) -> usize {
        self.fonts.iter().map(|f| f.references).sum()
    }

    /// Number of font files written to disk.
    #[must_use]
    pub fn files_written(&self) -> usize {
        self.fonts
            .iter()
            .filter(|f| f.outcome == AssetOutcome::File(WriteOutcome::Written))
            .count()
    }
}

/// Downloads a stylesheet and its fonts according to a [`Config`].
#[derive(Debug, Clone)]
pub struct FontDownloader {
    config: Config,
    template: Template,
    client: HttpClient,
}

impl FontDownloader {
    /// Creates a downloader with an HTTP client built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Download`] if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, Error> {
        let client = HttpClient::new(&config)?;
        Ok(Self::with_client(config, client))
    }

    /// Creates a downloader that uses `client` for every request.
    #[must_use]
    pub fn with_client(config: Config, client: HttpClient) -> Self {
        let template = Template::parse(&config.template);
        for name in template.placeholders() {
            if !FONT_VARIABLES.contains(&name) {
                warn!(placeholder = name, template = %template, "unknown template variable, kept verbatim");
            }
        }
        if !template.has_placeholder("i") {
            debug!(template = %template, "template has no {{i}}, duplicate names will fail");
        }
        Self {
            config,
            template,
            client,
        }
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the whole pipeline for `input`.
    ///
    /// The input is validated before any network or filesystem access.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage. When a fetch fails, no file
    /// has been written.
    #[instrument(skip(self))]
    pub async fn download(&self, input: &FontInput) -> Result<DownloadReport, Error> {
        let url = input.resolve()?;
        let mut run = Run::new();
        match self.run(&mut run, &url).await {
            Ok(report) => {
                run.advance(Stage::Done);
                progress!(
                    self.config.verbose,
                    fonts = report.fonts.len(),
                    elapsed_ms = report.elapsed.as_millis(),
                    "done"
                );
                Ok(report)
            }
            Err(error) => {
                warn!(stage = %run.stage, error = %error, "run failed");
                run.advance(Stage::Failed);
                Err(error)
            }
        }
    }

    async fn run(&self, run: &mut Run, url: &Url) -> Result<DownloadReport, Error> {
        let verbose = self.config.verbose;
        let options = WriteOptions::from(&self.config);

        run.advance(Stage::FetchingCss);
        let stylesheet = self.client.fetch_text(url.as_str()).await?;
        progress!(
            verbose,
            url = %stylesheet.url,
            status = stylesheet.status,
            bytes = stylesheet.body.len(),
            "stylesheet fetched"
        );

        run.advance(Stage::Parsing);
        let blocks = css::parse(&stylesheet.body);

        run.advance(Stage::Allocating);
        let mut allocator = FilenameAllocator::new(self.template.clone());
        if self.config.base64 {
            allocator = allocator.without_collision_check();
        }
        let entries = allocator.allocate(&stylesheet.url, &blocks)?;
        if entries.is_empty() {
            warn!(url = %stylesheet.url, "no fonts found in stylesheet");
        } else {
            progress!(verbose, fonts = entries.len(), faces = blocks.len(), "fonts found");
        }

        run.advance(Stage::Rewriting);
        let assets = distinct_assets(&entries);
        let mut plan = Vec::with_capacity(assets.len());
        for asset in &assets {
            let path = self.config.output_dir.join(&asset.filename);
            let planned = if self.config.base64 {
                None
            } else {
                Some(storage::planned_outcome(&path, options).await)
            };
            plan.push((path, planned));
        }
        let relative = if self.config.base64 {
            None
        } else {
            Some(self.relative_replacements(&entries))
        };

        run.advance(Stage::FetchingFonts);
        let wanted: Vec<&Asset<'_>> = assets
            .iter()
            .zip(&plan)
            .filter(|(_, (_, planned))| {
                planned.is_none_or(|p| matches!(p, WriteOutcome::Written | WriteOutcome::Simulated))
            })
            .map(|(asset, _)| asset)
            .collect();
        let fetched = self.fetch_assets(&wanted).await?;

        let replacements = match relative {
            Some(replacements) => replacements,
            None => inline_replacements(&entries, &fetched),
        };
        let rewritten = css::rewrite(&stylesheet.body, &replacements);

        run.advance(Stage::Persisting);
        storage::ensure_dir(&self.config.output_dir, options).await?;

        let mut fonts = Vec::with_capacity(assets.len());
        for (asset, (path, planned)) in assets.iter().zip(plan) {
            let outcome = match (planned, fetched.get(asset.url)) {
                (None, Some(font)) => AssetOutcome::Inlined {
                    mime: font.content_type.clone(),
                    bytes: font.bytes.len(),
                },
                (Some(WriteOutcome::Written), Some(font)) => {
                    let outcome = storage::write_font(&path, &font.bytes, options).await?;
                    AssetOutcome::File(outcome)
                }
                (Some(planned), _) => AssetOutcome::File(planned),
                (None, None) => continue,
            };
            progress!(
                verbose,
                file = %path.display(),
                outcome = ?outcome,
                "font {}",
                describe(&outcome)
            );
            fonts.push(FontReport {
                filename: asset.filename.to_string(),
                url: asset.url.clone(),
                references: asset.references,
                outcome,
            });
        }

        let css_path = self.config.css_path();
        let css_outcome = storage::write_css(&css_path, &rewritten, options).await?;
        progress!(
            verbose,
            file = %css_path.display(),
            outcome = ?css_outcome,
            "stylesheet {}",
            describe(&AssetOutcome::File(css_outcome))
        );

        Ok(DownloadReport {
            stylesheet_url: stylesheet.url,
            css_path,
            css_outcome,
            css: rewritten,
            fonts,
            elapsed: run.started.elapsed(),
        })
    }

    fn relative_replacements(&self, entries: &[FontEntry]) -> Vec<Replacement> {
        entries
            .iter()
            .map(|entry| {
                Replacement::new(entry.span.clone(), entry.output_text(&self.config.path_prefix))
            })
            .collect()
    }

    /// Fetches each distinct URL once, `concurrency` at a time, failing on
    /// the first error.
    async fn fetch_assets<'a>(
        &self,
        assets: &[&Asset<'a>],
    ) -> Result<HashMap<&'a Url, FetchedAsset>, Error> {
        let mut seen = HashSet::new();
        let urls: Vec<&'a Url> = assets
            .iter()
            .map(|asset| asset.url)
            .filter(|url| seen.insert(*url))
            .collect();
        if urls.is_empty() {
            return Ok(HashMap::new());
        }
        debug!(count = urls.len(), concurrency = self.config.concurrency, "fetching fonts");

        let fetched: Vec<(&'a Url, FetchedAsset)> = stream::iter(urls)
            .map(|url| async move {
                let font = self.client.fetch_binary(url.as_str()).await?;
                progress!(
                    self.config.verbose,
                    url = %url,
                    bytes = font.bytes.len(),
                    "font fetched"
                );
                Ok::<_, Error>((url, font))
            })
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        Ok(fetched.into_iter().collect())
    }
}

/// A distinct output file and the URL backing it.
#[derive(Debug)]
struct Asset<'a> {
    filename: &'a str,
    url: &'a Url,
    references: usize,
}

/// Collapses entries with the same filename and URL into one asset, keeping
/// first-seen order.
fn distinct_assets(entries: &[FontEntry]) -> Vec<Asset<'_>> {
    let mut seen: HashMap<(&str, &Url), usize> = HashMap::new();
    let mut assets: Vec<Asset<'_>> = Vec::new();
    for entry in entries {
        let key = (entry.filename.as_str(), &entry.url);
        if let Some(&position) = seen.get(&key) {
            assets[position].references += 1;
            continue;
        }
        seen.insert(key, assets.len());
        assets.push(Asset {
            filename: &entry.filename,
            url: &entry.url,
            references: 1,
        });
    }
    assets
}

fn inline_replacements(
    entries: &[FontEntry],
    fetched: &HashMap<&Url, FetchedAsset>,
) -> Vec<Replacement> {
    let mut encoded: HashMap<&Url, String> = HashMap::new();
    let mut missing: HashSet<&Url> = HashSet::new();
    let mut replacements = Vec::with_capacity(entries.len());
    for entry in entries {
        let url = &entry.url;
        let Some(font) = fetched.get(url) else {
            if missing.insert(url) {
                warn!(url = %url, "font not fetched, leaving reference unchanged");
            }
            continue;
        };
        let text = encoded
            .entry(url)
            .or_insert_with(|| data_uri_reference(&font.content_type, &font.bytes));
        replacements.push(Replacement::new(entry.span.clone(), text.clone()));
    }
    replacements
}

fn describe(outcome: &AssetOutcome) -> &'static str {
    match outcome {
        AssetOutcome::File(WriteOutcome::Written) => "saved",
        AssetOutcome::File(WriteOutcome::SkippedExisting) => {
            "skipped, file exists and overwriting is disabled"
        }
        AssetOutcome::File(WriteOutcome::Simulated) => "would be saved (simulate)",
        AssetOutcome::Inlined { .. } => "inlined",
    }
}

struct Run {
    stage: Stage,
    started: Instant,
}

impl Run {
    fn new() -> Self {
        Self {
            stage: Stage::Idle,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stage moved backwards: {} -> {next}", self.stage);
        debug!(from = %self.stage, to = %next, "stage");
        self.stage = next;
    }
}
