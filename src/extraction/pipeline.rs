//! Extraction Orchestrator
//!
//! Selects tags, then drives checkout, scan, metric collection and issue
//! aggregation for each one in order. The first failure stops the run; rows
//! already committed for earlier tags are kept and returned alongside the
//! failure.

use std::fmt;

use log::{debug, error, info};

use crate::extraction::error::{ExtractionError, ExtractionResult};
use crate::extraction::issues::read_clean_code;
use crate::extraction::metrics::{default_metric_keys, read_metrics, MissingMetricPolicy};
use crate::extraction::sampler::sample_by_year;
use crate::extraction::scan::{ScanDriver, ScanTarget};
use crate::extraction::series::{CleanCodeAttributeSeries, MetricSeries};
use crate::extraction::tags::{TagDiscovery, VersionTag};
use crate::extraction::traits::{AnalysisBackend, ScanRunner, VersionControl};

/// Default cap on the number of tags taken from the listing
pub const DEFAULT_MAX_TAGS: usize = 20;

/// Default cap on the number of tags kept per calendar year
pub const DEFAULT_MAX_TAGS_PER_YEAR: usize = 5;

/// Progress of a single tag through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStage {
    NotStarted,
    CheckedOut,
    Scanned,
    Collected,
    Aggregated,
    Failed,
}

impl TagStage {
    fn successor(self) -> Option<TagStage> {
        match self {
            TagStage::NotStarted => Some(TagStage::CheckedOut),
            TagStage::CheckedOut => Some(TagStage::Scanned),
            TagStage::Scanned => Some(TagStage::Collected),
            TagStage::Collected => Some(TagStage::Aggregated),
            TagStage::Aggregated | TagStage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TagStage::Aggregated | TagStage::Failed)
    }
}

impl fmt::Display for TagStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagStage::NotStarted => "not started",
            TagStage::CheckedOut => "checked out",
            TagStage::Scanned => "scanned",
            TagStage::Collected => "collected",
            TagStage::Aggregated => "aggregated",
            TagStage::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Stage tracker for one tag
#[derive(Debug, Clone)]
pub struct TagProgress {
    tag: String,
    stage: TagStage,
    last_completed: TagStage,
}

impl TagProgress {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            stage: TagStage::NotStarted,
            last_completed: TagStage::NotStarted,
        }
    }

    pub fn stage(&self) -> TagStage {
        self.stage
    }

    /// Last stage reached before a failure, or the current stage
    pub fn last_completed(&self) -> TagStage {
        self.last_completed
    }

    /// Move exactly one step forward
    pub fn advance(&mut self, to: TagStage) -> ExtractionResult<()> {
        if to == TagStage::Failed || self.stage.successor() != Some(to) {
            return Err(ExtractionError::InvalidTransition {
                tag: self.tag.clone(),
                from: self.stage.to_string(),
                to: to.to_string(),
            });
        }
        debug!("Tag {}: {} -> {}", self.tag, self.stage, to);
        self.stage = to;
        self.last_completed = to;
        Ok(())
    }

    /// Any non-terminal stage may fail
    pub fn fail(&mut self) {
        if self.stage != TagStage::Aggregated {
            self.stage = TagStage::Failed;
        }
    }
}

/// Run parameters
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub project_key: String,
    pub server_url: String,
    pub token: String,
    pub max_tags: Option<usize>,
    pub max_tags_per_year: Option<usize>,
    pub metric_keys: Vec<String>,
    pub missing_metrics: MissingMetricPolicy,
    pub release_tags_only: bool,
}

impl ExtractionSettings {
    pub fn new(project_key: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            server_url: server_url.into(),
            token: String::new(),
            max_tags: Some(DEFAULT_MAX_TAGS),
            max_tags_per_year: Some(DEFAULT_MAX_TAGS_PER_YEAR),
            metric_keys: default_metric_keys(),
            missing_metrics: MissingMetricPolicy::default(),
            release_tags_only: false,
        }
    }

    fn scan_target(&self) -> ScanTarget {
        ScanTarget {
            project_key: self.project_key.clone(),
            server_url: self.server_url.clone(),
            token: self.token.clone(),
        }
    }
}

/// Both datasets plus the tags that made it into them
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub metrics: MetricSeries,
    pub clean_code: CleanCodeAttributeSeries,
    pub processed: Vec<VersionTag>,
}

impl ExtractionOutput {
    pub fn new(metric_keys: &[String]) -> Self {
        Self {
            metrics: MetricSeries::new(metric_keys),
            clean_code: CleanCodeAttributeSeries::new(),
            processed: Vec::new(),
        }
    }
}

/// Where and why a run stopped early
#[derive(Debug)]
pub struct RunFailure {
    pub tag: String,
    /// Last stage the tag completed before failing
    pub stage: TagStage,
    pub error: ExtractionError,
}

/// Result of a run that got past tag selection
#[derive(Debug)]
pub struct ExtractionRun {
    pub selected: Vec<VersionTag>,
    pub output: ExtractionOutput,
    pub failure: Option<RunFailure>,
}

impl ExtractionRun {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Discover tags, then keep at most `max_tags_per_year` per calendar year
pub fn select_tags(
    vcs: &dyn VersionControl,
    settings: &ExtractionSettings,
) -> ExtractionResult<Vec<VersionTag>> {
    let discovered = TagDiscovery::new(settings.max_tags)
        .with_release_tags_only(settings.release_tags_only)
        .discover(vcs)?;
    let sampled = sample_by_year(&discovered, settings.max_tags_per_year);
    info!(
        "Selected {} of {} discovered tags",
        sampled.len(),
        discovered.len()
    );
    Ok(sampled)
}

/// Drives one repository through the pipeline
pub struct Extractor<'a> {
    vcs: &'a dyn VersionControl,
    runner: &'a dyn ScanRunner,
    backend: &'a dyn AnalysisBackend,
    settings: ExtractionSettings,
}

impl<'a> Extractor<'a> {
    pub fn new(
        vcs: &'a dyn VersionControl,
        runner: &'a dyn ScanRunner,
        backend: &'a dyn AnalysisBackend,
        settings: ExtractionSettings,
    ) -> Self {
        Self {
            vcs,
            runner,
            backend,
            settings,
        }
    }

    /// Discover tags and sample them by year
    pub fn select_tags(&self) -> ExtractionResult<Vec<VersionTag>> {
        select_tags(self.vcs, &self.settings)
    }

    /// Run every stage for `tag` and commit its rows to `output`
    ///
    /// Rows are appended only once every stage has succeeded, so a failing
    /// tag leaves both datasets as they were.
    pub fn process_tag(
        &self,
        tag: &VersionTag,
        output: &mut ExtractionOutput,
        progress: &mut TagProgress,
    ) -> ExtractionResult<()> {
        let target = self.settings.scan_target();
        let driver = ScanDriver::new(self.vcs, self.runner, &target);

        driver.checkout(tag)?;
        progress.advance(TagStage::CheckedOut)?;

        driver.scan(tag)?;
        progress.advance(TagStage::Scanned)?;

        let metrics = read_metrics(
            self.backend,
            &self.settings.project_key,
            &self.settings.metric_keys,
            tag,
            self.settings.missing_metrics,
        )?;
        progress.advance(TagStage::Collected)?;

        let clean_code = read_clean_code(self.backend, tag)?;

        let rows_before = output.metrics.len();
        output
            .metrics
            .push(tag, metrics)
            .map_err(|source| ExtractionError::SeriesIntegrity {
                tag: tag.name.clone(),
                source,
            })?;
        if let Err(source) = output.clean_code.push_tag(tag, &clean_code) {
            output.metrics.truncate(rows_before);
            return Err(ExtractionError::SeriesIntegrity {
                tag: tag.name.clone(),
                source,
            });
        }
        progress.advance(TagStage::Aggregated)?;

        output.processed.push(tag.clone());
        Ok(())
    }

    /// Select tags and process them in order, stopping at the first failure
    ///
    /// Errors during selection are returned directly since no tag has been
    /// touched yet.
    pub fn run(&self) -> ExtractionResult<ExtractionRun> {
        let selected = self.select_tags()?;
        Ok(self.run_tags(selected))
    }

    /// Process an already selected tag list
    pub fn run_tags(&self, selected: Vec<VersionTag>) -> ExtractionRun {
        let mut output = ExtractionOutput::new(&self.settings.metric_keys);
        let mut failure = None;

        for (index, tag) in selected.iter().enumerate() {
            info!("Processing tag {} ({}/{})", tag.name, index + 1, selected.len());
            let mut progress = TagProgress::new(&tag.name);

            if let Err(e) = self.process_tag(tag, &mut output, &mut progress) {
                progress.fail();
                error!(
                    "Stopping at tag {} after stage '{}': {}",
                    tag.name,
                    progress.last_completed(),
                    e
                );
                failure = Some(RunFailure {
                    tag: tag.name.clone(),
                    stage: progress.last_completed(),
                    error: e,
                });
                break;
            }
        }

        info!(
            "Extracted {} of {} selected tags",
            output.processed.len(),
            selected.len()
        );
        ExtractionRun {
            selected,
            output,
            failure,
        }
    }
}
