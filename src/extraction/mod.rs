//! Version-tag sampling and time-series extraction
//!
//! The pipeline selects a bounded, year-balanced set of release tags, then
//! checks out and scans each one and collects its measures and clean-code
//! issue breakdown into two parallel datasets.

pub mod error;
pub mod issues;
pub mod metrics;
pub mod pipeline;
pub mod sampler;
pub mod scan;
pub mod series;
pub mod tags;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ExtractionError, ExtractionResult, QueryStage, ScanStage};
pub use metrics::{
    default_metric_keys, reserved_metric_keys, MissingMetricPolicy, DEFAULT_METRIC_KEYS,
};
pub use pipeline::{
    select_tags, ExtractionOutput, ExtractionRun, ExtractionSettings, Extractor, RunFailure,
    TagProgress, TagStage, DEFAULT_MAX_TAGS, DEFAULT_MAX_TAGS_PER_YEAR,
};
pub use sampler::sample_by_year;
pub use series::{CleanCodeAttributeSeries, MetricSeries, Series, SeriesValue};
pub use tags::{TagDiscovery, VersionTag};
pub use traits::{AnalysisBackend, ScanRequest, ScanRunner, VersionControl};
