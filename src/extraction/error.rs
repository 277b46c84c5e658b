//! Extraction Error Types
//!
//! Every failure carries the tag (when one is being processed) and the stage
//! that failed, so a stopped run can report exactly where it stopped.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::extraction::series::SeriesError;
use crate::parsing::MalformedDurationError;
use crate::sonar::BackendError;

/// Result type for extraction operations
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Working-copy operation that failed during a scan step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Checkout,
    Scan,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStage::Checkout => write!(f, "checkout"),
            ScanStage::Scan => write!(f, "scan"),
        }
    }
}

/// Backend query that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Measures,
    Issues,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStage::Measures => write!(f, "measures"),
            QueryStage::Issues => write!(f, "issues"),
        }
    }
}

/// Errors that stop an extraction run
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Path is not a usable git working copy
    #[error("Cannot access repository at {}: {message}", path.display())]
    RepositoryAccess { path: PathBuf, message: String },

    /// Commit date or timestamp for a tag could not be read
    #[error("Cannot read release date for tag '{tag}': {message}")]
    TagMetadata { tag: String, message: String },

    /// Checkout or scanner process failed
    #[error("The {stage} step failed for tag '{tag}': {message}")]
    ScanExecution { tag: String, stage: ScanStage, message: String },

    /// Issue effort string could not be parsed
    #[error("Malformed remediation effort for tag '{tag}' ({category}): {source}")]
    MalformedDuration {
        tag: String,
        category: String,
        #[source]
        source: MalformedDurationError,
    },

    /// Backend response omitted requested metrics
    #[error("Backend returned no value for tag '{tag}' metrics: {}", metrics.join(", "))]
    MissingMetric { tag: String, metrics: Vec<String> },

    /// Backend request or response decoding failed
    #[error("Backend {stage} query failed for tag '{tag}': {source}")]
    Backend {
        tag: String,
        stage: QueryStage,
        #[source]
        source: BackendError,
    },

    /// A row did not match the series layout
    #[error("Series integrity violated for tag '{tag}': {source}")]
    SeriesIntegrity {
        tag: String,
        #[source]
        source: SeriesError,
    },

    /// Tag processing attempted to skip or repeat a stage
    #[error("Invalid stage transition for tag '{tag}': {from} -> {to}")]
    InvalidTransition { tag: String, from: String, to: String },
}
