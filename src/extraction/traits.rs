//! Collaborator Traits
//!
//! The pipeline talks to git, the scanner process and the SonarQube web API
//! only through these traits. Production implementations live in
//! `crate::git` and `crate::sonar`; tests substitute in-memory fakes.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use crate::sonar::model::{CleanCodeCategory, RawIssue};
use crate::sonar::BackendError;

/// Version-control queries and working-copy mutation
pub trait VersionControl {
    /// Location of the working copy, for diagnostics
    fn location(&self) -> &Path;

    /// All tag names in native listing order
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Calendar date and epoch seconds of the commit a tag points to
    fn tag_commit_date_and_epoch(&self, tag: &str) -> Result<(NaiveDate, i64)>;

    /// Switch the working copy to the tag's revision
    fn checkout(&self, tag: &str) -> Result<()>;
}

/// Parameters for one static-analysis run
#[derive(Debug, Clone)]
pub struct ScanRequest<'a> {
    pub base_dir: &'a Path,
    pub project_key: &'a str,
    pub project_version: &'a str,
    pub server_url: &'a str,
    pub token: &'a str,
}

/// Runs the external static-analysis scan
pub trait ScanRunner {
    /// Blocks until the scan finishes; any non-success outcome is an error
    fn run_scan(&self, request: &ScanRequest<'_>) -> Result<()>;
}

/// Read access to analysis results
pub trait AnalysisBackend {
    /// Measure values keyed by metric name; absent metrics are simply not in the map
    fn get_measures(
        &self,
        component: &str,
        metric_keys: &[String],
    ) -> Result<HashMap<String, String>, BackendError>;

    /// Every issue classified under the clean-code category
    fn get_issues(&self, category: CleanCodeCategory) -> Result<Vec<RawIssue>, BackendError>;
}
